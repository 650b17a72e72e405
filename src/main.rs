// Entrypoint for the uploader.
// - Keeps `main` small: parse arguments, set up logging, hand off to `ui::run`.
// - The outcome of the upload becomes the process exit status.

use clap::Parser;
use eap_upload::{config::UploaderConfig, ui};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "eap-upload")]
#[command(about = "Upload an .eap application package to an Axis camera")]
struct Cli {
    /// Camera address (IP or hostname, optionally with :port)
    target: Option<String>,
    /// Directory to search for the .eap package
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    /// Username for Digest auth (overrides EAP_UPLOAD_USER)
    #[arg(long)]
    user: Option<String>,
    /// Password for Digest auth (overrides EAP_UPLOAD_PASSWORD)
    #[arg(long)]
    password: Option<String>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = UploaderConfig::from_env().with_overrides(cli.user, cli.password);

    let stdout = std::io::stdout();
    let outcome = ui::run(
        &mut stdout.lock(),
        cli.target.as_deref(),
        &cli.dir,
        &config,
    )?;

    let code = outcome.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
