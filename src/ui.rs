// UI layer: walks through one upload and prints every step to the given
// writer. Errors from discovery and the HTTP exchange are reported here and
// turned into an `Outcome`; only a failure to write the report itself is
// returned as an error.

use crate::api::{CameraClient, OpenPackage, UploadResponse};
use crate::config::UploaderConfig;
use crate::discovery::{find_package, PackageFile};
use crate::error::UploadError;
use anyhow::{Context, Result};
use log::info;
use std::io::Write;
use std::path::Path;

/// How an invocation ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The camera answered 200.
    Uploaded,
    /// No target address was given.
    MissingTarget,
    /// No package could be found (or the directory could not be read).
    NoPackage,
    /// The camera answered with a status other than 200.
    Rejected(u16),
    /// The request never completed, or its auth challenge could not be answered.
    TransportFailed,
    /// The package was found but could not be opened or read.
    PackageUnreadable,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Uploaded => 0,
            Outcome::MissingTarget => 2,
            Outcome::NoPackage => 3,
            Outcome::Rejected(_) => 4,
            Outcome::TransportFailed => 5,
            Outcome::PackageUnreadable => 6,
        }
    }
}

impl From<&UploadError> for Outcome {
    fn from(err: &UploadError) -> Self {
        if err.is_discovery() {
            Outcome::NoPackage
        } else if let UploadError::OpenPackage { .. } = err {
            Outcome::PackageUnreadable
        } else {
            Outcome::TransportFailed
        }
    }
}

/// Run one upload of the package found in `dir` to `target`.
pub fn run<W: Write>(
    out: &mut W,
    target: Option<&str>,
    dir: &Path,
    config: &UploaderConfig,
) -> Result<Outcome> {
    report(out, target, dir, config).context("cannot write upload report")
}

fn report<W: Write>(
    out: &mut W,
    target: Option<&str>,
    dir: &Path,
    config: &UploaderConfig,
) -> Result<Outcome> {
    let Some(target) = target else {
        writeln!(
            out,
            "ERROR: Please provide the IP address of the Axis Camera as an argument"
        )?;
        return Ok(Outcome::MissingTarget);
    };
    writeln!(out, "IP address provided: {}", target)?;
    upload_to_camera(out, target, dir, config)
}

fn upload_to_camera<W: Write>(
    out: &mut W,
    target: &str,
    dir: &Path,
    config: &UploaderConfig,
) -> Result<Outcome> {
    writeln!(out, "Starting upload process to Axis Camera at {}", target)?;

    let client = match CameraClient::new(target, config) {
        Ok(c) => c,
        Err(e) => return report_failure(out, &e),
    };
    writeln!(out, "Upload URL: {}", client.url())?;
    writeln!(out, "Using username: {}", config.credentials.username)?;

    writeln!(out, "Searching for .eap files in the current directory...")?;
    let package = match find_package(dir) {
        Ok(p) => p,
        Err(e) => {
            if let UploadError::NoPackage(_) = e {
                writeln!(out, "ERROR: No .eap file found in the current directory")?;
            } else {
                writeln!(out, "ERROR: {}", e)?;
            }
            return Ok(Outcome::from(&e));
        }
    };
    writeln!(out, "Found .eap file: {}", package.name)?;

    send_package(out, &client, &package)
}

fn send_package<W: Write>(
    out: &mut W,
    client: &CameraClient,
    package: &PackageFile,
) -> Result<Outcome> {
    writeln!(out, "Preparing to upload file: {}", package.name)?;
    let package = match OpenPackage::open(package) {
        Ok(p) => p,
        Err(e) => return report_failure(out, &e),
    };
    writeln!(out, "File opened and prepared for upload")?;
    writeln!(out, "Sending POST request...")?;

    match client.upload_package(&package) {
        Ok(response) => report_response(out, &response),
        Err(e) => report_failure(out, &e),
    }
}

fn report_response<W: Write>(out: &mut W, response: &UploadResponse) -> Result<Outcome> {
    let code = response.status.as_u16();
    writeln!(out, "Response status code: {}", code)?;
    writeln!(out, "Response headers: {:?}", response.headers)?;

    let outcome = if response.is_success() {
        writeln!(out, "Upload successful")?;
        Outcome::Uploaded
    } else {
        writeln!(out, "Upload failed with status code: {}", code)?;
        Outcome::Rejected(code)
    };
    writeln!(out, "Response content:")?;
    writeln!(out, "{}", response.body)?;
    info!("upload finished with status {}", code);
    Ok(outcome)
}

fn report_failure<W: Write>(out: &mut W, err: &UploadError) -> Result<Outcome> {
    writeln!(out, "Upload failed")?;
    writeln!(out, "Error: {}", err)?;
    writeln!(out, "Error type: {}", err.category())?;
    Ok(Outcome::from(err))
}
