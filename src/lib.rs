// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses arguments and hands off to `ui::run`.
//
// Module responsibilities:
// - `config`: credentials and the fixed camera endpoint.
// - `discovery`: finds the `.eap` package to upload.
// - `digest`: HTTP Digest challenge parsing and response computation.
// - `api`: the blocking HTTP client that uploads the package.
// - `error`: typed failures shared by the modules above.
// - `ui`: prints each step of an upload and classifies the outcome.
pub mod api;
pub mod config;
pub mod digest;
pub mod discovery;
pub mod error;
pub mod ui;
