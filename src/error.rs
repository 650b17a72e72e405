//! Error types for package discovery, digest auth and the upload request.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a Digest challenge cannot be answered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("not a Digest challenge: {0}")]
    NotDigest(String),
    #[error("Digest challenge is missing `{0}`")]
    MissingField(&'static str),
    #[error("unsupported Digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("unsupported Digest qop: {0}")]
    UnsupportedQop(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no .eap file found in {}", .0.display())]
    NoPackage(PathBuf),

    #[error("cannot list directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open package {}: {source}", path.display())]
    OpenPackage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{source}")]
    Transport {
        category: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot answer authentication challenge: {0}")]
    Digest(#[from] DigestError),
}

impl From<reqwest::Error> for UploadError {
    fn from(source: reqwest::Error) -> Self {
        UploadError::Transport {
            category: transport_category(&source),
            source,
        }
    }
}

impl UploadError {
    /// Short label for the failure class, printed as `Error type:`.
    pub fn category(&self) -> &'static str {
        match self {
            UploadError::NoPackage(_) | UploadError::ReadDir { .. } => "discovery",
            UploadError::OpenPackage { .. } => "io",
            UploadError::Transport { category, .. } => category,
            UploadError::Digest(_) => "auth",
        }
    }

    /// True for failures that happen before anything is sent to the camera.
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            UploadError::NoPackage(_) | UploadError::ReadDir { .. }
        )
    }
}

/// Classify a reqwest error by the stage at which it failed.
fn transport_category(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_redirect() {
        "redirect"
    } else if e.is_builder() {
        "builder"
    } else if e.is_body() {
        "body"
    } else if e.is_decode() {
        "decode"
    } else if e.is_request() {
        "request"
    } else {
        "http"
    }
}
