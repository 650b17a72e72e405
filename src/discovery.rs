//! Locate the `.eap` package to upload.

use crate::config::PACKAGE_EXTENSION;
use crate::error::UploadError;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// The package selected for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageFile {
    /// Bare file name, sent as the multipart filename.
    pub name: String,
    pub path: PathBuf,
}

/// True when `name` ends with `.eap`, ignoring case.
pub fn is_package_name(name: &str) -> bool {
    name.to_lowercase().ends_with(PACKAGE_EXTENSION)
}

/// List every package in `dir`, sorted by name.
pub fn list_packages(dir: &Path) -> Result<Vec<PackageFile>, UploadError> {
    let entries = fs::read_dir(dir).map_err(|source| UploadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| UploadError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            debug!("skipping non-UTF-8 entry {:?}", entry.file_name());
            continue;
        };
        if !is_package_name(&name) {
            continue;
        }
        let path = entry.path();
        // fs::metadata follows symlinks
        if !fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
            debug!("skipping {} (not a regular file)", path.display());
            continue;
        }
        found.push(PackageFile { name, path });
    }

    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

/// Pick the package to upload from `dir`. When several match, the first by
/// name wins and the rest are reported in the log.
pub fn find_package(dir: &Path) -> Result<PackageFile, UploadError> {
    let mut packages = list_packages(dir)?.into_iter();
    let chosen = packages
        .next()
        .ok_or_else(|| UploadError::NoPackage(dir.to_path_buf()))?;

    let ignored: Vec<String> = packages.map(|p| p.name).collect();
    if !ignored.is_empty() {
        warn!(
            "multiple .eap files found, uploading {} and ignoring {}",
            chosen.name,
            ignored.join(", ")
        );
    }
    debug!("selected package {}", chosen.path.display());
    Ok(chosen)
}
