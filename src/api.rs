// Camera client module: a small blocking HTTP client that posts an
// application package to the camera's upload CGI and answers the Digest
// challenge the camera replies with.

use crate::config::{upload_url, Credentials, UploaderConfig, PACKAGE_MIME, UPLOAD_FIELD};
use crate::digest::{self, Challenge};
use crate::discovery::PackageFile;
use crate::error::{DigestError, UploadError};
use log::debug;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use std::fs::File;
use std::io::Seek;
use std::path::PathBuf;

/// Blocking client bound to one camera's upload URL.
#[derive(Clone)]
pub struct CameraClient {
    client: Client,
    url: String,
    credentials: Credentials,
}

/// A package whose file is open and ready to be streamed.
///
/// The handle is closed when this value is dropped.
#[derive(Debug)]
pub struct OpenPackage {
    pub name: String,
    path: PathBuf,
    file: File,
    len: u64,
}

impl OpenPackage {
    pub fn open(package: &PackageFile) -> Result<Self, UploadError> {
        let open_err = |source| UploadError::OpenPackage {
            path: package.path.clone(),
            source,
        };
        let file = File::open(&package.path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();
        Ok(OpenPackage {
            name: package.name.clone(),
            path: package.path.clone(),
            file,
            len,
        })
    }

    /// Size of the package in bytes.
    pub fn size(&self) -> u64 {
        self.len
    }

    /// A fresh multipart part reading the file from offset 0.
    fn part(&self) -> Result<multipart::Part, UploadError> {
        // The clone shares the file offset, so rewinding it resets the
        // original handle too.
        let open_err = |source| UploadError::OpenPackage {
            path: self.path.clone(),
            source,
        };
        let mut body = self.file.try_clone().map_err(open_err)?;
        body.rewind().map_err(open_err)?;
        Ok(multipart::Part::reader_with_length(body, self.len)
            .file_name(self.name.clone())
            .mime_str(PACKAGE_MIME)?)
    }
}

/// What the camera sent back for the upload.
#[derive(Debug)]
pub struct UploadResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl UploadResponse {
    fn read(res: Response) -> Result<Self, UploadError> {
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.text()?;
        Ok(UploadResponse {
            status,
            headers,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK
    }
}

impl CameraClient {
    /// Create a client for `target` (a host or `host:port`).
    pub fn new(target: &str, config: &UploaderConfig) -> Result<Self, UploadError> {
        let client = Client::builder().build()?;
        Ok(CameraClient {
            client,
            url: upload_url(target),
            credentials: config.credentials.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Upload `package` as the `packfil` multipart field.
    ///
    /// The first attempt goes out without credentials. A `401` carrying a
    /// Digest challenge is answered by sending the same body once more with
    /// an `Authorization` header. Any other response is returned as is.
    pub fn upload_package(&self, package: &OpenPackage) -> Result<UploadResponse, UploadError> {
        let first = self.send(package, None)?;
        if first.status() != StatusCode::UNAUTHORIZED {
            return UploadResponse::read(first);
        }

        let challenge = match digest_challenge(first.headers()) {
            Some(parsed) => parsed?,
            None => {
                debug!("401 without a usable Digest challenge, giving up");
                return UploadResponse::read(first);
            }
        };
        let uri = match first.url().query() {
            Some(q) => format!("{}?{}", first.url().path(), q),
            None => first.url().path().to_string(),
        };
        drop(first);

        debug!(
            "answering Digest challenge realm={} algorithm={:?} qop_auth={}",
            challenge.realm, challenge.algorithm, challenge.qop_auth
        );
        let authorization =
            challenge.authorization(&self.credentials, "POST", &uri, &digest::new_cnonce());
        let second = self.send(package, Some(authorization))?;
        UploadResponse::read(second)
    }

    fn send(
        &self,
        package: &OpenPackage,
        authorization: Option<String>,
    ) -> Result<Response, UploadError> {
        let form = multipart::Form::new().part(UPLOAD_FIELD, package.part()?);

        let mut req = self.client.post(&self.url).multipart(form);
        if let Some(value) = authorization {
            req = req.header(AUTHORIZATION, value);
        }
        Ok(req.send()?)
    }
}

/// Pick the Digest challenge to answer among the `WWW-Authenticate` headers.
///
/// The first challenge we can answer wins. Other schemes and malformed
/// Digest challenges are skipped. If only unanswerable challenges remain
/// (unknown algorithm, `auth-int` only), the first of those is returned as
/// the error. `None` means there is nothing to answer.
fn digest_challenge(headers: &HeaderMap) -> Option<Result<Challenge, DigestError>> {
    let mut unsupported = None;
    for value in headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|v| v.to_str().ok())
    {
        match Challenge::parse(value) {
            Ok(challenge) => return Some(Ok(challenge)),
            Err(DigestError::NotDigest(_)) => {}
            Err(e @ DigestError::MissingField(_)) => debug!("ignoring challenge: {}", e),
            Err(e) => {
                unsupported.get_or_insert(e);
            }
        }
    }
    unsupported.map(Err)
}
