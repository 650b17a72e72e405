//! Uploader configuration: device credentials and the fixed upload endpoint.

/// Path of the application upload CGI on the camera.
pub const UPLOAD_PATH: &str = "/axis-cgi/applications/upload.cgi";

/// Multipart field name the camera expects the package under.
pub const UPLOAD_FIELD: &str = "packfil";

/// Content type sent with the package part.
pub const PACKAGE_MIME: &str = "application/octet-stream";

/// Package file extension, compared case-insensitively.
pub const PACKAGE_EXTENSION: &str = ".eap";

/// Default device credentials.
pub const DEFAULT_USERNAME: &str = "nodered";
pub const DEFAULT_PASSWORD: &str = "rednode";

/// Environment variables that override the default credentials.
pub const USERNAME_ENV: &str = "EAP_UPLOAD_USER";
pub const PASSWORD_ENV: &str = "EAP_UPLOAD_PASSWORD";

/// Username/password pair used to answer Digest challenges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.into(),
            password: DEFAULT_PASSWORD.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UploaderConfig {
    pub credentials: Credentials,
}

impl UploaderConfig {
    /// Build a config from `EAP_UPLOAD_USER` / `EAP_UPLOAD_PASSWORD`,
    /// falling back to the device defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let username = lookup(USERNAME_ENV).unwrap_or_else(|| DEFAULT_USERNAME.into());
        let password = lookup(PASSWORD_ENV).unwrap_or_else(|| DEFAULT_PASSWORD.into());
        UploaderConfig {
            credentials: Credentials { username, password },
        }
    }

    /// Apply explicit overrides (from the command line) on top of this config.
    pub fn with_overrides(mut self, username: Option<String>, password: Option<String>) -> Self {
        if let Some(u) = username {
            self.credentials.username = u;
        }
        if let Some(p) = password {
            self.credentials.password = p;
        }
        self
    }
}

/// Full upload URL for a target host (`host` or `host:port`).
pub fn upload_url(target: &str) -> String {
    format!("http://{}{}", target, UPLOAD_PATH)
}
