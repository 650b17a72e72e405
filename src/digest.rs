//! HTTP Digest authentication (RFC 2617 / RFC 7616), client side.
//!
//! Only the pieces needed to answer a camera's `WWW-Authenticate: Digest`
//! challenge are implemented: parsing the challenge, and computing the
//! `Authorization` header for a single request with `qop=auth` (or the
//! legacy RFC 2069 form when the server offers no qop).

use crate::config::Credentials;
use crate::error::DigestError;
use md5::Md5;
use rand::Rng;
use sha2::{Digest, Sha256, Sha512_256};

/// Nonce count sent with the (only) authenticated request.
const NONCE_COUNT: &str = "00000001";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha256,
    Sha512_256,
}

impl HashKind {
    fn hex(self, data: &str) -> String {
        match self {
            HashKind::Md5 => hex::encode(Md5::digest(data.as_bytes())),
            HashKind::Sha256 => hex::encode(Sha256::digest(data.as_bytes())),
            HashKind::Sha512_256 => hex::encode(Sha512_256::digest(data.as_bytes())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Algorithm {
    pub hash: HashKind,
    pub session: bool,
}

impl Algorithm {
    fn parse(name: &str) -> Result<Self, DigestError> {
        let upper = name.to_ascii_uppercase();
        let (base, session) = match upper.strip_suffix("-SESS") {
            Some(base) => (base, true),
            None => (upper.as_str(), false),
        };
        let hash = match base {
            "MD5" => HashKind::Md5,
            "SHA-256" => HashKind::Sha256,
            "SHA-512-256" => HashKind::Sha512_256,
            _ => return Err(DigestError::UnsupportedAlgorithm(name.to_string())),
        };
        Ok(Algorithm { hash, session })
    }

    fn name(&self) -> &'static str {
        match (self.hash, self.session) {
            (HashKind::Md5, false) => "MD5",
            (HashKind::Md5, true) => "MD5-sess",
            (HashKind::Sha256, false) => "SHA-256",
            (HashKind::Sha256, true) => "SHA-256-sess",
            (HashKind::Sha512_256, false) => "SHA-512-256",
            (HashKind::Sha512_256, true) => "SHA-512-256-sess",
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm {
            hash: HashKind::Md5,
            session: false,
        }
    }
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: Algorithm,
    /// True when the server offered `qop=auth`; false means RFC 2069 mode.
    pub qop_auth: bool,
}

impl Challenge {
    /// Parse a `WWW-Authenticate` header value.
    pub fn parse(header: &str) -> Result<Self, DigestError> {
        let header = header.trim();
        let (scheme, rest) = header
            .split_once(char::is_whitespace)
            .unwrap_or((header, ""));
        if !scheme.eq_ignore_ascii_case("digest") {
            return Err(DigestError::NotDigest(scheme.to_string()));
        }

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = Algorithm::default();
        let mut qop = None;

        for (key, value) in parse_params(rest) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "algorithm" => algorithm = Algorithm::parse(&value)?,
                "qop" => qop = Some(value),
                _ => {}
            }
        }

        let qop_auth = match qop {
            None => false,
            Some(offered) => {
                if offered
                    .split(',')
                    .any(|q| q.trim().eq_ignore_ascii_case("auth"))
                {
                    true
                } else {
                    return Err(DigestError::UnsupportedQop(offered));
                }
            }
        };

        Ok(Challenge {
            realm: realm.ok_or(DigestError::MissingField("realm"))?,
            nonce: nonce.ok_or(DigestError::MissingField("nonce"))?,
            opaque,
            algorithm,
            qop_auth,
        })
    }

    /// Compute the `response` hash for one request.
    pub fn response(&self, creds: &Credentials, method: &str, uri: &str, cnonce: &str) -> String {
        let h = self.algorithm.hash;
        let mut ha1 = h.hex(&format!(
            "{}:{}:{}",
            creds.username, self.realm, creds.password
        ));
        if self.algorithm.session {
            ha1 = h.hex(&format!("{}:{}:{}", ha1, self.nonce, cnonce));
        }
        let ha2 = h.hex(&format!("{}:{}", method, uri));

        if self.qop_auth {
            h.hex(&format!(
                "{}:{}:{}:{}:auth:{}",
                ha1, self.nonce, NONCE_COUNT, cnonce, ha2
            ))
        } else {
            h.hex(&format!("{}:{}:{}", ha1, self.nonce, ha2))
        }
    }

    /// Build the full `Authorization` header value.
    pub fn authorization(
        &self,
        creds: &Credentials,
        method: &str,
        uri: &str,
        cnonce: &str,
    ) -> String {
        let response = self.response(creds, method, uri, cnonce);
        let mut header = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\", algorithm={}",
            quote_escape(&creds.username),
            quote_escape(&self.realm),
            quote_escape(&self.nonce),
            uri,
            response,
            self.algorithm.name(),
        );
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(", opaque=\"{}\"", quote_escape(opaque)));
        }
        if self.qop_auth {
            header.push_str(&format!(
                ", qop=auth, nc={}, cnonce=\"{}\"",
                NONCE_COUNT, cnonce
            ));
        }
        header
    }
}

/// Random client nonce, 16 lowercase hex characters.
pub fn new_cnonce() -> String {
    let bytes: [u8; 8] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Split `k=v, k="v, with comma", ...` into key/value pairs.
fn parse_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
            chars.next();
        }
        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.trim().is_empty() {
            break;
        }
        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            if chars.peek() == Some(&'"') {
                chars.next();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => value.push(c),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
                value = value.trim().to_string();
            }
        }
        params.push((key.trim().to_string(), value));
    }
    params
}

fn quote_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
