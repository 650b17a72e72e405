//! Minimal HTTP/1.1 server standing in for the camera's upload CGI.
//!
//! Records every request it receives. When `require_digest` is set, a request
//! without a valid Digest `Authorization` header gets a 401 challenge; a valid
//! one gets the configured status and body.

use md5::{Digest, Md5};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const REALM: &str = "AXIS_TEST";
pub const NONCE: &str = "0000a1b2c3d4e5f6";

#[derive(Debug, Clone)]
pub struct CameraOptions {
    /// Challenge requests that lack valid Digest credentials.
    pub require_digest: bool,
    /// `WWW-Authenticate` values sent with the challenge, one header each.
    pub challenges: Vec<String>,
    /// Status and body returned once the request is accepted.
    pub status: u16,
    pub body: String,
    pub username: String,
    pub password: String,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            require_digest: false,
            challenges: vec![md5_challenge()],
            status: 200,
            body: "OK".into(),
            username: "nodered".into(),
            password: "rednode".into(),
        }
    }
}

/// The challenge this server can verify: MD5, `qop=auth`.
pub fn md5_challenge() -> String {
    format!(
        "Digest realm=\"{}\", nonce=\"{}\", algorithm=MD5, qop=\"auth\"",
        REALM, NONCE
    )
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_contains(&self, needle: &[u8]) -> bool {
        self.body.windows(needle.len()).any(|w| w == needle)
    }
}

pub struct CameraServer {
    /// `host:port` to pass as the upload target.
    pub target: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl CameraServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(opts: CameraOptions) -> CameraServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let recorded = Arc::clone(&recorded);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &opts, &recorded));
        }
    });
    CameraServer {
        target: format!("127.0.0.1:{}", port),
        requests,
    }
}

/// A port on which nothing listens.
pub fn closed_port_target() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("127.0.0.1:{}", port)
}

fn handle(stream: TcpStream, opts: &CameraOptions, recorded: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut writer = match stream.try_clone() {
        Ok(w) => w,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);

    // Keep-alive: serve requests until the client closes the connection.
    while let Some(req) = read_request(&mut reader) {
        recorded.lock().unwrap().push(req.clone());

        let authorized = !opts.require_digest
            || req
                .header("authorization")
                .map(|h| digest_is_valid(h, &req, opts))
                .unwrap_or(false);

        let response = if authorized {
            format!(
                "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                opts.status,
                reason(opts.status),
                opts.body.len(),
                opts.body
            )
        } else {
            let challenges: String = opts
                .challenges
                .iter()
                .map(|c| format!("WWW-Authenticate: {}\r\n", c))
                .collect();
            format!(
                "HTTP/1.1 401 Unauthorized\r\n{}Content-Length: 0\r\n\r\n",
                challenges
            )
        };
        if writer.write_all(response.as_bytes()).is_err() {
            return;
        }
    }
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<RecordedRequest> {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let mut req = RecordedRequest {
        method,
        path,
        headers,
        body: Vec::new(),
    };
    if let Some(len) = req.header("content-length") {
        let len: usize = len.parse().ok()?;
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).ok()?;
        req.body = body;
    } else if req
        .header("transfer-encoding")
        .map(|v| v.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
    {
        req.body = read_chunked(reader)?;
    }
    Some(req)
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size_hex = size_line.trim().split(';').next()?;
        let size = usize::from_str_radix(size_hex, 16).ok()?;
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// Recompute the expected MD5 `qop=auth` response and compare.
fn digest_is_valid(header: &str, req: &RecordedRequest, opts: &CameraOptions) -> bool {
    let Some(rest) = header.strip_prefix("Digest ") else {
        return false;
    };
    let param = |key: &str| auth_param(rest, key);
    let (Some(user), Some(uri), Some(nc), Some(cnonce), Some(response)) = (
        param("username"),
        param("uri"),
        param("nc"),
        param("cnonce"),
        param("response"),
    ) else {
        return false;
    };
    if user != opts.username || uri != req.path || param("nonce").as_deref() != Some(NONCE) {
        return false;
    }
    let ha1 = md5_hex(&format!("{}:{}:{}", opts.username, REALM, opts.password));
    let ha2 = md5_hex(&format!("{}:{}", req.method, uri));
    let expected = md5_hex(&format!("{}:{}:{}:{}:auth:{}", ha1, NONCE, nc, cnonce, ha2));
    response == expected
}

/// Value of `key` in a `k="v", k=v` list. Test-grade: no escapes.
pub fn auth_param(params: &str, key: &str) -> Option<String> {
    params.split(',').find_map(|kv| {
        let (k, v) = kv.trim().split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
    })
}

fn md5_hex(s: &str) -> String {
    hex::encode(Md5::digest(s.as_bytes()))
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
