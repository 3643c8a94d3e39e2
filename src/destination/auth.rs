//! OAuth 2.0 authorization for the video platform.
//!
//! A saved token is reused while valid and refreshed once it expires.
//! Without one, the installed-app flow runs: the user opens an authorization
//! URL, the provider redirects to a one-shot listener on the loopback
//! interface, and the code is exchanged (with a PKCE verifier) for a token
//! that is then saved.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, ErrorCode, Result};

/// Scope granting playlist management.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECS: u64 = 60;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration, as downloaded from the provider console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct CredentialsFile {
    installed: Option<ClientCredentials>,
    web: Option<ClientCredentials>,
}

impl ClientCredentials {
    /// Parses an `installed` or `web` client JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(text).map_err(|e| {
            BridgeError::with_source(
                ErrorCode::Configuration,
                "Credentials file is not valid client JSON",
                e,
            )
        })?;
        file.installed.or(file.web).ok_or_else(|| {
            BridgeError::configuration(
                "Credentials file has neither an \"installed\" nor a \"web\" client",
            )
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::with_source(
                ErrorCode::Configuration,
                format!("Failed to read credentials file {}", path.display()),
                e,
            )
        })?;
        Self::from_json(&text)
    }
}

/// A saved access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as Unix seconds.
    pub expires_at: u64,
}

impl StoredToken {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now.saturating_add(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

impl TokenResponse {
    /// Refresh responses usually omit the refresh token; keep the old one then.
    fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: unix_now().saturating_add(self.expires_in),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Loads a saved token. A missing or unreadable file yields `None`.
pub fn load_token(path: &Path) -> Option<StoredToken> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable token file");
            None
        }
    }
}

/// Saves a token, readable only by the owner on Unix.
pub fn save_token(path: &Path, token: &StoredToken) -> Result<()> {
    let io_error = |e: std::io::Error| {
        BridgeError::with_source(
            ErrorCode::AuthFailed,
            format!("Failed to save token to {}", path.display()),
            e,
        )
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let json = serde_json::to_string_pretty(token).map_err(|e| {
        BridgeError::with_source(ErrorCode::AuthFailed, "Failed to serialize token", e)
    })?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_error)?;
    file.write_all(json.as_bytes()).map_err(io_error)?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(io_error)?;
    }

    Ok(())
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// PKCE verifier and its S256 challenge.
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate() -> Self {
        let verifier = random_string(64);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// BASE64URL(SHA256(verifier)) without padding.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Builds the consent URL the user opens in a browser.
pub fn authorization_url(
    credentials: &ClientCredentials,
    redirect_uri: &str,
    challenge: &str,
    state: &str,
) -> Result<Url> {
    Url::parse_with_params(
        &credentials.auth_uri,
        &[
            ("client_id", credentials.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", YOUTUBE_SCOPE),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
            ("state", state),
        ],
    )
    .map_err(|e| {
        BridgeError::with_source(
            ErrorCode::Configuration,
            "Invalid authorization URI in credentials",
            e,
        )
    })
}

/// Query parameters delivered by the authorization redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// True if this request finishes the flow one way or the other.
    fn is_final(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

/// Parses an HTTP request line such as `GET /?code=x&state=y HTTP/1.1`.
pub fn parse_callback_request(request_line: &str) -> Option<CallbackParams> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let url = Url::parse("http://127.0.0.1").ok()?.join(target).ok()?;

    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => params.code = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(params)
}

/// Checks the redirect against the expected state and returns the code.
pub fn verify_callback(params: CallbackParams, expected_state: &str) -> Result<String> {
    if let Some(error) = params.error {
        return Err(BridgeError::auth_failed(format!("consent was not granted ({})", error)));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(BridgeError::auth_failed("state mismatch in authorization redirect"));
    }
    params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| BridgeError::auth_failed("authorization code missing from redirect"))
}

/// Loopback listener for a single authorization attempt.
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
}

impl CallbackListener {
    /// Binds `127.0.0.1:port`. Port 0 picks a free port.
    pub fn bind(port: u16) -> Result<Self> {
        let bind_error = |e: std::io::Error| {
            BridgeError::with_source(
                ErrorCode::AuthFailed,
                format!("Failed to listen for the authorization redirect on port {}", port),
                e,
            )
        };
        let listener = TcpListener::bind(("127.0.0.1", port)).map_err(bind_error)?;
        let port = listener.local_addr().map_err(bind_error)?.port();
        Ok(Self { listener, port })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Serves requests on a background thread until one carries a code or an
    /// error, then hands it over through a rendezvous channel.
    ///
    /// The receiver yields at most once. Unrelated requests (favicon and the
    /// like) are answered with 404 and do not end the attempt.
    pub fn spawn(self) -> mpsc::Receiver<CallbackParams> {
        let (tx, rx) = mpsc::sync_channel(0);

        thread::spawn(move || {
            for stream in self.listener.incoming() {
                let mut stream = match stream {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::debug!(error = %e, "callback accept failed");
                        continue;
                    }
                };

                match read_request(&mut stream) {
                    Some(params) if params.is_final() => {
                        let body = if params.code.is_some() {
                            "Authorization complete. You can close this window."
                        } else {
                            "Authorization was not granted. You can close this window."
                        };
                        respond(&mut stream, "200 OK", body);
                        drop(stream);
                        // fails only if the flow already gave up waiting
                        let _ = tx.send(params);
                        break;
                    }
                    _ => respond(&mut stream, "404 Not Found", "Not found"),
                }
            }
        });

        rx
    }
}

fn read_request(stream: &mut TcpStream) -> Option<CallbackParams> {
    stream.set_read_timeout(Some(Duration::from_secs(10))).ok()?;
    let mut reader = BufReader::new(&*stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;

    // drain headers so closing does not reset the connection
    let mut header = String::new();
    while reader.read_line(&mut header).map(|n| n > 0).unwrap_or(false) {
        if header.trim().is_empty() {
            break;
        }
        header.clear();
    }

    parse_callback_request(&request_line)
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    if let Err(e) = stream.write_all(response.as_bytes()) {
        tracing::debug!(error = %e, "failed to answer callback request");
    }
}

/// Obtains access tokens for the video platform.
pub struct Authenticator {
    credentials: ClientCredentials,
    token_path: PathBuf,
    redirect_port: u16,
    http: Client,
}

impl Authenticator {
    pub fn new(credentials: ClientCredentials, token_path: PathBuf, redirect_port: u16) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| {
            BridgeError::with_source(ErrorCode::Configuration, "Failed to create HTTP client", e)
        })?;
        Ok(Self {
            credentials,
            token_path,
            redirect_port,
            http,
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        let credentials = ClientCredentials::from_file(&config.effective_credentials_path())?;
        Self::new(
            credentials,
            config.effective_token_path(),
            config.destination.redirect_port,
        )
    }

    /// Returns a usable token: the saved one, a refreshed one, or a new one
    /// from the interactive flow, in that order of preference.
    pub fn authorize(&self) -> Result<StoredToken> {
        if let Some(token) = load_token(&self.token_path) {
            if !token.is_expired() {
                tracing::debug!(path = %self.token_path.display(), "using saved token");
                return Ok(token);
            }
            if let Some(refresh_token) = token.refresh_token.as_deref() {
                match self.refresh(refresh_token) {
                    Ok(fresh) => {
                        tracing::info!("access token refreshed");
                        self.persist(&fresh);
                        return Ok(fresh);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e.short_message(), "token refresh failed, authorizing again");
                    }
                }
            }
        }

        let token = self.interactive()?;
        self.persist(&token);
        Ok(token)
    }

    /// Exchanges a refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<StoredToken> {
        let response = self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ])?;
        Ok(response.into_stored(Some(refresh_token.to_string())))
    }

    fn interactive(&self) -> Result<StoredToken> {
        let listener = CallbackListener::bind(self.redirect_port)?;
        let redirect_uri = listener.redirect_uri();
        let pkce = Pkce::generate();
        let state = random_string(32);
        let url = authorization_url(&self.credentials, &redirect_uri, &pkce.challenge, &state)?;

        println!("Open this URL in your browser to authorize playlist access:\n\n{}\n", url);
        tracing::info!(redirect_uri = %redirect_uri, "waiting for authorization redirect");

        let params = listener.spawn().recv_timeout(CALLBACK_TIMEOUT).map_err(|_| {
            BridgeError::auth_failed("timed out waiting for the authorization redirect")
        })?;
        let code = verify_callback(params, &state)?;

        let response = self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code_verifier", pkce.verifier.as_str()),
        ])?;
        tracing::info!("authorization complete");
        Ok(response.into_stored(None))
    }

    fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.credentials.token_uri)
            .form(form)
            .send()
            .map_err(|e| BridgeError::with_source(ErrorCode::AuthFailed, "Token request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BridgeError::auth_failed(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        response.json::<TokenResponse>().map_err(|e| {
            BridgeError::with_source(ErrorCode::AuthFailed, "Invalid token response", e)
        })
    }

    fn persist(&self, token: &StoredToken) {
        if let Err(e) = save_token(&self.token_path, token) {
            tracing::warn!(error = %e.short_message(), "token not saved; next run will authorize again");
        }
    }
}
