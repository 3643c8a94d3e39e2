//! Error types for playlist-bridge.
//!
//! Every collaborator failure is reported as a [`BridgeError`] carrying an
//! [`ErrorCode`]. The transfer orchestrator records per-track failures and
//! keeps going; only setup failures ([`ErrorCode::is_fatal`]) end a run.

use std::fmt;

/// Error codes identifying the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Source page could not be fetched.
    /// Trigger: non-success HTTP status or transport failure.
    FetchFailed,

    /// Video search failed.
    /// Trigger: API error, quota exhausted, network failure.
    SearchFailed,

    /// Listing the account's playlists failed.
    LookupFailed,

    /// Creating a destination playlist failed.
    CreateFailed,

    /// Adding a video to a destination playlist failed.
    AddFailed,

    /// Authorization with the video platform failed.
    /// Trigger: bad credentials, rejected consent, token exchange error.
    AuthFailed,

    /// Configuration is missing or invalid.
    Configuration,

    /// A playlist link or identifier could not be understood.
    InvalidSource,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::SearchFailed => "SEARCH_FAILED",
            ErrorCode::LookupFailed => "LOOKUP_FAILED",
            ErrorCode::CreateFailed => "CREATE_FAILED",
            ErrorCode::AddFailed => "ADD_FAILED",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::Configuration => "CONFIGURATION",
            ErrorCode::InvalidSource => "INVALID_SOURCE",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::FetchFailed => "Failed to fetch the source playlist page",
            ErrorCode::SearchFailed => "Video search failed",
            ErrorCode::LookupFailed => "Failed to list destination playlists",
            ErrorCode::CreateFailed => "Failed to create destination playlist",
            ErrorCode::AddFailed => "Failed to add video to destination playlist",
            ErrorCode::AuthFailed => "Authorization with the video platform failed",
            ErrorCode::Configuration => "Configuration is missing or invalid",
            ErrorCode::InvalidSource => "Playlist link or identifier is not recognized",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::FetchFailed => {
                "Check that the playlist is public and the link is correct, then try again"
            }
            ErrorCode::SearchFailed => {
                "Check network access and remaining API quota; quota resets daily"
            }
            ErrorCode::LookupFailed | ErrorCode::CreateFailed | ErrorCode::AddFailed => {
                "Check that the authorized account can manage playlists, \
                 or delete the saved token to authorize again"
            }
            ErrorCode::AuthFailed => {
                "Verify the OAuth client credentials file and complete the consent \
                 screen in the browser, or delete the saved token and retry"
            }
            ErrorCode::Configuration => {
                "Provide a credentials file via BRIDGE_CREDENTIALS_FILE or the config file \
                 (destination.credentials_file)"
            }
            ErrorCode::InvalidSource => {
                "Use a link like https://open.spotify.com/playlist/<id>, \
                 a spotify:playlist:<id> URI, or the bare id"
            }
        }
    }

    /// Returns true for errors that abort the whole run before any transfer.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorCode::Configuration | ErrorCode::AuthFailed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for playlist-bridge operations.
#[derive(Debug)]
pub struct BridgeError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BridgeError {
    /// Creates a new BridgeError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new BridgeError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a FETCH_FAILED error.
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::FetchFailed,
            format!("Playlist request failed: {}", reason.into()),
        )
    }

    /// Creates a FETCH_FAILED error for a non-success HTTP status.
    pub fn fetch_status(status: u16, url: &str) -> Self {
        Self::new(
            ErrorCode::FetchFailed,
            format!("Playlist request failed: HTTP {} for {}", status, url),
        )
    }

    /// Creates a SEARCH_FAILED error.
    pub fn search_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SearchFailed,
            format!("Video search failed: {}", reason.into()),
        )
    }

    /// Creates a LOOKUP_FAILED error.
    pub fn lookup_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::LookupFailed,
            format!("Could not list playlists: {}", reason.into()),
        )
    }

    /// Creates a CREATE_FAILED error.
    pub fn create_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CreateFailed,
            format!("Could not create playlist: {}", reason.into()),
        )
    }

    /// Creates an ADD_FAILED error.
    pub fn add_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AddFailed,
            format!("Could not add video to playlist: {}", reason.into()),
        )
    }

    /// Creates an AUTH_FAILED error.
    pub fn auth_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AuthFailed,
            format!("Authorization failed: {}", reason.into()),
        )
    }

    /// Creates a CONFIGURATION error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, reason)
    }

    /// Creates an INVALID_SOURCE error.
    pub fn invalid_source(input: &str, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidSource,
            format!("Invalid playlist reference '{}': {}", input, reason.into()),
        )
    }

    /// Returns the message without the code prefix or recovery hint.
    ///
    /// Used for the per-track error lines in transfer reports.
    pub fn short_message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
