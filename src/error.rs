use std::fmt::{self, Display};

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add a simple string context to the error with a specific error variant
    fn tm_config_err(self, msg: impl Display) -> std::result::Result<T, TmError>;

    fn tm_network_err(self, msg: impl Display) -> std::result::Result<T, TmError>;

    fn tm_validation_err(self, msg: impl Display) -> std::result::Result<T, TmError>;
}

impl<T, E: Display> ErrorContext<T> for std::result::Result<T, E> {
    fn tm_config_err(self, msg: impl Display) -> std::result::Result<T, TmError> {
        self.map_err(|e| TmError::Config(format!("{msg}: {e}")))
    }

    fn tm_network_err(self, msg: impl Display) -> std::result::Result<T, TmError> {
        self.map_err(|e| TmError::Network(format!("{msg}: {e}")))
    }

    fn tm_validation_err(self, msg: impl Display) -> std::result::Result<T, TmError> {
        self.map_err(|e| TmError::Validation(format!("{msg}: {e}")))
    }
}

/// A non-2xx response from the marketplace API.
///
/// Carries the numeric status as a structured field so callers branch on
/// [`TmError::kind`] instead of matching substrings of the rendered message.
/// The `Display` form is what users see and keeps the historical shape:
/// `<METHOD> <url> failed: <status> <reason> — <body>`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFailure {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {}", self.method, self.url, self.status)?;
        if !self.reason.is_empty() {
            write!(f, " {}", self.reason)?;
        }
        if !self.body.is_empty() {
            write!(f, " — {}", self.body)?;
        }
        Ok(())
    }
}

/// Coarse classification used by the top-level dispatch wrapper to pick a
/// rendering (login hint, credits guidance, plain message).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    PaymentRequired,
    NotFound,
    Network,
    Validation,
    Unknown,
}

#[derive(Debug, thiserror::Error)]
pub enum TmError {
    /// The API answered with a non-2xx status.
    #[error("{0}")]
    Api(HttpFailure),

    /// The request never produced a response (DNS, refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// A domain object could not be resolved after exhausting all lookups.
    #[error("{0} not found")]
    NotFound(String),

    /// Client-side input validation failed before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TmError::Api(failure) => match failure.status {
                401 => ErrorKind::Unauthorized,
                402 => ErrorKind::PaymentRequired,
                404 => ErrorKind::NotFound,
                _ => ErrorKind::Unknown,
            },
            TmError::Network(_) => ErrorKind::Network,
            TmError::NotFound(_) => ErrorKind::NotFound,
            TmError::Validation(_) => ErrorKind::Validation,
            TmError::Config(_) => ErrorKind::Unknown,
        }
    }

    /// The HTTP status code, when this error came from an API response.
    pub fn status(&self) -> Option<u16> {
        match self {
            TmError::Api(failure) => Some(failure.status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TmError {
    fn from(err: reqwest::Error) -> Self {
        TmError::Network(err.to_string())
    }
}
