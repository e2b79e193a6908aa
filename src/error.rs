// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the engine.
//! Fatal variants abort a whole fetch; non-fatal conditions never reach
//! this type and are absorbed at the slice level instead.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

static CREDENTIALS_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(crate::constants::CREDENTIALS_ERROR_PATTERN)
        .expect("credentials pattern should be a valid regex")
});

static PAGE_NOT_FOUND_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<title>Page Not Found\..+").expect("page-not-found pattern should be a valid regex")
});

/// How a catalog response is classified before anything is parsed.
///
/// Instead of checking status ranges at every call site, the list-endpoint
/// contract is encoded once here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx, the body is a page envelope
    Success,
    /// 5xx, the catalog itself is failing
    ServerError,
    /// 403 whose body names an invalid token
    InvalidCredentials,
    /// 400, a filter value the catalog cannot resolve, e.g. an unknown tag
    FilterRejected,
    /// Any other non-2xx status
    Unexpected(u16),
}

impl ResponseClass {
    /// Classifies a status code and response body.
    pub fn classify(status: u16, body: &str) -> Self {
        match status {
            200..=299 => Self::Success,
            500..=599 => Self::ServerError,
            403 if CREDENTIALS_ERROR.is_match(body) => Self::InvalidCredentials,
            400 => Self::FilterRejected,
            other => Self::Unexpected(other),
        }
    }

    /// Whether this class aborts the whole fetch.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ServerError | Self::InvalidCredentials | Self::Unexpected(_)
        )
    }
}

impl fmt::Display for ResponseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ServerError => write!(f, "server_error"),
            Self::InvalidCredentials => write!(f, "invalid_credentials"),
            Self::FilterRejected => write!(f, "filter_rejected"),
            Self::Unexpected(code) => write!(f, "http_{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Catalog connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Catalog server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Catalog credentials error: {message}")]
    InvalidCredentials { message: String },

    #[error("Catalog returned unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request URL of {length} characters exceeds the {limit} limit and cannot be split further: {url}")]
    UrlTooLong {
        length: usize,
        limit: usize,
        url: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    /// Builds the fatal error matching a response class.
    ///
    /// Returns `None` for classes that are not fatal.
    pub fn from_response(class: ResponseClass, status: u16, body: &str, url: &str) -> Option<Self> {
        let message = describe_response(status, body, url);
        match class {
            ResponseClass::ServerError => Some(AppError::ServerError { status, message }),
            ResponseClass::InvalidCredentials => Some(AppError::InvalidCredentials { message }),
            ResponseClass::Unexpected(status) => {
                Some(AppError::UnexpectedStatus { status, message })
            }
            ResponseClass::Success | ResponseClass::FilterRejected => None,
        }
    }
}

/// Renders a failed response for logs and error messages.
///
/// HTML "Page Not Found" pages are reduced to their title.
pub fn describe_response(status: u16, body: &str, url: &str) -> String {
    let text = if PAGE_NOT_FOUND_TITLE.is_match(body) {
        "Page Not Found."
    } else {
        body.trim()
    };
    format!("status_code={} text={:?} url={:?}", status, text, url)
}

// Allow converting from anyhow::Error, preserving the message
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError {
            message: format!("Fetch worker task failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}
