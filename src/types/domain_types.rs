// src/types/domain_types.rs
//! Connection newtypes validated at construction.

use super::ValidationError;
use std::fmt;
use std::str::FromStr;

/// API token sent as `Authorization: Token <value>`.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ApiToken(String);

impl ApiToken {
    /// Creates a token; an empty token is allowed for anonymous catalogs.
    pub fn new(token: impl Into<String>) -> Result<Self, ValidationError> {
        let token = token.into();
        if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidToken {
                reason: "token cannot contain whitespace or control characters".to_string(),
            });
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken({})", self)
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact everything past the first four characters
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "{}...", visible)
    }
}

/// Catalog host name, without scheme or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host(String);

impl Host {
    pub fn new(host: impl Into<String>) -> Result<Self, ValidationError> {
        let host = host.into().trim().trim_end_matches('/').to_string();
        if host.is_empty() {
            return Err(ValidationError::EmptyField("host"));
        }
        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access scheme for the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ValidationError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
