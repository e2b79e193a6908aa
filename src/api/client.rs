// src/api/client.rs
//! Pure HTTP client wrapper for the catalog API.
//!
//! A thin wrapper around reqwest that handles authentication, TLS
//! verification and the per-request timeout. It never interprets a status
//! code; classification happens in the page fetcher.

use super::{RawResponse, Transport, TransportError};
use crate::config::{ConnectionConfig, RetryPolicy};
use crate::error::AppError;
use crate::types::ApiToken;
use reqwest::{header, Client};
use url::Url;

/// A thin wrapper around reqwest Client for catalog requests.
#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
}

impl CatalogHttpClient {
    /// Creates an HTTP client with token authentication and the policy's timeout.
    pub fn new(connection: &ConnectionConfig, retry: &RetryPolicy) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(&connection.token)?)
            .timeout(retry.timeout)
            .danger_accept_invalid_certs(!connection.verify_tls)
            .build()?;
        Ok(Self { client })
    }

    /// Creates the default headers for catalog requests.
    fn create_headers(token: &ApiToken) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        if !token.is_empty() {
            let auth_header = format!("Token {}", token.as_str());
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&auth_header).map_err(|e| {
                    AppError::InvalidConfiguration(format!("Invalid API token format: {}", e))
                })?,
            );
        }

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl Transport for CatalogHttpClient {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await.map_err(transport_error)?;

        log::debug!("{} {}", status, url);
        Ok(RawResponse { status, body, url })
    }
}

/// Maps a reqwest failure onto the retryable/fatal split.
fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
