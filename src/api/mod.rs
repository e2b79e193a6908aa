// src/api/mod.rs
//! Catalog API interaction: the ability to enumerate a list endpoint.
//!
//! This module separates I/O (the `Transport` seam), request shaping
//! (normalization, splitting), scheduling (sequential or worker pool) and
//! aggregation, so each stage can be exercised in isolation.

pub mod aggregator;
pub mod client;
mod concurrent_queue;
pub mod endpoint;
pub mod fetcher;
pub mod normalizer;
pub mod page_fetcher;
pub mod pagination;
pub mod parallel_fetcher;
pub mod references;
pub mod splitter;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

use crate::error::AppError;
use crate::types::Scalar;
use thiserror::Error;
use url::Url;

/// A raw HTTP response, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    pub url: String,
}

/// Transport failures that never produced a response.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Connect or read timeout, worth retrying
    #[error("timeout: {0}")]
    Timeout(String),
    /// Any other connection failure, fatal
    #[error("connection failed: {0}")]
    Connection(String),
}

/// The ability to issue one GET against the catalog.
///
/// The engine depends on this trait, never on HTTP details.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError>;
}

/// The ability to turn name-valued filters into numeric identifiers.
#[async_trait::async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Whether `key` names a reference this resolver can look up.
    fn resolves(&self, key: &str) -> bool;

    /// Returns the ids of every referenced object matching one of `values`.
    ///
    /// Values without a match contribute nothing.
    async fn resolve(&self, key: &str, values: &[Scalar]) -> Result<Vec<i64>, AppError>;
}

/// A resolver that knows no references; every filter passes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferences;

#[async_trait::async_trait]
impl ReferenceResolver for NoReferences {
    fn resolves(&self, _key: &str) -> bool {
        false
    }

    async fn resolve(&self, _key: &str, _values: &[Scalar]) -> Result<Vec<i64>, AppError> {
        Ok(Vec::new())
    }
}

// Re-export the public interface
pub use aggregator::aggregate;
pub use client::CatalogHttpClient;
pub use endpoint::CatalogEndpoint;
pub use fetcher::CatalogFetcher;
pub use normalizer::ParamNormalizer;
pub use page_fetcher::{PageFetcher, PageOutcome};
pub use pagination::SequentialPager;
pub use parallel_fetcher::{CountProber, ParallelCoordinator};
pub use references::{CollectionResolver, ReferenceMap, ReferenceTarget};
pub use splitter::{RequestSplitter, SlicePriority};
pub use types::{CountedParams, FetchMetadata, FetchResult, Item, PageEnvelope, Window};
