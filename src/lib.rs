// src/lib.rs
//! catalog-fetch library: enumerates paginated REST catalog collections.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ResponseClass`, `ValidationError`
//! - **Configuration**: `CatalogConfig`, `ConnectionConfig`, `FetchConfig`, `RetryPolicy`
//! - **Domain types**: `Filters`, `ParamSet`, `Scalar`, `ApiToken`, `Host`, `Scheme`
//! - **Engine**: `CatalogFetcher` and the stages it is built from
//! - **Transport**: the `Transport` seam and its reqwest implementation

// Internal modules, must match what's in main.rs
mod api;
mod config;
mod constants;
mod error;
mod error_recovery;
mod types;

// --- Error Handling ---
pub use crate::error::{AppError, ResponseClass};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    CatalogConfig, CommandLineInput, ConnectionConfig, FetchConfig, RetryPolicy,
};

// --- Domain Types ---
pub use crate::types::{ApiToken, FilterValue, Filters, Host, ParamSet, Scalar, Scheme};

// --- Engine ---
pub use crate::api::{
    aggregate, CatalogEndpoint, CatalogFetcher, CollectionResolver, CountProber, CountedParams,
    FetchMetadata, FetchResult, Item, NoReferences, PageEnvelope, PageFetcher, PageOutcome,
    ParallelCoordinator, ParamNormalizer, ReferenceMap, ReferenceResolver, ReferenceTarget,
    RequestSplitter, SequentialPager, SlicePriority, Window,
};

// --- Transport ---
pub use crate::api::{CatalogHttpClient, RawResponse, Transport, TransportError};
