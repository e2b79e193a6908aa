// src/api/page_fetcher.rs
//! One page request: bounded retry, response classification, parsing.
//!
//! Every fetching path goes through [`PageFetcher::fetch`]. A call ends in
//! exactly one of three ways: a page (possibly a synthetic empty one, see
//! [`PageOutcome`]), or a fatal [`AppError`].

use super::types::{FetchMetadata, Item, PageEnvelope};
use super::{RawResponse, Transport};
use crate::config::RetryPolicy;
use crate::error::{describe_response, AppError, ResponseClass};
use crate::error_recovery::{retry_on_timeout, Attempted};
use std::sync::Arc;
use url::Url;

/// The non-fatal ways a page request can end.
///
/// Rejected filters and exhausted retries are kept apart from genuine
/// pages so callers can tell "zero items" from "degraded", even though the
/// pagers treat both as empty pages.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The catalog answered with a page envelope.
    Page(PageEnvelope),
    /// The catalog answered 400, typically an unknown filter value.
    FilterRejected { message: String },
    /// Every attempt timed out.
    RetriesExhausted { attempts: u32 },
}

impl PageOutcome {
    /// Items on this page; empty for the synthetic outcomes.
    pub fn results(&self) -> &[Item] {
        match self {
            PageOutcome::Page(envelope) => &envelope.results,
            _ => &[],
        }
    }

    pub fn into_results(self) -> Vec<Item> {
        match self {
            PageOutcome::Page(envelope) => envelope.results,
            _ => Vec::new(),
        }
    }

    /// Total reported by the catalog; zero for the synthetic outcomes.
    pub fn count(&self) -> u64 {
        match self {
            PageOutcome::Page(envelope) => envelope.count,
            _ => 0,
        }
    }

    /// Adds this outcome to a metadata tally, one request included.
    pub fn record(&self, metadata: &mut FetchMetadata) {
        metadata.requests += 1;
        match self {
            PageOutcome::Page(envelope) => metadata.items_received += envelope.results.len(),
            PageOutcome::FilterRejected { .. } => metadata.filters_rejected += 1,
            PageOutcome::RetriesExhausted { .. } => metadata.retries_exhausted += 1,
        }
    }
}

/// Issues single page requests under a retry policy.
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetches one page, retrying timeouts up to `max_retries` attempts.
    pub async fn fetch(&self, url: &Url) -> Result<PageOutcome, AppError> {
        let attempted = retry_on_timeout(
            || self.transport.get(url),
            self.policy.max_retries,
            self.policy.sleep,
            url.as_str(),
        )
        .await?;

        match attempted {
            Attempted::Completed { value, .. } => interpret(value),
            Attempted::Exhausted { attempts } => Ok(PageOutcome::RetriesExhausted { attempts }),
        }
    }
}

/// Turns a raw response into an outcome or a fatal error.
fn interpret(response: RawResponse) -> Result<PageOutcome, AppError> {
    let RawResponse { status, body, url } = response;

    match ResponseClass::classify(status, &body) {
        ResponseClass::Success => serde_json::from_str::<PageEnvelope>(&body)
            .map(PageOutcome::Page)
            .map_err(|e| AppError::MalformedResponse(format!("{} (url: {})", e, url))),
        ResponseClass::FilterRejected => {
            let message = describe_response(status, &body, &url);
            log::warn!("Filter rejected by catalog, treating as empty: {}", message);
            Ok(PageOutcome::FilterRejected { message })
        }
        fatal => {
            let message = describe_response(status, &body, &url);
            Err(AppError::from_response(fatal, status, &body, &url)
                .unwrap_or(AppError::UnexpectedStatus { status, message }))
        }
    }
}
