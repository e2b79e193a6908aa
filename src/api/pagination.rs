// src/api/pagination.rs
//! Offset pagination for one parameter set at a time.

use super::endpoint::CatalogEndpoint;
use super::page_fetcher::PageFetcher;
use super::types::{FetchMetadata, FetchResult, Item, Window};
use crate::error::AppError;
use crate::types::ParamSet;
use std::time::Duration;

/// Walks a collection page by page until a short page comes back.
///
/// A catalog that always answers with exactly `page_limit` items never ends
/// the loop on its own; set `max_items` when talking to one.
#[derive(Clone)]
pub struct SequentialPager {
    fetcher: PageFetcher,
    endpoint: CatalogEndpoint,
    page_limit: u32,
    interval: Duration,
    max_items: Option<usize>,
}

impl SequentialPager {
    pub fn new(fetcher: PageFetcher, endpoint: CatalogEndpoint, page_limit: u32) -> Self {
        Self {
            fetcher,
            endpoint,
            page_limit: page_limit.max(1),
            interval: Duration::ZERO,
            max_items: None,
        }
    }

    /// Pause between consecutive pages of the same parameter set.
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Stops paging a parameter set once this many items have arrived.
    pub fn with_max_items(self, max_items: Option<usize>) -> Self {
        Self { max_items, ..self }
    }

    /// The same pager without an item cap.
    pub fn unbounded(&self) -> Self {
        self.clone().with_max_items(None)
    }

    /// Fetches every page of `params` under `path`.
    ///
    /// The cap is checked only after a full page, so up to one page beyond
    /// `max_items` may be returned.
    pub async fn fetch_all(
        &self,
        path: &str,
        params: &ParamSet,
    ) -> Result<FetchResult<Vec<Item>>, AppError> {
        let mut items = Vec::new();
        let mut metadata = FetchMetadata {
            param_sets: 1,
            ..Default::default()
        };
        let mut window = Window::first(self.page_limit);

        loop {
            let url = self.endpoint.page_url(path, params, window)?;
            let outcome = self.fetcher.fetch(&url).await?;
            outcome.record(&mut metadata);

            let received = outcome.results().len();
            items.extend(outcome.into_results());
            log::debug!(
                "Page at offset {} returned {} items ({} so far)",
                window.offset,
                received,
                items.len()
            );

            // Anything but a full page is the last one.
            if received != self.page_limit as usize {
                break;
            }
            if let Some(cap) = self.max_items {
                if items.len() >= cap {
                    log::debug!("Reached max_items={} for [{}]", cap, params);
                    break;
                }
            }

            if !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            window = window.next();
        }

        Ok(FetchResult {
            data: items,
            metadata,
        })
    }

    /// Pages each parameter set in turn, concatenating the results.
    pub async fn fetch_each(
        &self,
        path: &str,
        sets: &[ParamSet],
    ) -> Result<FetchResult<Vec<Item>>, AppError> {
        let mut items = Vec::new();
        let mut metadata = FetchMetadata::default();

        for params in sets {
            let result = self.fetch_all(path, params).await?;
            items.extend(result.data);
            metadata = metadata.merge(result.metadata);
        }

        Ok(FetchResult {
            data: items,
            metadata,
        })
    }
}
