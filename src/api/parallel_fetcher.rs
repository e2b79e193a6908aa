// src/api/parallel_fetcher.rs
//! Parallel fetching: probe every parameter set for its total, plan one
//! window per page, then let a bounded pool of workers fetch the windows.
//!
//! Workers pull from one shared FIFO queue and hand each page back over a
//! channel, so no result collection is ever shared between tasks.

use super::concurrent_queue::run_pool;
use super::endpoint::CatalogEndpoint;
use super::page_fetcher::PageFetcher;
use super::types::{CountedParams, FetchMetadata, FetchResult, Item, Window};
use crate::error::AppError;
use crate::types::ParamSet;
use std::time::Duration;
use url::Url;

/// Learns how many items each parameter set matches with a one-item request.
#[derive(Clone)]
pub struct CountProber {
    fetcher: PageFetcher,
    endpoint: CatalogEndpoint,
}

impl CountProber {
    pub fn new(fetcher: PageFetcher, endpoint: CatalogEndpoint) -> Self {
        Self { fetcher, endpoint }
    }

    /// Probes one set. Rejected filters and exhausted retries count as zero.
    pub async fn probe(
        &self,
        path: &str,
        params: ParamSet,
    ) -> Result<FetchResult<CountedParams>, AppError> {
        let url = self.endpoint.probe_url(path, &params)?;
        let outcome = self.fetcher.fetch(&url).await?;

        let mut metadata = FetchMetadata::default();
        outcome.record(&mut metadata);
        // the probe item itself is not part of the result
        metadata.items_received = 0;

        let count = outcome.count();
        log::debug!("Probe [{}] reports {} items", params, count);
        Ok(FetchResult {
            data: CountedParams { count, params },
            metadata,
        })
    }

    /// Probes every set on the worker pool. Results keep the input order.
    pub async fn probe_all(
        &self,
        path: &str,
        sets: Vec<ParamSet>,
        workers: usize,
        start_interval: Duration,
    ) -> Result<FetchResult<Vec<CountedParams>>, AppError> {
        let prober = self.clone();
        let path = path.to_string();
        let jobs: Vec<(usize, ParamSet)> = sets.into_iter().enumerate().collect();

        let mut probed = run_pool(jobs, workers, start_interval, move |(idx, params)| {
            let prober = prober.clone();
            let path = path.clone();
            async move { Ok((idx, prober.probe(&path, params).await?)) }
        })
        .await?;
        probed.sort_by_key(|(idx, _)| *idx);

        let mut counted = Vec::with_capacity(probed.len());
        let mut metadata = FetchMetadata::default();
        for (_, result) in probed {
            counted.push(result.data);
            metadata = metadata.merge(result.metadata);
        }

        Ok(FetchResult {
            data: counted,
            metadata,
        })
    }
}

/// Fetches every page of a set of probed parameter sets on a worker pool.
#[derive(Clone)]
pub struct ParallelCoordinator {
    fetcher: PageFetcher,
    endpoint: CatalogEndpoint,
    page_limit: u32,
    thread_count: usize,
    interval: Duration,
}

impl ParallelCoordinator {
    pub fn new(
        fetcher: PageFetcher,
        endpoint: CatalogEndpoint,
        page_limit: u32,
        thread_count: usize,
    ) -> Self {
        Self {
            fetcher,
            endpoint,
            page_limit: page_limit.max(1),
            thread_count: thread_count.max(1),
            interval: Duration::ZERO,
        }
    }

    /// Pause before starting each worker.
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// One window per page of a set with `count` items; none for an empty set.
    pub fn windows(count: u64, page_limit: u32) -> Vec<Window> {
        let pages = count.div_ceil(page_limit as u64);
        std::iter::successors(Some(Window::first(page_limit)), |w| Some(w.next()))
            .take(pages as usize)
            .collect()
    }

    /// Page URLs for every probed set, in set order.
    pub fn plan(&self, path: &str, counted: &[CountedParams]) -> Result<Vec<Url>, AppError> {
        let mut urls = Vec::new();
        for entry in counted {
            for window in Self::windows(entry.count, self.page_limit) {
                urls.push(self.endpoint.page_url(path, &entry.params, window)?);
            }
        }
        Ok(urls)
    }

    /// Fetches every planned window exactly once.
    ///
    /// Items come back in completion order; sort them before use.
    pub async fn fetch(
        &self,
        path: &str,
        counted: &[CountedParams],
    ) -> Result<FetchResult<Vec<Item>>, AppError> {
        let urls = self.plan(path, counted)?;
        log::info!(
            "Fetching {} pages with {} workers",
            urls.len(),
            self.thread_count.min(urls.len())
        );

        let fetcher = self.fetcher.clone();
        let pages = run_pool(urls, self.thread_count, self.interval, move |url: Url| {
            let fetcher = fetcher.clone();
            async move {
                let outcome = fetcher.fetch(&url).await?;
                let mut metadata = FetchMetadata::default();
                outcome.record(&mut metadata);
                Ok((outcome.into_results(), metadata))
            }
        })
        .await?;

        let mut items = Vec::new();
        let mut metadata = FetchMetadata::default();
        for (page, page_metadata) in pages {
            items.extend(page);
            metadata = metadata.merge(page_metadata);
        }

        Ok(FetchResult {
            data: items,
            metadata,
        })
    }
}
