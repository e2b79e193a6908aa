// src/api/fetcher.rs
//! The engine entry point: filters in, sorted unique items out.
//!
//! A fetch runs the same pipeline every time:
//! normalize → merge defaults → split → (page sequentially | probe and fan out) → aggregate.
//! The strategy is chosen by `thread_count`; both produce the same item set.

use super::aggregator::aggregate;
use super::client::CatalogHttpClient;
use super::endpoint::CatalogEndpoint;
use super::normalizer::{strip_reserved, ParamNormalizer};
use super::page_fetcher::PageFetcher;
use super::pagination::SequentialPager;
use super::parallel_fetcher::{CountProber, ParallelCoordinator};
use super::references::{CollectionResolver, ReferenceMap};
use super::splitter::{RequestSplitter, SlicePriority};
use super::types::{FetchMetadata, FetchResult, Item};
use super::Transport;
use crate::config::{CatalogConfig, FetchConfig, RetryPolicy};
use crate::error::AppError;
use crate::types::{Filters, ParamSet};
use std::sync::Arc;

/// Enumerates one catalog collection.
#[derive(Clone)]
pub struct CatalogFetcher {
    fetcher: PageFetcher,
    endpoint: CatalogEndpoint,
    path: String,
    config: FetchConfig,
    normalizer: ParamNormalizer,
    splitter: RequestSplitter,
    references: ReferenceMap,
    defaults: ParamSet,
}

impl CatalogFetcher {
    /// Creates a fetcher for the collection at `path` below the endpoint.
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: CatalogEndpoint,
        path: impl Into<String>,
        config: FetchConfig,
        retry: RetryPolicy,
    ) -> Self {
        let config = config.normalized();
        Self {
            fetcher: PageFetcher::new(transport, retry),
            endpoint,
            path: path.into().trim_start_matches('/').to_string(),
            splitter: RequestSplitter::new(config.url_max_len),
            config,
            normalizer: ParamNormalizer::default(),
            references: ReferenceMap::new(),
            defaults: ParamSet::new(),
        }
    }

    /// Creates a fetcher talking HTTP to the configured catalog.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, AppError> {
        let client = CatalogHttpClient::new(&config.connection, &config.retry)?;
        let endpoint = CatalogEndpoint::from_connection(&config.connection)?;
        Ok(Self::new(
            Arc::new(client),
            endpoint,
            config.path.clone(),
            config.fetch.clone(),
            config.retry,
        )
        .with_references(config.references.clone()))
    }

    pub fn with_references(self, references: ReferenceMap) -> Self {
        Self { references, ..self }
    }

    /// Filters merged into every request that does not set the key itself.
    pub fn with_default_filters(self, defaults: Filters) -> Self {
        Self {
            defaults: strip_reserved(defaults),
            ..self
        }
    }

    pub fn with_parallel_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            normalizer: ParamNormalizer::new(keys),
            ..self
        }
    }

    pub fn with_slice_priority(self, priority: SlicePriority) -> Self {
        Self {
            splitter: self.splitter.clone().with_priority(priority),
            ..self
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn pager(&self) -> SequentialPager {
        SequentialPager::new(
            self.fetcher.clone(),
            self.endpoint.clone(),
            self.config.page_limit,
        )
        .with_interval(self.config.interval)
        .with_max_items(self.config.max_items)
    }

    /// Fetches every item matching `filters`, with a report of what it took.
    pub async fn fetch(&self, filters: Filters) -> Result<FetchResult<Vec<Item>>, AppError> {
        let (sets, lookups) = self.prepare(filters).await?;
        let param_sets = sets.len();

        let fetched = if self.config.is_parallel() {
            self.fetch_parallel(sets).await?
        } else {
            log::info!(
                "Fetching {} in a loop over {} parameter sets",
                self.path,
                param_sets
            );
            self.pager().fetch_each(&self.path, &sets).await?
        };

        let items = aggregate(fetched.data);
        let metadata = FetchMetadata {
            param_sets,
            ..lookups.merge(fetched.metadata)
        };

        log::info!(
            "Fetched {} unique items from {} ({} received, {} requests)",
            items.len(),
            self.path,
            metadata.items_received,
            metadata.requests
        );
        if metadata.is_degraded() {
            log::warn!(
                "{} pages were replaced by empty ones ({} rejected filters, {} exhausted retries)",
                metadata.filters_rejected + metadata.retries_exhausted,
                metadata.filters_rejected,
                metadata.retries_exhausted
            );
        }

        Ok(FetchResult {
            data: items,
            metadata,
        })
    }

    /// Fetches every item matching `filters`.
    pub async fn get(&self, filters: Filters) -> Result<Vec<Item>, AppError> {
        Ok(self.fetch(filters).await?.data)
    }

    /// Pages through any collection with `filters` passed through unchanged.
    ///
    /// No reference resolution, expansion or splitting happens; the item cap
    /// applies. Results are in catalog order.
    pub async fn query(&self, path: &str, filters: Filters) -> Result<Vec<Item>, AppError> {
        let params = strip_reserved(filters);
        let result = self
            .pager()
            .fetch_all(path.trim_start_matches('/'), &params)
            .await?;
        Ok(result.data)
    }

    /// Total number of items the catalog reports for `filters`.
    ///
    /// Counts of parameter sets are summed, so items matched by more than one
    /// set are counted once per set.
    pub async fn count(&self, filters: Filters) -> Result<u64, AppError> {
        let (sets, _) = self.prepare(filters).await?;
        let prober = CountProber::new(self.fetcher.clone(), self.endpoint.clone());
        let probed = prober
            .probe_all(
                &self.path,
                sets,
                self.config.thread_count,
                self.config.interval,
            )
            .await?;
        Ok(probed.data.iter().map(|counted| counted.count).sum())
    }

    /// Normalizes, applies defaults and splits; returns the sets to fetch.
    async fn prepare(&self, filters: Filters) -> Result<(Vec<ParamSet>, FetchMetadata), AppError> {
        let pager = self.pager();
        let resolver = CollectionResolver::new(&self.references, &pager);
        let sets = self.normalizer.normalize(filters, &resolver).await?;

        let mut prepared = Vec::with_capacity(sets.len());
        for params in sets {
            let params = params.merge_defaults(&self.defaults);
            prepared.extend(self.splitter.split(params, |fragment| {
                self.endpoint
                    .worst_case_len(&self.path, fragment, self.config.page_limit)
            })?);
        }

        Ok((prepared, resolver.metadata()))
    }

    async fn fetch_parallel(&self, sets: Vec<ParamSet>) -> Result<FetchResult<Vec<Item>>, AppError> {
        log::info!(
            "Fetching {} with {} workers over {} parameter sets",
            self.path,
            self.config.thread_count,
            sets.len()
        );
        if let Some(cap) = self.config.max_items {
            log::debug!("max_items={} is not applied when fetching in parallel", cap);
        }

        let probed = CountProber::new(self.fetcher.clone(), self.endpoint.clone())
            .probe_all(
                &self.path,
                sets,
                self.config.thread_count,
                self.config.interval,
            )
            .await?;

        let fetched = ParallelCoordinator::new(
            self.fetcher.clone(),
            self.endpoint.clone(),
            self.config.page_limit,
            self.config.thread_count,
        )
        .with_interval(self.config.interval)
        .fetch(&self.path, &probed.data)
        .await?;

        Ok(FetchResult {
            data: fetched.data,
            metadata: probed.metadata.merge(fetched.metadata),
        })
    }
}
