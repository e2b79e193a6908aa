// src/api/references.rs
//! Name-to-id resolution for filters that reference other collections.
//!
//! Some list filters only accept ids (`site_id=7`) while callers think in
//! names (`site=hq`). A [`ReferenceMap`] says where each such key's objects
//! live; [`CollectionResolver`] downloads those collections and matches the
//! given names against one field.

use super::pagination::SequentialPager;
use super::types::{FetchMetadata, Item};
use super::ReferenceResolver;
use crate::error::AppError;
use crate::types::{ParamSet, Scalar, ValidationError};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a reference key's objects live and which field holds their name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTarget {
    pub path: String,
    pub match_field: String,
}

/// Reference keys and their targets, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceMap(IndexMap<String, ReferenceTarget>);

impl ReferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(
        mut self,
        key: impl Into<String>,
        path: impl Into<String>,
        match_field: impl Into<String>,
    ) -> Self {
        self.insert(key, path, match_field);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        path: impl Into<String>,
        match_field: impl Into<String>,
    ) {
        self.0.insert(
            key.into(),
            ReferenceTarget {
                path: path.into(),
                match_field: match_field.into(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&ReferenceTarget> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Parses a `key=path:field` command-line argument and adds it.
    pub fn push_argument(&mut self, argument: &str) -> Result<(), ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidReference {
            input: argument.to_string(),
            reason: reason.to_string(),
        };

        let (key, target) = argument
            .split_once('=')
            .ok_or_else(|| invalid("expected key=path:field"))?;
        let (path, field) = target
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected path:field after '='"))?;

        let (key, path, field) = (key.trim(), path.trim(), field.trim());
        if key.is_empty() || path.is_empty() || field.is_empty() {
            return Err(invalid("key, path and field must all be non-empty"));
        }

        self.insert(key, path.trim_start_matches('/'), field);
        Ok(())
    }
}

/// Resolves references by fetching the referenced collection in full.
///
/// Each collection is downloaded at most once per resolver; create one
/// resolver per fetch so lookups never outlive the call.
pub struct CollectionResolver<'a> {
    map: &'a ReferenceMap,
    pager: SequentialPager,
    cache: Mutex<HashMap<String, Arc<Vec<Item>>>>,
    metadata: Mutex<FetchMetadata>,
}

impl<'a> CollectionResolver<'a> {
    /// Uses `pager`'s connection and page size, without its item cap.
    pub fn new(map: &'a ReferenceMap, pager: &SequentialPager) -> Self {
        Self {
            map,
            pager: pager.unbounded(),
            cache: Mutex::new(HashMap::new()),
            metadata: Mutex::new(FetchMetadata::default()),
        }
    }

    /// Requests spent on lookups so far.
    pub fn metadata(&self) -> FetchMetadata {
        self.metadata.lock().clone()
    }

    async fn collection(&self, path: &str) -> Result<Arc<Vec<Item>>, AppError> {
        let cached = self.cache.lock().get(path).cloned();
        if let Some(items) = cached {
            return Ok(items);
        }

        log::debug!("Loading reference collection {}", path);
        let result = self.pager.fetch_all(path, &ParamSet::new()).await?;

        {
            let mut metadata = self.metadata.lock();
            *metadata = metadata.clone().merge(FetchMetadata {
                param_sets: 0,
                ..result.metadata
            });
        }

        let items = Arc::new(result.data);
        self.cache
            .lock()
            .insert(path.to_string(), Arc::clone(&items));
        Ok(items)
    }
}

#[async_trait::async_trait]
impl<'a> ReferenceResolver for CollectionResolver<'a> {
    fn resolves(&self, key: &str) -> bool {
        self.map.get(key).is_some()
    }

    async fn resolve(&self, key: &str, values: &[Scalar]) -> Result<Vec<i64>, AppError> {
        let Some(target) = self.map.get(key) else {
            return Ok(Vec::new());
        };

        let items = self.collection(&target.path).await?;
        Ok(items
            .iter()
            .filter(|item| {
                item.field(&target.match_field)
                    .is_some_and(|field| values.iter().any(|value| value.matches_json(&field)))
            })
            .map(|item| item.id)
            .collect())
    }
}
