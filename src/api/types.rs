// src/api/types.rs
//! Type definitions for the catalog API module.

use crate::types::ParamSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- API Response Types ---

/// The list endpoint's response envelope.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PageEnvelope {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<Item>,
}

/// One catalog record. Only `id` is interpreted; every other field rides along.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Item {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter, mostly for fixtures.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns a field's value, `id` included.
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == "id" {
            Some(Value::from(self.id))
        } else {
            self.fields.get(name).cloned()
        }
    }
}

// --- Request Types ---

/// The page slice a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u64,
}

impl Window {
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    /// The window immediately after this one.
    pub fn next(self) -> Self {
        Self {
            offset: self.offset + self.limit as u64,
            ..self
        }
    }
}

/// A parameter set together with the total the catalog reported for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CountedParams {
    pub count: u64,
    pub params: ParamSet,
}

// --- Fetch Result Types ---

/// Result of a fetch operation with metadata.
#[derive(Debug, Clone)]
pub struct FetchResult<T> {
    /// The fetched data
    pub data: T,
    /// What it took to fetch it
    pub metadata: FetchMetadata,
}

/// Counters describing how a fetch went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchMetadata {
    /// Page requests issued, probes included
    pub requests: u32,
    /// Parameter sets left after normalization and splitting
    pub param_sets: usize,
    /// Pages the catalog answered with 400 and that counted as empty
    pub filters_rejected: u32,
    /// Pages whose every attempt timed out and that counted as empty
    pub retries_exhausted: u32,
    /// Items received before deduplication
    pub items_received: usize,
}

impl FetchMetadata {
    /// Combines two metadata instances.
    pub fn merge(self, other: Self) -> Self {
        Self {
            requests: self.requests + other.requests,
            param_sets: self.param_sets + other.param_sets,
            filters_rejected: self.filters_rejected + other.filters_rejected,
            retries_exhausted: self.retries_exhausted + other.retries_exhausted,
            items_received: self.items_received + other.items_received,
        }
    }

    /// Whether any slice was silently replaced by an empty page.
    pub fn is_degraded(&self) -> bool {
        self.filters_rejected > 0 || self.retries_exhausted > 0
    }
}
