// src/api/test_support.rs
//! An in-memory catalog for unit tests.
//!
//! `FakeCatalog` implements [`Transport`] by answering list requests from a
//! fixed item list: query keys filter, `limit`/`offset` page, and the response
//! is the usual `{count, results}` envelope. Failures can be scripted per
//! request or for every request.

use super::types::Item;
use super::{RawResponse, Transport, TransportError};
use crate::constants::{LIMIT_KEY, OFFSET_KEY, PROBE_PARAMS};
use crate::types::Scalar;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use url::Url;

/// A canned failure returned instead of serving a page.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Timeout,
    Refused,
    Status(u16, &'static str),
}

#[derive(Clone)]
pub(crate) struct FakeCatalog {
    items: Arc<Vec<Item>>,
    script: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Option<Scripted>,
    rejected: Arc<Vec<(String, String)>>,
    requests: Arc<Mutex<Vec<Url>>>,
}

impl FakeCatalog {
    pub(crate) fn new(items: Vec<Item>) -> Self {
        Self {
            items: Arc::new(items),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: None,
            rejected: Arc::new(Vec::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Items named `item-<id>`, stored in the given order.
    pub(crate) fn with_ids(ids: &[i64]) -> Self {
        Self::new(
            ids.iter()
                .map(|&id| Item::new(id).with_field("name", format!("item-{}", id)))
                .collect(),
        )
    }

    /// Answers the next requests with these failures, in order, then serves normally.
    pub(crate) fn scripted(self, script: Vec<Scripted>) -> Self {
        *self.script.lock() = script.into();
        self
    }

    /// Answers every request with this failure.
    pub(crate) fn failing_with(self, failure: Scripted) -> Self {
        Self {
            fallback: Some(failure),
            ..self
        }
    }

    /// Answers 400 whenever `key=value` appears in the query.
    pub(crate) fn rejecting(self, key: &str, value: &str) -> Self {
        let mut rejected = (*self.rejected).clone();
        rejected.push((key.to_string(), value.to_string()));
        Self {
            rejected: Arc::new(rejected),
            ..self
        }
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    pub(crate) fn requests(&self) -> Vec<Url> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests carrying the probe marker.
    pub(crate) fn probe_count(&self) -> usize {
        self.requests().iter().filter(|url| is_probe(url)).count()
    }

    /// Requests that were not probes.
    pub(crate) fn page_count(&self) -> usize {
        self.request_count() - self.probe_count()
    }

    fn serve(&self, url: &Url) -> RawResponse {
        let mut limit = usize::MAX;
        let mut offset = 0usize;
        let mut filters: IndexMap<String, Vec<String>> = IndexMap::new();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                LIMIT_KEY => limit = value.parse().unwrap_or(usize::MAX),
                OFFSET_KEY => offset = value.parse().unwrap_or(0),
                other if PROBE_PARAMS.iter().any(|(probe, _)| *probe == other) => {}
                other => filters
                    .entry(other.to_string())
                    .or_default()
                    .push(value.into_owned()),
            }
        }

        for (key, value) in self.rejected.iter() {
            if filters.get(key).is_some_and(|values| values.contains(value)) {
                let message = format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    value
                );
                let mut body = serde_json::Map::new();
                body.insert(key.clone(), json!([message]));
                return response(url, 400, Value::Object(body).to_string());
            }
        }

        let matched: Vec<&Item> = self
            .items
            .iter()
            .filter(|item| {
                filters
                    .iter()
                    .all(|(key, values)| values.iter().any(|value| matches(item, key, value)))
            })
            .collect();

        let page: Vec<&Item> = matched.iter().skip(offset).take(limit).copied().collect();
        let body = json!({ "count": matched.len(), "results": page });
        response(url, 200, body.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for FakeCatalog {
    async fn get(&self, url: &Url) -> Result<RawResponse, TransportError> {
        self.requests.lock().push(url.clone());

        let scripted = self.script.lock().pop_front();
        match scripted.or_else(|| self.fallback.clone()) {
            Some(Scripted::Timeout) => Err(TransportError::Timeout(format!("timed out: {}", url))),
            Some(Scripted::Refused) => Err(TransportError::Connection(format!(
                "connection refused: {}",
                url
            ))),
            Some(Scripted::Status(status, body)) => Ok(response(url, status, body.to_string())),
            None => Ok(self.serve(url)),
        }
    }
}

fn is_probe(url: &Url) -> bool {
    url.query_pairs()
        .any(|(key, _)| PROBE_PARAMS.iter().any(|(probe, _)| *probe == key))
}

fn response(url: &Url, status: u16, body: String) -> RawResponse {
    RawResponse {
        status,
        body,
        url: url.to_string(),
    }
}

/// `q` is a substring search over text fields; anything else compares the field.
fn matches(item: &Item, key: &str, value: &str) -> bool {
    if key == "q" {
        return item
            .fields
            .values()
            .any(|field| field.as_str().is_some_and(|text| text.contains(value)));
    }

    let wanted = Scalar::parse_token(value);
    match item.field(key) {
        Some(Value::Array(elements)) => elements.iter().any(|e| wanted.matches_json(e)),
        Some(field) => wanted.matches_json(&field),
        None => false,
    }
}
