// src/api/endpoint.rs
//! URL construction for list requests.

use super::types::Window;
use crate::config::ConnectionConfig;
use crate::constants::{LIMIT_KEY, OFFSET_KEY, PROBE_PARAMS};
use crate::error::AppError;
use crate::types::ParamSet;
use url::Url;

/// The catalog's API root, e.g. `https://netbox.local/api/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoint {
    base: Url,
}

impl CatalogEndpoint {
    /// Wraps a base URL, adding the trailing slash `Url::join` needs.
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    pub fn from_connection(connection: &ConnectionConfig) -> Result<Self, AppError> {
        Ok(Self::new(connection.base_url()?))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The collection URL without a query string.
    pub fn collection(&self, path: &str) -> Result<Url, AppError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// URL for one page of `params`.
    pub fn page_url(&self, path: &str, params: &ParamSet, window: Window) -> Result<Url, AppError> {
        let mut url = self.collection(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            params.append_to(&mut pairs);
            pairs.append_pair(LIMIT_KEY, &window.limit.to_string());
            pairs.append_pair(OFFSET_KEY, &window.offset.to_string());
        }
        Ok(url)
    }

    /// URL for a count probe: a single brief item, no offset.
    pub fn probe_url(&self, path: &str, params: &ParamSet) -> Result<Url, AppError> {
        let mut url = self.collection(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            params.append_to(&mut pairs);
            for (key, value) in PROBE_PARAMS {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(LIMIT_KEY, "1");
        }
        Ok(url)
    }

    /// Longest URL any page of `params` can produce, measured with the widest offset.
    pub fn worst_case_len(
        &self,
        path: &str,
        params: &ParamSet,
        page_limit: u32,
    ) -> Result<usize, AppError> {
        let window = Window {
            limit: page_limit,
            offset: u64::MAX,
        };
        Ok(self.page_url(path, params, window)?.as_str().len())
    }
}
