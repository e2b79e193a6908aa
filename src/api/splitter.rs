// src/api/splitter.rs
//! Keeps request URLs under the length limit by slicing long value lists.

use crate::constants::{DEFAULT_SLICE_KEYS, REFERENCE_ID_SUFFIX};
use crate::error::AppError;
use crate::types::{ParamSet, Scalar};

/// Which keys may be sliced, and in what order they are tried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicePriority {
    keys: Vec<String>,
    /// Keys ending in this suffix are sliceable after every listed key
    suffix_fallback: Option<String>,
}

impl Default for SlicePriority {
    fn default() -> Self {
        Self::new(DEFAULT_SLICE_KEYS.iter().copied())
            .with_suffix_fallback(Some(REFERENCE_ID_SUFFIX.to_string()))
    }
}

impl SlicePriority {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            suffix_fallback: None,
        }
    }

    pub fn with_suffix_fallback(self, suffix: Option<String>) -> Self {
        Self {
            suffix_fallback: suffix,
            ..self
        }
    }

    /// The first key in `params` that is sliceable and still has more than one value.
    fn pick(&self, params: &ParamSet) -> Option<String> {
        let splittable = |key: &str| params.get(key).is_some_and(|values| values.len() > 1);

        if let Some(key) = self.keys.iter().find(|key| splittable(key.as_str())) {
            return Some(key.clone());
        }

        let suffix = self.suffix_fallback.as_deref()?;
        params
            .keys()
            .find(|key| key.ends_with(suffix) && splittable(key.as_str()))
            .cloned()
    }
}

/// Splits one parameter set into fragments whose URLs fit `url_max_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSplitter {
    url_max_len: usize,
    priority: SlicePriority,
}

impl RequestSplitter {
    pub fn new(url_max_len: usize) -> Self {
        Self {
            url_max_len,
            priority: SlicePriority::default(),
        }
    }

    pub fn with_priority(self, priority: SlicePriority) -> Self {
        Self { priority, ..self }
    }

    /// Splits `params` until `measure` reports every fragment within bounds.
    ///
    /// `measure` returns the longest URL a fragment can produce. Fragments come
    /// back in value order and never share a value of the key that was halved.
    pub fn split<F>(&self, params: ParamSet, measure: F) -> Result<Vec<ParamSet>, AppError>
    where
        F: Fn(&ParamSet) -> Result<usize, AppError>,
    {
        let mut fragments = Vec::new();
        self.split_into(params, &measure, &mut fragments)?;
        if fragments.len() > 1 {
            log::debug!("Split request into {} fragments", fragments.len());
        }
        Ok(fragments)
    }

    fn split_into<F>(
        &self,
        params: ParamSet,
        measure: &F,
        fragments: &mut Vec<ParamSet>,
    ) -> Result<(), AppError>
    where
        F: Fn(&ParamSet) -> Result<usize, AppError>,
    {
        let length = measure(&params)?;
        if length <= self.url_max_len {
            fragments.push(params);
            return Ok(());
        }

        let key = self
            .priority
            .pick(&params)
            .ok_or_else(|| AppError::UrlTooLong {
                length,
                limit: self.url_max_len,
                url: params.encode(),
            })?;

        let values = params.get(&key).map(<[Scalar]>::to_vec).unwrap_or_default();
        let (head, tail) = values.split_at(values.len() / 2);

        self.split_into(params.with_values(&key, head.to_vec()), measure, fragments)?;
        self.split_into(params.with_values(&key, tail.to_vec()), measure, fragments)
    }
}
