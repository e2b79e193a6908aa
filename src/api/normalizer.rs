// src/api/normalizer.rs
//! Turns caller filters into the parameter sets that will be requested.
//!
//! Normalization runs in four steps:
//! 1. engine-owned keys (`limit`, `offset`) are dropped,
//! 2. name-valued references are resolved to ids,
//! 3. value lists are deduplicated in stable order,
//! 4. parallel keys are expanded into a cartesian product of single values.

use super::ReferenceResolver;
use crate::constants::{DEFAULT_PARALLEL_KEYS, LIMIT_KEY, OFFSET_KEY, REFERENCE_ID_SUFFIX};
use crate::error::AppError;
use crate::types::{Filters, ParamSet, Scalar};
use std::collections::HashSet;

/// Shapes raw filters into request-ready parameter sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamNormalizer {
    parallel_keys: Vec<String>,
}

impl Default for ParamNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_KEYS.iter().copied())
    }
}

impl ParamNormalizer {
    /// Creates a normalizer that sends each value of `parallel_keys` on its own.
    pub fn new<I, S>(parallel_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parallel_keys: parallel_keys.into_iter().map(Into::into).collect(),
        }
    }

    fn is_parallel(&self, key: &str) -> bool {
        self.parallel_keys.iter().any(|k| k == key)
    }

    /// Normalizes `filters` into one or more parameter sets.
    ///
    /// Empty filters yield a single empty set, so the caller still fetches
    /// the whole collection once.
    pub async fn normalize(
        &self,
        filters: Filters,
        resolver: &dyn ReferenceResolver,
    ) -> Result<Vec<ParamSet>, AppError> {
        let params = strip_reserved(filters);
        let params = resolve_references(params, resolver).await?;
        let params = dedupe(params);
        Ok(self.expand(params))
    }

    /// Expands every multi-valued parallel key, keeping the input key order.
    pub fn expand(&self, params: ParamSet) -> Vec<ParamSet> {
        let mut combinations = vec![ParamSet::new()];

        for (key, values) in params.iter() {
            if self.is_parallel(key) && values.len() > 1 {
                combinations = combinations
                    .iter()
                    .flat_map(|combination| {
                        values
                            .iter()
                            .map(move |value| combination.with_values(key, vec![value.clone()]))
                    })
                    .collect();
            } else {
                for combination in &mut combinations {
                    combination.insert(key.clone(), values.clone());
                }
            }
        }

        combinations
    }
}

/// Flattens filters into a parameter set, dropping keys the engine owns.
pub(crate) fn strip_reserved(filters: Filters) -> ParamSet {
    filters
        .into_iter()
        .filter(|(key, _)| {
            let reserved = key == LIMIT_KEY || key == OFFSET_KEY;
            if reserved {
                log::warn!("Ignoring caller-supplied {:?} filter, paging is engine-owned", key);
            }
            !reserved
        })
        .map(|(key, value)| (key, value.into_values()))
        .collect()
}

/// Replaces each resolvable key with `<key>_id` bound to the matched ids.
///
/// A key whose values match nothing is left as given.
async fn resolve_references(
    mut params: ParamSet,
    resolver: &dyn ReferenceResolver,
) -> Result<ParamSet, AppError> {
    let keys: Vec<String> = params
        .keys()
        .filter(|key| resolver.resolves(key))
        .cloned()
        .collect();

    for key in keys {
        let values = params.get(&key).map(<[Scalar]>::to_vec).unwrap_or_default();
        if values.is_empty() {
            continue;
        }

        let ids = resolver.resolve(&key, &values).await?;
        if ids.is_empty() {
            log::warn!("No {} matched {:?}, sending the filter unresolved", key, values);
            continue;
        }

        log::debug!("Resolved {} {:?} to ids {:?}", key, values, ids);
        params.remove(&key);
        let id_key = format!("{}{}", key, REFERENCE_ID_SUFFIX);
        let mut merged = params.remove(&id_key).unwrap_or_default();
        merged.extend(ids.into_iter().map(Scalar::Int));
        params.insert(id_key, merged);
    }

    Ok(params)
}

/// Removes repeated values per key and keys left with no values.
fn dedupe(params: ParamSet) -> ParamSet {
    params
        .iter()
        .filter_map(|(key, values)| {
            let mut seen = HashSet::new();
            let unique: Vec<Scalar> = values
                .iter()
                .filter(|value| seen.insert(*value))
                .cloned()
                .collect();
            (!unique.is_empty()).then(|| (key.clone(), unique))
        })
        .collect()
}
