// src/types/params.rs
//! Filter values and parameter sets: the vocabulary of one list request.
//!
//! `Filters` is what a caller hands in: keys bound to a single value or a list.
//! `ParamSet` is what goes on the wire: every key bound to a deduplicated,
//! ordered list of scalars, ready to be form-encoded.

use super::ValidationError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

/// A single filter value as it appears in a query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Interprets a command-line token as an integer only when it is written
    /// canonically; `007` or `+42` stay text so they go out exactly as typed.
    pub fn parse_token(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(n) if n.to_string() == token => Scalar::Int(n),
            _ => Scalar::Text(token.to_string()),
        }
    }

    /// Whether this scalar equals a field value taken from a returned item.
    ///
    /// Text compares against the JSON rendering of numbers and booleans, so a
    /// name given as `"65001"` still matches an integer `asn` field.
    pub fn matches_json(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;

        match (self, value) {
            (Scalar::Int(a), Value::Number(n)) => n.as_i64() == Some(*a),
            (Scalar::Bool(a), Value::Bool(b)) => a == b,
            (Scalar::Text(a), Value::String(b)) => a == b,
            (Scalar::Text(a), Value::Number(n)) => *a == n.to_string(),
            (Scalar::Text(a), Value::Bool(b)) => *a == b.to_string(),
            (Scalar::Int(a), Value::String(b)) => a.to_string() == *b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// A filter bound to one value or to a list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl FilterValue {
    /// Flattens the value into a list, one element for a single value.
    pub fn into_values(self) -> Vec<Scalar> {
        match self {
            FilterValue::One(value) => vec![value],
            FilterValue::Many(values) => values,
        }
    }
}

macro_rules! single_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::One(value.into())
                }
            }
        )*
    };
}

single_filter_value!(Scalar, i64, i32, bool, &str, String);

impl<T: Into<Scalar>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        FilterValue::Many(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for FilterValue {
    fn from(values: [T; N]) -> Self {
        FilterValue::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Raw caller filters, in the order they were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(IndexMap<String, FilterValue>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated key replaces the earlier value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.0.iter()
    }

    /// Parses a `key=value[,value...]` command-line argument and adds it.
    ///
    /// Repeating a key across arguments extends its value list.
    pub fn push_argument(&mut self, argument: &str) -> Result<(), ValidationError> {
        let (key, raw_values) =
            argument
                .split_once('=')
                .ok_or_else(|| ValidationError::InvalidFilter {
                    input: argument.to_string(),
                    reason: "expected key=value".to_string(),
                })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ValidationError::InvalidFilter {
                input: argument.to_string(),
                reason: "filter key cannot be empty".to_string(),
            });
        }

        let mut values: Vec<Scalar> = raw_values.split(',').map(Scalar::parse_token).collect();
        match self.0.shift_remove(key) {
            Some(existing) => {
                let mut merged = existing.into_values();
                merged.append(&mut values);
                self.0.insert(key.to_string(), FilterValue::Many(merged));
            }
            None if values.len() == 1 => {
                self.0
                    .insert(key.to_string(), FilterValue::One(values.remove(0)));
            }
            None => {
                self.0.insert(key.to_string(), FilterValue::Many(values));
            }
        }
        Ok(())
    }
}

impl IntoIterator for Filters {
    type Item = (String, FilterValue);
    type IntoIter = indexmap::map::IntoIter<String, FilterValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<ParamSet> for Filters {
    fn from(params: ParamSet) -> Self {
        Self(
            params
                .params
                .into_iter()
                .map(|(k, v)| (k, FilterValue::Many(v)))
                .collect(),
        )
    }
}

/// The full set of filters carried by exactly one request.
///
/// Key order is preserved so that encoding, and therefore URL-length
/// slicing, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParamSet {
    params: IndexMap<String, Vec<Scalar>>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to `values`, keeping the key's position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<Scalar>) {
        self.params.insert(key.into(), values);
    }

    pub fn get(&self, key: &str) -> Option<&[Scalar]> {
        self.params.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Scalar>> {
        self.params.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.params.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Scalar>)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns a copy with `key` rebound to `values`, other keys untouched.
    pub fn with_values(&self, key: &str, values: Vec<Scalar>) -> Self {
        let mut copy = self.clone();
        copy.params.insert(key.to_string(), values);
        copy
    }

    /// Prepends every default whose key is absent from this set.
    pub fn merge_defaults(self, defaults: &ParamSet) -> Self {
        let mut merged: IndexMap<String, Vec<Scalar>> = defaults
            .params
            .iter()
            .filter(|(key, _)| !self.params.contains_key(*key))
            .map(|(key, values)| (key.clone(), values.clone()))
            .collect();
        merged.extend(self.params);
        Self { params: merged }
    }

    /// Writes every key/value pair, one pair per value, into a form serializer.
    pub fn append_to<T: form_urlencoded::Target>(
        &self,
        serializer: &mut form_urlencoded::Serializer<'_, T>,
    ) {
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, &value.to_string());
            }
        }
    }

    /// Form-encodes the set exactly as it would appear in a query string.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        self.append_to(&mut serializer);
        serializer.finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<Scalar>)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (K, Vec<Scalar>)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}
