//! Cache key derivation for outbound requests
//!
//! A request is fingerprinted by its path and its non-empty query parameters
//! sorted by name, so logically identical requests share one cache entry.

use std::collections::BTreeMap;

/// Query parameters of an API request
///
/// Stored sorted by name. Parameters whose value is empty are kept here but
/// skipped by [`QueryParams::non_empty`], both for the cache key and for the
/// request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing any previous value
    pub fn set(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Sets `name` only when `value` is present
    pub fn set_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    /// Iterates parameters with a non-empty value, in name order
    pub fn non_empty(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.set(k, v))
    }
}

/// Builds the cache key for a request: `path?name1=value1&name2=value2`
///
/// Names and values are percent-encoded, so a value containing `&` or `=`
/// cannot produce the key of a different parameter set.
pub fn build_key(path: &str, params: &QueryParams) -> String {
    let query = params
        .non_empty()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", path, query)
}
