//! Cache key composition

use std::fmt;

use crate::data::Params;

/// Identifies one logical content request
///
/// Built from the endpoint and its parameters. Parameters are serialized in
/// sorted key order, so equal parameter sets always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(endpoint: &str, params: &Params) -> Self {
        // A map of strings to primitives always serializes.
        let params = serde_json::to_string(params).unwrap_or_else(|_| "{}".to_string());
        Self(format!("{}:{}", endpoint, params))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
