//! Ordered query-string builder.
//!
//! Azure DevOps query keys carry `$` prefixes and dotted names
//! (`$top`, `searchCriteria.status`), so parameters are kept as plain ordered
//! pairs and encoded by the transport.

/// Ordered list of query parameters for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter unconditionally.
    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a parameter when a value is present.
    pub fn opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Append a string parameter when it is present and non-empty.
    pub fn text(self, key: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Append a boolean as the lowercase `true` / `false` the service expects.
    pub fn flag(self, key: &str, value: Option<bool>) -> Self {
        self.opt(key, value)
    }

    /// Replace an existing parameter or append it.
    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs prefixed with `api-version`, the order used on the wire.
    pub fn with_api_version(&self, api_version: &str) -> Vec<(String, String)> {
        std::iter::once(("api-version".to_string(), api_version.to_string()))
            .chain(self.pairs.iter().cloned())
            .collect()
    }
}
