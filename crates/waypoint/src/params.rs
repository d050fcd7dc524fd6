//! Captured path parameters and converted route variables.

use std::collections::HashMap;

use serde_json::Value;

/// Variables handed to preconditions and URL generation.
///
/// Values are arbitrary JSON so that a variable can stand for a whole object
/// graph (`article`), addressed by dotted pattern names like `article.id`.
pub type Variables = serde_json::Map<String, Value>;

/// Raw string parameters captured from a path, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    /// Creates new empty path params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parses a parameter as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Converts the parameters into route variables, dropping dotted names.
    ///
    /// Dotted names address fields of a bound object and only make sense once
    /// an extractor has loaded that object.
    pub fn to_variables(&self) -> Variables {
        self.params
            .iter()
            .filter(|(name, _)| !name.contains('.'))
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
