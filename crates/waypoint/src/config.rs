//! Router configuration and JSON route manifests.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::route_set::RouteSet;

/// Settings carried from a route set into its compiled table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Base used for absolute URLs, e.g. `https://example.com/app`.
    pub url_base: Option<String>,
    /// Build absolute URLs unless a call asks for a relative one.
    pub absolute_urls: bool,
    /// Log every dispatch candidate at debug level instead of trace.
    pub debug: bool,
}

/// One route name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single route name.
    One(String),
    /// Several route names.
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl OneOrMany {
    /// Returns the names as a slice-backed iterator.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            Self::One(name) => std::slice::from_ref(name),
            Self::Many(names) => names,
        };
        names.iter().map(String::as_str)
    }
}

/// A route as written in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// Unique route name.
    pub name: String,
    /// Pattern text.
    pub pattern: String,
    /// Handler identifier; defaults to the route name.
    #[serde(default)]
    pub handler: Option<String>,
    /// Routes this one must be tried before.
    #[serde(default)]
    pub before: OneOrMany,
    /// Routes this one must be tried after.
    #[serde(default)]
    pub after: OneOrMany,
}

/// A router configuration plus its routes, in registration order.
///
/// ```json
/// {
///     "router": { "url_base": "https://example.com" },
///     "routes": [
///         { "name": "home", "pattern": "/" },
///         { "name": "user", "pattern": "/users/{id>\\d+}", "before": "home" }
///     ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    /// Router settings.
    #[serde(default)]
    pub router: RouterConfig,
    /// Route definitions.
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
}

impl RouteManifest {
    /// Parses a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a manifest from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Registers every definition; handlers are the handler identifiers.
    pub fn into_route_set(self) -> Result<RouteSet<String>> {
        let mut routes = RouteSet::new().with_config(self.router);
        for definition in self.routes {
            let handler = definition
                .handler
                .unwrap_or_else(|| definition.name.clone());
            let route = routes.register(definition.name, &definition.pattern, handler)?;
            for other in definition.before.iter() {
                route.add_before(other);
            }
            for other in definition.after.iter() {
                route.add_after(other);
            }
        }
        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RouterError;

    #[test]
    fn test_defaults() {
        let config: RouterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RouterConfig::default());
        assert!(!config.absolute_urls);
    }

    #[test]
    fn test_one_or_many() {
        let manifest = RouteManifest::from_json(
            r#"{"routes": [
                {"name": "a", "pattern": "/a", "before": "b"},
                {"name": "b", "pattern": "/b", "after": ["c", "d"]},
                {"name": "c", "pattern": "/c"}
            ]}"#,
        )
        .unwrap();
        let before: Vec<_> = manifest.routes[0].before.iter().collect();
        let after: Vec<_> = manifest.routes[1].after.iter().collect();
        assert_eq!(before, ["b"]);
        assert_eq!(after, ["c", "d"]);
        assert_eq!(manifest.routes[2].before.iter().count(), 0);
    }

    #[test]
    fn test_into_route_set() {
        let manifest = RouteManifest::from_json(
            r#"{
                "router": {"url_base": "https://example.com"},
                "routes": [
                    {"name": "home", "pattern": ""},
                    {"name": "user", "pattern": "/users/{id}", "handler": "users.show", "after": "home"}
                ]
            }"#,
        )
        .unwrap();
        let routes = manifest.into_route_set().unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes.route("home").unwrap().handler, "home");
        let user = routes.route("user").unwrap();
        assert_eq!(user.handler, "users.show");
        assert_eq!(user.after, ["home"]);

        let table = routes.compile().unwrap();
        assert_eq!(table.names().collect::<Vec<_>>(), ["home", "user"]);
        assert_eq!(
            table.config().url_base.as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            RouteManifest::from_json("{\"routes\": 1}"),
            Err(RouterError::Json(_))
        ));
    }

    #[test]
    fn test_duplicate_in_manifest() {
        let manifest = RouteManifest::from_json(
            r#"{"routes": [{"name": "a", "pattern": "/a"}, {"name": "a", "pattern": "/b"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.into_route_set(),
            Err(RouterError::DuplicateRouteName(_))
        ));
    }
}
