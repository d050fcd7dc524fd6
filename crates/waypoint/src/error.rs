//! Error types for routing.

use thiserror::Error;

/// Boxed error raised by user-supplied route hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Pattern text could not be parsed.
    #[error("malformed pattern {pattern:?}: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    /// A route was registered twice under the same name.
    #[error("route {0:?} already defined")]
    DuplicateRouteName(String),

    /// A `before`/`after` constraint names a route that was never registered.
    #[error("route {route:?} depends on unknown route {dependency:?}")]
    UnknownDependency { route: String, dependency: String },

    /// The ordering constraints contain a cycle.
    #[error(
        "cannot resolve ordering of the following routes:\n{}",
        .0.iter().map(|name| format!(" - {name}")).collect::<Vec<_>>().join("\n")
    )]
    DependencyLoop(Vec<String>),

    /// A variable required by a pattern was not supplied.
    #[error("missing variable: {0}")]
    MissingVariable(String),

    /// A variable value does not satisfy its matcher or cannot be resolved.
    #[error("invalid value for variable {name}: {reason}")]
    InvalidVariable { name: String, reason: String },

    /// Route name not found.
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// More positional arguments than the route has variables.
    #[error("route {route:?} takes {expected} positional arguments, {given} given")]
    TooManyArguments {
        route: String,
        expected: usize,
        given: usize,
    },

    /// The configured or supplied URL base is not an absolute URL.
    #[error("invalid url base {base:?}: {source}")]
    InvalidUrlBase {
        base: String,
        #[source]
        source: url::ParseError,
    },

    /// An absolute URL was requested but no URL base is known.
    #[error("cannot build absolute url for route {0:?} without a url base")]
    MissingUrlBase(String),

    /// A precondition, extractor or URL hook failed.
    #[error("hook for route {route:?} failed: {source}")]
    Hook {
        route: String,
        #[source]
        source: HookError,
    },

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be deserialized.
    #[error("configuration error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouterError {
    pub(crate) fn malformed(pattern: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidVariable {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn hook(route: &str, source: HookError) -> Self {
        Self::Hook {
            route: route.to_string(),
            source,
        }
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_loop_lists_routes_in_order() {
        let err = RouterError::DependencyLoop(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            err.to_string(),
            "cannot resolve ordering of the following routes:\n - a\n - b\n - c"
        );
    }
}
