//! Reverse routing: from variables back to URLs.

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::config::RouterConfig;
use crate::encoding::quote;
use crate::error::{Result, RouterError};
use crate::params::{PathParams, Variables};
use crate::pattern::Pattern;

/// Arguments for building the URL of a named route.
///
/// Positional arguments bind, in order, to the distinct root names of the
/// route's variables, so `/{article.author.slug}/{article.id}` takes a single
/// positional `article` object.
///
/// ```
/// use serde_json::json;
/// use waypoint::{RouteSet, UrlArgs};
///
/// let mut routes = RouteSet::<()>::new();
/// routes.register("article", "/{article.author.slug}/{article.id}", ()).unwrap();
/// let table = routes.compile().unwrap();
///
/// let article = json!({"id": 123, "author": {"slug": "jane"}});
/// let url = table
///     .url_for("article", &UrlArgs::new().arg(article).query("page", "2"))
///     .unwrap();
/// assert_eq!(url, "/jane/123?page=2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct UrlArgs {
    positional: Vec<Value>,
    named: Variables,
    query: Vec<(String, String)>,
    anchor: Option<String>,
    absolute: Option<bool>,
    url_base: Option<String>,
}

impl UrlArgs {
    /// Creates empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a positional value.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a value by root name.
    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Appends a query string parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Sets the fragment.
    #[must_use]
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Requests an absolute URL.
    #[must_use]
    pub fn absolute(mut self) -> Self {
        self.absolute = Some(true);
        self
    }

    /// Requests a path-only URL.
    #[must_use]
    pub fn relative(mut self) -> Self {
        self.absolute = Some(false);
        self
    }

    /// Overrides the configured URL base; implies an absolute URL unless
    /// [`UrlArgs::relative`] is set.
    #[must_use]
    pub fn url_base(mut self, base: impl Into<String>) -> Self {
        self.url_base = Some(base.into());
        self
    }

    /// Binds positional and named values to the roots of `pattern`.
    pub(crate) fn bind(&self, route: &str, pattern: &Pattern) -> Result<Variables> {
        let roots = pattern.roots();
        if self.positional.len() > roots.len() {
            return Err(RouterError::TooManyArguments {
                route: route.to_string(),
                expected: roots.len(),
                given: self.positional.len(),
            });
        }

        let mut variables = self.named.clone();
        for (root, value) in roots.into_iter().zip(&self.positional) {
            if variables.contains_key(root) {
                return Err(RouterError::invalid(
                    root,
                    "given both positionally and by name",
                ));
            }
            variables.insert(root.to_string(), value.clone());
        }

        Ok(variables)
    }

    /// Adds base, query and fragment to a generated path.
    pub(crate) fn finish(&self, path: &str, config: &RouterConfig, route: &str) -> Result<String> {
        let base = self.url_base.as_deref().or(config.url_base.as_deref());
        let absolute = self
            .absolute
            .unwrap_or(self.url_base.is_some() || config.absolute_urls);

        if absolute {
            let base = base.ok_or_else(|| RouterError::MissingUrlBase(route.to_string()))?;
            let mut url = Url::parse(base).map_err(|source| RouterError::InvalidUrlBase {
                base: base.to_string(),
                source,
            })?;
            let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
            url.set_path(&joined);
            if !self.query.is_empty() {
                url.query_pairs_mut().extend_pairs(&self.query);
            }
            url.set_fragment(self.anchor.as_deref());
            return Ok(url.into());
        }

        let mut result = path.to_string();
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            result.push('?');
            result.push_str(&query);
        }
        if let Some(anchor) = &self.anchor {
            result.push('#');
            result.push_str(&quote(anchor));
        }
        Ok(result)
    }
}

/// Computes the raw value of every pattern variable.
///
/// Values in `preset` win; everything else is looked up in `variables`,
/// following dotted names through nested objects.
pub(crate) fn resolve_params(
    pattern: &Pattern,
    variables: &Variables,
    preset: &PathParams,
) -> Result<PathParams> {
    let mut params = PathParams::new();
    for var in pattern.variables() {
        let value = match preset.get(var.name()) {
            Some(value) => value.to_string(),
            None => lookup(variables, var.name())?,
        };
        params.insert(var.name(), value);
    }
    Ok(params)
}

/// Resolves a possibly dotted variable name to a string.
///
/// An absent root is a [`RouterError::MissingVariable`]; a path that breaks
/// further down, or ends on something other than a scalar, is a
/// [`RouterError::InvalidVariable`].
pub fn lookup(variables: &Variables, name: &str) -> Result<String> {
    let mut parts = name.split('.');
    let root = parts.next().unwrap_or(name);
    let mut value = variables
        .get(root)
        .ok_or_else(|| RouterError::MissingVariable(root.to_string()))?;

    for part in parts {
        let next = match value {
            Value::Object(fields) => fields.get(part),
            Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        value = next.ok_or_else(|| RouterError::invalid(name, format!("cannot resolve {part:?}")))?;
    }

    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(RouterError::invalid(
            name,
            "expected a string, number or boolean",
        )),
    }
}
