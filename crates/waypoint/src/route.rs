//! Route definitions and the hooks a route can carry.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::{HookError, Result, RouterError};
use crate::params::{PathParams, Variables};
use crate::pattern::Pattern;

/// Result returned by route hooks.
pub type HookResult<T> = std::result::Result<T, HookError>;

/// A predicate that can veto an otherwise matching route.
///
/// Returning `Ok(false)` makes the dispatcher move on to the next route; an
/// error aborts dispatch and is handed to the caller.
///
/// Any `Fn(&C, &Variables) -> HookResult<bool>` closure is a precondition:
///
/// ```
/// use waypoint::{HookResult, Route, Variables};
///
/// let route = Route::<(), ()>::new("article", "/{slug}", ())
///     .unwrap()
///     .precondition(|_ctx: &(), vars: &Variables| -> HookResult<bool> {
///         Ok(vars["slug"] != "draft")
///     });
/// ```
pub trait Precondition<C>: Send + Sync {
    /// Decides whether the route applies to this request.
    fn check(&self, ctx: &C, variables: &Variables) -> HookResult<bool>;
}

impl<C, F> Precondition<C> for F
where
    F: Fn(&C, &Variables) -> HookResult<bool> + Send + Sync,
{
    fn check(&self, ctx: &C, variables: &Variables) -> HookResult<bool> {
        self(ctx, variables)
    }
}

/// Converts captured path parameters into route variables.
///
/// Returning `Ok(None)` means the conversion failed softly (an object that
/// does not exist, say) and the route does not apply.
pub trait MatchToVars<C>: Send + Sync {
    /// Builds the variables for a matched path.
    fn match_to_vars(&self, ctx: &C, params: &PathParams) -> HookResult<Option<Variables>>;
}

impl<C, F> MatchToVars<C> for F
where
    F: Fn(&C, &PathParams) -> HookResult<Option<Variables>> + Send + Sync,
{
    fn match_to_vars(&self, ctx: &C, params: &PathParams) -> HookResult<Option<Variables>> {
        self(ctx, params)
    }
}

/// Replaces URL generation for a route entirely.
pub trait VarsToUrl: Send + Sync {
    /// Builds the path for the given variables.
    fn vars_to_url(&self, variables: &Variables) -> HookResult<String>;
}

impl<F> VarsToUrl for F
where
    F: Fn(&Variables) -> HookResult<String> + Send + Sync,
{
    fn vars_to_url(&self, variables: &Variables) -> HookResult<String> {
        self(variables)
    }
}

/// Supplies raw values for some pattern variables before dotted paths are
/// resolved against the variables.
pub trait VarsToUrlParts: Send + Sync {
    /// Returns values keyed by full variable name.
    fn vars_to_url_parts(&self, variables: &Variables) -> HookResult<PathParams>;
}

impl<F> VarsToUrlParts for F
where
    F: Fn(&Variables) -> HookResult<PathParams> + Send + Sync,
{
    fn vars_to_url_parts(&self, variables: &Variables) -> HookResult<PathParams> {
        self(variables)
    }
}

/// A single route definition.
///
/// `H` is the handler the caller dispatches to once the route is chosen and
/// `C` the per-request context preconditions and extractors may read.
pub struct Route<H, C = ()> {
    /// Unique route name; fixed once the route is registered.
    pub(crate) name: String,
    /// Path pattern.
    pub pattern: Pattern,
    /// Request handler.
    pub handler: H,
    /// Names of routes this route must be tried before.
    pub before: Vec<String>,
    /// Names of routes this route must be tried after.
    pub after: Vec<String>,
    preconditions: Vec<Arc<dyn Precondition<C>>>,
    match_to_vars: Option<Arc<dyn MatchToVars<C>>>,
    vars_to_url: Option<Arc<dyn VarsToUrl>>,
    vars_to_url_parts: Option<Arc<dyn VarsToUrlParts>>,
}

impl<H, C> Route<H, C> {
    /// Creates a new route, parsing its pattern.
    pub fn new(name: impl Into<String>, pattern: &str, handler: H) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            pattern: Pattern::parse(pattern)?,
            handler,
            before: Vec::new(),
            after: Vec::new(),
            preconditions: Vec::new(),
            match_to_vars: None,
            vars_to_url: None,
            vars_to_url_parts: None,
        })
    }

    /// Requires this route to be tried before `other`.
    #[must_use]
    pub fn before(mut self, other: impl Into<String>) -> Self {
        self.add_before(other);
        self
    }

    /// Requires this route to be tried after `other`.
    #[must_use]
    pub fn after(mut self, other: impl Into<String>) -> Self {
        self.add_after(other);
        self
    }

    /// Appends a precondition.
    #[must_use]
    pub fn precondition(mut self, precondition: impl Precondition<C> + 'static) -> Self {
        self.add_precondition(precondition);
        self
    }

    /// Sets the variable extractor.
    #[must_use]
    pub fn match_to_vars(mut self, hook: impl MatchToVars<C> + 'static) -> Self {
        self.set_match_to_vars(hook);
        self
    }

    /// Sets the URL generation override.
    #[must_use]
    pub fn vars_to_url(mut self, hook: impl VarsToUrl + 'static) -> Self {
        self.set_vars_to_url(hook);
        self
    }

    /// Sets the URL parts provider.
    #[must_use]
    pub fn vars_to_url_parts(mut self, hook: impl VarsToUrlParts + 'static) -> Self {
        self.set_vars_to_url_parts(hook);
        self
    }

    /// In-place form of [`Route::before`].
    pub fn add_before(&mut self, other: impl Into<String>) -> &mut Self {
        self.before.push(other.into());
        self
    }

    /// In-place form of [`Route::after`].
    pub fn add_after(&mut self, other: impl Into<String>) -> &mut Self {
        self.after.push(other.into());
        self
    }

    /// In-place form of [`Route::precondition`].
    pub fn add_precondition(&mut self, precondition: impl Precondition<C> + 'static) -> &mut Self {
        self.preconditions.push(Arc::new(precondition));
        self
    }

    /// In-place form of [`Route::match_to_vars`].
    pub fn set_match_to_vars(&mut self, hook: impl MatchToVars<C> + 'static) -> &mut Self {
        if self.match_to_vars.is_some() {
            warn!(route = %self.name, "replacing match_to_vars hook");
        }
        self.match_to_vars = Some(Arc::new(hook));
        self
    }

    /// In-place form of [`Route::vars_to_url`].
    pub fn set_vars_to_url(&mut self, hook: impl VarsToUrl + 'static) -> &mut Self {
        if self.vars_to_url.is_some() {
            warn!(route = %self.name, "replacing vars_to_url hook");
        }
        self.vars_to_url = Some(Arc::new(hook));
        self
    }

    /// In-place form of [`Route::vars_to_url_parts`].
    pub fn set_vars_to_url_parts(&mut self, hook: impl VarsToUrlParts + 'static) -> &mut Self {
        if self.vars_to_url_parts.is_some() {
            warn!(route = %self.name, "replacing vars_to_url_parts hook");
        }
        self.vars_to_url_parts = Some(Arc::new(hook));
        self
    }

    /// Returns the route name.
    ///
    /// The name is the key of the owning [`crate::RouteSet`] and cannot be
    /// changed after registration:
    ///
    /// ```compile_fail
    /// let mut routes = waypoint::RouteSet::<()>::new();
    /// routes.register("a", "/a", ()).unwrap();
    /// routes.route_mut("a").unwrap().name = "b".into();
    /// ```
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the route carries explicit ordering constraints.
    pub fn is_constrained(&self) -> bool {
        !self.before.is_empty() || !self.after.is_empty()
    }

    /// Matches `path` and runs extraction and preconditions.
    ///
    /// Returns the raw parameters and converted variables when the route
    /// applies, `None` when it does not.
    pub(crate) fn accept(&self, ctx: &C, path: &str) -> Result<Option<(PathParams, Variables)>> {
        let Some(params) = self.pattern.match_path(path) else {
            return Ok(None);
        };

        let variables = match &self.match_to_vars {
            Some(hook) => match hook
                .match_to_vars(ctx, &params)
                .map_err(|e| RouterError::hook(&self.name, e))?
            {
                Some(variables) => variables,
                None => return Ok(None),
            },
            None => params.to_variables(),
        };

        for precondition in &self.preconditions {
            let passed = precondition
                .check(ctx, &variables)
                .map_err(|e| RouterError::hook(&self.name, e))?;
            if !passed {
                return Ok(None);
            }
        }

        Ok(Some((params, variables)))
    }

    pub(crate) fn url_override(&self) -> Option<&dyn VarsToUrl> {
        self.vars_to_url.as_deref()
    }

    pub(crate) fn url_parts(&self) -> Option<&dyn VarsToUrlParts> {
        self.vars_to_url_parts.as_deref()
    }
}

impl<H: Clone, C> Clone for Route<H, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            handler: self.handler.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            preconditions: self.preconditions.clone(),
            match_to_vars: self.match_to_vars.clone(),
            vars_to_url: self.vars_to_url.clone(),
            vars_to_url_parts: self.vars_to_url_parts.clone(),
        }
    }
}

impl<H, C> fmt::Debug for Route<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("before", &self.before)
            .field("after", &self.after)
            .field("preconditions", &self.preconditions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn test_builder() {
        let route = Route::<(), ()>::new("a", "/a", ())
            .unwrap()
            .before("b")
            .after("c")
            .after("d");
        assert_eq!(route.before, ["b"]);
        assert_eq!(route.after, ["c", "d"]);
        assert!(route.is_constrained());
    }

    #[test]
    fn test_invalid_pattern() {
        let result = Route::<(), ()>::new("a", "/{a", ());
        assert!(matches!(result, Err(RouterError::MalformedPattern { .. })));
    }

    #[test]
    fn test_accept_default_variables() {
        let route = Route::<(), ()>::new("a", "/{x}/{obj.id}", ()).unwrap();
        let (params, vars) = route.accept(&(), "/1/2").unwrap().unwrap();
        assert_eq!(params.get("obj.id"), Some("2"));
        assert_eq!(Value::Object(vars), json!({"x": "1"}));
    }

    #[test]
    fn test_precondition_veto() {
        let route = Route::<(), u32>::new("a", "/{x}", ())
            .unwrap()
            .precondition(|ctx: &u32, _: &Variables| -> HookResult<bool> { Ok(*ctx > 1) });
        assert!(route.accept(&1, "/a").unwrap().is_none());
        assert!(route.accept(&2, "/a").unwrap().is_some());
    }

    #[test]
    fn test_extractor_soft_failure() {
        let route = Route::<(), ()>::new("a", "/{x}", ())
            .unwrap()
            .match_to_vars(|_: &(), _: &PathParams| -> HookResult<Option<Variables>> { Ok(None) });
        assert!(route.accept(&(), "/a").unwrap().is_none());
    }

    #[test]
    fn test_hook_error_propagates() {
        let route = Route::<(), ()>::new("a", "/{x}", ())
            .unwrap()
            .precondition(|_: &(), _: &Variables| -> HookResult<bool> {
                Err("database down".into())
            });
        let err = route.accept(&(), "/a").unwrap_err();
        assert!(matches!(err, RouterError::Hook { route, .. } if route == "a"));
    }
}
