//! The compiled, immutable route table and request dispatch.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::params::{PathParams, Variables};
use crate::reverse::{self, UrlArgs};
use crate::route::Route;

/// The route chosen for a path.
pub struct RouteMatch<'a, H, C = ()> {
    /// The matched route.
    pub route: &'a Route<H, C>,
    /// Raw values captured from the path, dotted names included.
    pub params: PathParams,
    /// Variables after extraction, as seen by the preconditions.
    pub variables: Variables,
}

/// Routes in dispatch order.
///
/// Built once by [`crate::compile`] and never modified afterwards; share it
/// behind an `Arc` to dispatch from many threads.
pub struct CompiledRouteTable<H, C = ()> {
    routes: Vec<Route<H, C>>,
    index: HashMap<String, usize>,
    config: RouterConfig,
}

impl<H, C> CompiledRouteTable<H, C> {
    pub(crate) fn new(routes: Vec<Route<H, C>>, config: RouterConfig) -> Self {
        let index = routes
            .iter()
            .enumerate()
            .map(|(i, route)| (route.name.clone(), i))
            .collect();
        Self {
            routes,
            index,
            config,
        }
    }

    /// Returns the routes in dispatch order.
    pub fn routes(&self) -> &[Route<H, C>] {
        &self.routes
    }

    /// Returns the route names in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.name.as_str())
    }

    /// Gets a route by name.
    pub fn route(&self, name: &str) -> Option<&Route<H, C>> {
        self.index.get(name).map(|&i| &self.routes[i])
    }

    /// Returns the dispatch position of a route.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the configuration the table was compiled with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Finds the first route accepting `path`.
    ///
    /// Routes are tried in table order. A route accepts when its pattern
    /// matches, its extractor produces variables and every precondition
    /// passes. `Ok(None)` means nothing matched; errors only come from route
    /// hooks.
    pub fn dispatch(&self, ctx: &C, path: &str) -> Result<Option<RouteMatch<'_, H, C>>> {
        for route in &self.routes {
            if self.config.debug {
                debug!(route = %route.name, path, "trying route");
            } else {
                trace!(route = %route.name, path, "trying route");
            }

            if let Some((params, variables)) = route.accept(ctx, path)? {
                debug!(route = %route.name, path, "matched route");
                return Ok(Some(RouteMatch {
                    route,
                    params,
                    variables,
                }));
            }
        }

        debug!(path, "no route matched");
        Ok(None)
    }

    /// Generates the path of `route` from variables.
    ///
    /// A `vars_to_url` hook replaces generation entirely. Otherwise values
    /// from the `vars_to_url_parts` hook are used first and the remaining
    /// variables resolved from `variables`, following dotted names.
    pub fn build_url(&self, route: &Route<H, C>, variables: &Variables) -> Result<String> {
        if let Some(hook) = route.url_override() {
            return hook
                .vars_to_url(variables)
                .map_err(|e| RouterError::hook(&route.name, e));
        }

        let preset = match route.url_parts() {
            Some(hook) => hook
                .vars_to_url_parts(variables)
                .map_err(|e| RouterError::hook(&route.name, e))?,
            None => PathParams::new(),
        };
        let params = reverse::resolve_params(&route.pattern, variables, &preset)?;
        route.pattern.generate(&params)
    }

    /// Builds the URL of a named route.
    pub fn url_for(&self, name: &str, args: &UrlArgs) -> Result<String> {
        let route = self
            .route(name)
            .ok_or_else(|| RouterError::RouteNotFound(name.to_string()))?;
        let variables = args.bind(name, &route.pattern)?;
        let path = self.build_url(route, &variables)?;
        args.finish(&path, &self.config, name)
    }
}

impl<H, C> std::fmt::Debug for RouteMatch<'_, H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", &self.route.name())
            .field("params", &self.params)
            .field("variables", &self.variables)
            .finish()
    }
}

impl<H, C> std::fmt::Debug for CompiledRouteTable<H, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRouteTable")
            .field("routes", &self.names().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}
