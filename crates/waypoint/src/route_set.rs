//! Route registration prior to compilation.

use std::collections::HashMap;

use tracing::debug;

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::resolver;
use crate::route::Route;
use crate::table::CompiledRouteTable;

/// A group of routes sharing a path prefix.
pub struct RouteGroup<H, C = ()> {
    /// URL prefix for all routes in this group.
    prefix: String,
    /// Routes in this group, in registration order.
    routes: Vec<Route<H, C>>,
}

impl<H, C> RouteGroup<H, C> {
    /// Creates a new route group with the given prefix.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            routes: Vec::new(),
        }
    }

    /// Adds a route whose pattern is joined to the group prefix.
    ///
    /// An empty pattern addresses the prefix itself.
    pub fn route(mut self, name: impl Into<String>, pattern: &str, handler: H) -> Result<Self> {
        let rest = pattern.trim_start_matches('/');
        let full_pattern = if rest.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{rest}", self.prefix)
        };
        self.routes.push(Route::new(name, &full_pattern, handler)?);
        Ok(self)
    }

    /// Returns the routes in this group.
    pub fn into_routes(self) -> Vec<Route<H, C>> {
        self.routes
    }
}

/// Routes collected before their order is resolved.
///
/// Registration order is remembered: it breaks ties between routes that
/// neither specificity nor explicit constraints order.
///
/// ```
/// use waypoint::RouteSet;
///
/// let mut routes = RouteSet::<&str>::new();
/// routes.register("home", "/", "home_handler").unwrap();
/// routes.register("user", "/users/{id}", "user_handler").unwrap();
/// routes
///     .register("user_new", "/users/new", "new_user_handler")
///     .unwrap()
///     .add_before("user");
///
/// let table = routes.compile().unwrap();
/// let found = table.dispatch(&(), "/users/new").unwrap().unwrap();
/// assert_eq!(found.route.name(), "user_new");
/// ```
pub struct RouteSet<H, C = ()> {
    routes: Vec<Route<H, C>>,
    index: HashMap<String, usize>,
    config: RouterConfig,
}

impl<H, C> Default for RouteSet<H, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, C> RouteSet<H, C> {
    /// Creates a new empty route set.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            index: HashMap::new(),
            config: RouterConfig::default(),
        }
    }

    /// Sets the configuration carried into the compiled table.
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a route and returns it for attaching constraints and hooks.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Route<H, C>> {
        let route = Route::new(name, pattern, handler)?;
        self.add(route)
    }

    /// Adds a fully built route.
    pub fn add(&mut self, route: Route<H, C>) -> Result<&mut Route<H, C>> {
        if self.index.contains_key(&route.name) {
            return Err(RouterError::DuplicateRouteName(route.name));
        }
        debug!(route = %route.name, pattern = %route.pattern, "registered route");
        let position = self.routes.len();
        self.index.insert(route.name.clone(), position);
        self.routes.push(route);
        Ok(&mut self.routes[position])
    }

    /// Adds every route of a group.
    pub fn group(&mut self, group: RouteGroup<H, C>) -> Result<&mut Self> {
        for route in group.into_routes() {
            self.add(route)?;
        }
        Ok(self)
    }

    /// Gets a registered route.
    pub fn route(&self, name: &str) -> Option<&Route<H, C>> {
        self.index.get(name).map(|&i| &self.routes[i])
    }

    /// Gets a registered route for attaching constraints or hooks.
    pub fn route_mut(&mut self, name: &str) -> Option<&mut Route<H, C>> {
        self.index.get(name).map(|&i| &mut self.routes[i])
    }

    /// Returns the routes in registration order.
    pub fn routes(&self) -> &[Route<H, C>] {
        &self.routes
    }

    /// Returns the number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether no route has been registered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolves the route order and freezes the routes into a table.
    pub fn compile(self) -> Result<CompiledRouteTable<H, C>> {
        compile(self)
    }
}

impl<H: Clone, C> Clone for RouteSet<H, C> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            index: self.index.clone(),
            config: self.config.clone(),
        }
    }
}

/// Resolves the order of a route set and builds the dispatch table.
///
/// Fails with [`RouterError::UnknownDependency`] or
/// [`RouterError::DependencyLoop`]; no table is produced in that case.
pub fn compile<H, C>(set: RouteSet<H, C>) -> Result<CompiledRouteTable<H, C>> {
    let order = resolver::resolve(&set.routes)?;

    let mut slots: Vec<Option<Route<H, C>>> = set.routes.into_iter().map(Some).collect();
    let routes = order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect();

    Ok(CompiledRouteTable::new(routes, set.config))
}
