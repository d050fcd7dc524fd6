//! # waypoint
//!
//! URL routing that resolves a request path to exactly one named route.
//!
//! This crate provides:
//! - URL patterns with `{name}` and `{name>regex}` variables
//! - A deterministic route order derived from pattern specificity
//! - Explicit `before`/`after` constraints between routes
//! - Preconditions and variable extractors per route
//! - Reverse URL building, including dotted paths into object graphs
//!
//! ## Quick Start
//!
//! ```
//! use waypoint::{RouteSet, UrlArgs};
//!
//! let mut routes = RouteSet::<&str>::new();
//! routes.register("home", "/", "home").unwrap();
//! routes.register("post", "/posts/{id>\\d+}", "show_post").unwrap();
//! routes.register("post_edit", "/posts/{id>\\d+}/edit", "edit_post").unwrap();
//!
//! let table = routes.compile().unwrap();
//!
//! let found = table.dispatch(&(), "/posts/42").unwrap().unwrap();
//! assert_eq!(found.route.handler, "show_post");
//! assert_eq!(found.params.get("id"), Some("42"));
//!
//! let url = table.url_for("post_edit", &UrlArgs::new().arg(42)).unwrap();
//! assert_eq!(url, "/posts/42/edit");
//! ```
//!
//! ## Route Order
//!
//! Routes are tried in a single order computed when the set is compiled.
//! Without constraints, more specific patterns come first: literal text beats
//! a variable, a longer literal beats its own prefix. Routes the rules cannot
//! tell apart keep their registration order.
//!
//! ```
//! use waypoint::RouteSet;
//!
//! let mut routes = RouteSet::<()>::new();
//! routes.register("catch_all", "/{page>.*}", ()).unwrap();
//! routes.register("user", "/users/{id}", ()).unwrap();
//! routes.route_mut("user").unwrap().add_before("catch_all");
//!
//! let table = routes.compile().unwrap();
//! assert_eq!(table.names().collect::<Vec<_>>(), ["user", "catch_all"]);
//! ```
//!
//! Constraints that cannot all hold fail with [`RouterError::DependencyLoop`]
//! naming the routes involved.
//!
//! ## Preconditions
//!
//! ```
//! use waypoint::{HookResult, RouteSet, Variables};
//!
//! struct Session {
//!     admin: bool,
//! }
//!
//! let mut routes = RouteSet::<&str, Session>::new();
//! routes
//!     .register("admin", "/{page}", "admin")
//!     .unwrap()
//!     .add_precondition(|session: &Session, _: &Variables| -> HookResult<bool> {
//!         Ok(session.admin)
//!     });
//! routes.register("public", "/{page}", "public").unwrap();
//! let table = routes.compile().unwrap();
//!
//! let guest = Session { admin: false };
//! let found = table.dispatch(&guest, "/settings").unwrap().unwrap();
//! assert_eq!(found.route.name(), "public");
//! ```

pub mod encoding;

mod config;
mod error;
mod params;
mod pattern;
mod resolver;
mod reverse;
mod route;
mod route_set;
mod table;

pub use config::{OneOrMany, RouteDefinition, RouteManifest, RouterConfig};
pub use error::{HookError, Result, RouterError};
pub use params::{PathParams, Variables};
pub use pattern::{Pattern, Segment, Variable, DEFAULT_MATCHER};
pub use reverse::{lookup, UrlArgs};
pub use route::{HookResult, MatchToVars, Precondition, Route, VarsToUrl, VarsToUrlParts};
pub use route_set::{compile, RouteGroup, RouteSet};
pub use table::{CompiledRouteTable, RouteMatch};
