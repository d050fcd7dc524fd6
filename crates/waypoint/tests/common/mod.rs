#![allow(dead_code)]

use serde_json::Value;
use waypoint::{CompiledRouteTable, RouteSet, RouterError, Variables};

/// Compiles `routes` into a table, panicking on failure.
pub fn compile<H, C>(routes: RouteSet<H, C>) -> CompiledRouteTable<H, C> {
    routes
        .compile()
        .unwrap_or_else(|e| panic!("Failed to compile routes: {e}"))
}

/// Compiles `routes`, expecting an error.
pub fn compile_err<H, C>(routes: RouteSet<H, C>) -> RouterError {
    match routes.compile() {
        Ok(table) => panic!("Expected compile error, got order {:?}", order(&table)),
        Err(e) => e,
    }
}

/// Route names in dispatch order.
pub fn order<H, C>(table: &CompiledRouteTable<H, C>) -> Vec<String> {
    table.names().map(str::to_string).collect()
}

/// Dispatch position of `name`, panicking if it is not in the table.
pub fn position<H, C>(table: &CompiledRouteTable<H, C>, name: &str) -> usize {
    table
        .position(name)
        .unwrap_or_else(|| panic!("Route {name} missing from {:?}", order(table)))
}

/// Registers unconstrained routes given as `(name, pattern)` pairs.
pub fn route_set(routes: &[(&str, &str)]) -> RouteSet<()> {
    let mut set = RouteSet::new();
    for (name, pattern) in routes {
        set.register(*name, pattern, ())
            .unwrap_or_else(|e| panic!("Failed to register {name}: {e}"));
    }
    set
}

/// Converts a JSON object literal into variables.
pub fn vars(value: Value) -> Variables {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected object, got {other}"),
    }
}
