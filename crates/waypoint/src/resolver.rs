//! Route order resolution.
//!
//! Routes become nodes of a directed graph where an edge `a -> b` means `a`
//! must be tried before `b`. Edges come from two sources:
//!
//! - specificity, between every comparable pair of unconstrained routes;
//! - explicit `before`/`after` constraints, inserted one at a time. Each
//!   explicit edge is propagated to the neighbours of its target so that the
//!   constrained route still lands in specificity order among them.
//!
//! The graph is sorted topologically, breaking ties by registration order.
//! It only lives for the duration of [`resolve`].

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap, VecDeque};

use tracing::{debug, info, trace, warn};

use crate::error::{Result, RouterError};
use crate::pattern::Pattern;
use crate::route::Route;

/// Adjacency sets over route indices.
#[derive(Debug)]
struct OrderGraph {
    successors: Vec<BTreeSet<usize>>,
    predecessors: Vec<BTreeSet<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

impl OrderGraph {
    fn new(nodes: usize) -> Self {
        Self {
            successors: vec![BTreeSet::new(); nodes],
            predecessors: vec![BTreeSet::new(); nodes],
        }
    }

    fn len(&self) -> usize {
        self.successors.len()
    }

    /// Adds `from -> to`; returns false if the edge already existed.
    fn add_edge(&mut self, from: usize, to: usize) -> bool {
        self.predecessors[to].insert(from);
        self.successors[from].insert(to)
    }

    fn is_isolated(&self, node: usize) -> bool {
        self.successors[node].is_empty() && self.predecessors[node].is_empty()
    }

    /// Shortest path from `from` to `to`, both ends included.
    fn path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.len()];
        let mut seen = vec![false; self.len()];
        let mut queue = VecDeque::from([from]);
        seen[from] = true;

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to];
                let mut current = to;
                while let Some(previous) = parent[current] {
                    path.push(previous);
                    current = previous;
                }
                path.reverse();
                return Some(path);
            }
            for &next in &self.successors[node] {
                if !seen[next] {
                    seen[next] = true;
                    parent[next] = Some(node);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Returns the nodes of some cycle, in edge order.
    fn find_cycle(&self) -> Option<Vec<usize>> {
        let mut marks = vec![Mark::New; self.len()];

        for start in 0..self.len() {
            if marks[start] != Mark::New {
                continue;
            }
            marks[start] = Mark::Active;
            let mut stack = vec![(start, self.successors[start].iter())];

            while let Some((node, children)) = stack.last_mut() {
                let node = *node;
                let Some(next) = children.next().copied() else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                match marks[next] {
                    Mark::New => {
                        marks[next] = Mark::Active;
                        stack.push((next, self.successors[next].iter()));
                    }
                    Mark::Active => {
                        let from = stack.iter().position(|(n, _)| *n == next).unwrap_or(0);
                        return Some(stack[from..].iter().map(|(n, _)| *n).collect());
                    }
                    Mark::Done => {}
                }
            }
        }

        None
    }

    /// Kahn's algorithm; among ready nodes the lowest index goes first.
    fn topological_order(&self) -> Option<Vec<usize>> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(BTreeSet::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..self.len())
            .filter(|&node| in_degree[node] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &next in &self.successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        (order.len() == self.len()).then_some(order)
    }
}

struct Resolver<'a, H, C> {
    routes: &'a [Route<H, C>],
    graph: OrderGraph,
}

impl<'a, H, C> Resolver<'a, H, C> {
    fn new(routes: &'a [Route<H, C>]) -> Self {
        Self {
            routes,
            graph: OrderGraph::new(routes.len()),
        }
    }

    fn name(&self, node: usize) -> &'a str {
        &self.routes[node].name
    }

    fn pattern(&self, node: usize) -> &'a Pattern {
        &self.routes[node].pattern
    }

    fn names(&self, nodes: &[usize]) -> Vec<String> {
        nodes.iter().map(|&n| self.name(n).to_string()).collect()
    }

    /// Adds `from -> to` unless it would close a cycle, which is returned
    /// instead.
    fn try_add_edge(&mut self, from: usize, to: usize) -> Option<Vec<usize>> {
        if from == to {
            return Some(vec![from]);
        }
        if let Some(mut cycle) = self.graph.path(to, from) {
            cycle.pop();
            cycle.insert(0, from);
            return Some(cycle);
        }
        if self.graph.add_edge(from, to) {
            trace!(from = self.name(from), to = self.name(to), "added edge");
        }
        None
    }

    /// Orders the specificity-derived edges between unconstrained routes.
    fn add_specificity_edges(&mut self, unconstrained: &[usize]) {
        for (pos, &a) in unconstrained.iter().enumerate() {
            for &b in &unconstrained[pos + 1..] {
                let (pa, pb) = (self.pattern(a), self.pattern(b));
                if pa.equals(pb) {
                    continue;
                }
                match pa.specificity(pb) {
                    Some(Ordering::Less) => {
                        self.graph.add_edge(a, b);
                    }
                    Some(Ordering::Greater) => {
                        self.graph.add_edge(b, a);
                    }
                    _ => trace!(a = self.name(a), b = self.name(b), "incomparable patterns"),
                }
            }
        }
    }

    /// Places `route` before `other`.
    ///
    /// The edge is then propagated over the other predecessors of `other`:
    /// `route` moves in front of those it is more specific than and behind
    /// those more specific than itself. Propagated edges are dropped if they
    /// would close a cycle; only the explicit edge can fail.
    fn insert_before(&mut self, route: usize, other: usize) -> Option<Vec<usize>> {
        let mut visited = vec![false; self.graph.len()];
        self.place_before(route, other, &mut visited)
    }

    /// Places `route` after `other`; the mirror image of
    /// [`Resolver::insert_before`] over the successors of `other`.
    fn insert_after(&mut self, route: usize, other: usize) -> Option<Vec<usize>> {
        let mut visited = vec![false; self.graph.len()];
        self.place_after(route, other, &mut visited)
    }

    /// Each node is propagated over at most once per explicit constraint.
    fn place_before(
        &mut self,
        route: usize,
        other: usize,
        visited: &mut [bool],
    ) -> Option<Vec<usize>> {
        visited[other] = true;
        if let Some(cycle) = self.try_add_edge(route, other) {
            return Some(cycle);
        }

        let predecessors: Vec<usize> = self.graph.predecessors[other]
            .iter()
            .copied()
            .filter(|&p| p != route)
            .collect();
        for predecessor in predecessors {
            if visited[predecessor] {
                continue;
            }
            match self.pattern(route).specificity(self.pattern(predecessor)) {
                Some(Ordering::Less) => {
                    if self.place_before(route, predecessor, visited).is_some() {
                        trace!(
                            route = self.name(route),
                            predecessor = self.name(predecessor),
                            "skipped propagated before-edge"
                        );
                    }
                }
                Some(Ordering::Greater) => {
                    visited[predecessor] = true;
                    if self.try_add_edge(predecessor, route).is_some() {
                        warn!(
                            route = self.name(route),
                            predecessor = self.name(predecessor),
                            "specificity edge would close a cycle, skipped"
                        );
                    }
                }
                None | Some(Ordering::Equal) => {}
            }
        }

        None
    }

    fn place_after(
        &mut self,
        route: usize,
        other: usize,
        visited: &mut [bool],
    ) -> Option<Vec<usize>> {
        visited[other] = true;
        if let Some(cycle) = self.try_add_edge(other, route) {
            return Some(cycle);
        }

        let successors: Vec<usize> = self.graph.successors[other]
            .iter()
            .copied()
            .filter(|&s| s != route)
            .collect();
        for successor in successors {
            if visited[successor] {
                continue;
            }
            match self.pattern(route).specificity(self.pattern(successor)) {
                Some(Ordering::Greater) => {
                    if self.place_after(route, successor, visited).is_some() {
                        trace!(
                            route = self.name(route),
                            successor = self.name(successor),
                            "skipped propagated after-edge"
                        );
                    }
                }
                Some(Ordering::Less) => {
                    visited[successor] = true;
                    if self.try_add_edge(route, successor).is_some() {
                        warn!(
                            route = self.name(route),
                            successor = self.name(successor),
                            "specificity edge would close a cycle, skipped"
                        );
                    }
                }
                None | Some(Ordering::Equal) => {}
            }
        }

        None
    }

    fn loop_error(&self, cycle: &[usize]) -> RouterError {
        RouterError::DependencyLoop(self.names(cycle))
    }
}

/// Computes the dispatch order of `routes`.
///
/// Returns indices into `routes`, most preferred first.
pub(crate) fn resolve<H, C>(routes: &[Route<H, C>]) -> Result<Vec<usize>> {
    let index: HashMap<&str, usize> = routes
        .iter()
        .enumerate()
        .map(|(i, route)| (route.name.as_str(), i))
        .collect();

    for route in routes {
        for dependency in route.before.iter().chain(&route.after) {
            if !index.contains_key(dependency.as_str()) {
                return Err(RouterError::UnknownDependency {
                    route: route.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    let (constrained, unconstrained): (Vec<usize>, Vec<usize>) =
        (0..routes.len()).partition(|&i| routes[i].is_constrained());

    let mut resolver = Resolver::new(routes);
    resolver.add_specificity_edges(&unconstrained);

    for &node in &constrained {
        let route = &routes[node];
        for other in &route.before {
            if let Some(cycle) = resolver.insert_before(node, index[other.as_str()]) {
                return Err(resolver.loop_error(&cycle));
            }
        }
        for other in &route.after {
            if let Some(cycle) = resolver.insert_after(node, index[other.as_str()]) {
                return Err(resolver.loop_error(&cycle));
            }
        }
    }

    for &node in &unconstrained {
        if resolver.graph.is_isolated(node) {
            debug!(
                route = resolver.name(node),
                "no ordering relations, keeping registration position"
            );
        }
    }

    if let Some(cycle) = resolver.graph.find_cycle() {
        return Err(resolver.loop_error(&cycle));
    }
    let order = resolver
        .graph
        .topological_order()
        .ok_or_else(|| RouterError::DependencyLoop(resolver.names(&[])))?;

    for (position, &node) in order.iter().enumerate() {
        debug!(position, route = resolver.name(node), "resolved route position");
    }
    info!(routes = order.len(), "resolved route order");

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: usize, edges: &[(usize, usize)]) -> OrderGraph {
        let mut graph = OrderGraph::new(nodes);
        for &(from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    fn routes(defs: &[(&str, &str, &[&str], &[&str])]) -> Vec<Route<()>> {
        defs.iter()
            .map(|(name, pattern, before, after)| {
                let mut route = Route::new(*name, pattern, ()).unwrap();
                for other in *before {
                    route.add_before(*other);
                }
                for other in *after {
                    route.add_after(*other);
                }
                route
            })
            .collect()
    }

    fn order(defs: &[(&str, &str, &[&str], &[&str])]) -> Result<Vec<String>> {
        let routes = routes(defs);
        let order = resolve(&routes)?;
        Ok(order.into_iter().map(|i| routes[i].name.clone()).collect())
    }

    #[test]
    fn test_path() {
        let g = graph(4, &[(0, 1), (1, 2), (0, 2)]);
        assert_eq!(g.path(0, 2), Some(vec![0, 2]));
        assert_eq!(g.path(1, 2), Some(vec![1, 2]));
        assert_eq!(g.path(2, 0), None);
        assert_eq!(g.path(3, 0), None);
    }

    #[test]
    fn test_find_cycle() {
        assert_eq!(graph(3, &[(0, 1), (1, 2)]).find_cycle(), None);
        assert_eq!(
            graph(4, &[(3, 0), (0, 1), (1, 2), (2, 0)]).find_cycle(),
            Some(vec![0, 1, 2])
        );
    }

    #[test]
    fn test_topological_order_is_stable() {
        assert_eq!(graph(3, &[]).topological_order(), Some(vec![0, 1, 2]));
        assert_eq!(
            graph(4, &[(3, 0), (2, 1)]).topological_order(),
            Some(vec![2, 1, 3, 0])
        );
        assert_eq!(graph(2, &[(0, 1), (1, 0)]).topological_order(), None);
    }

    #[test]
    fn test_try_add_edge_reports_cycle_in_order() {
        let routes = routes(&[("a", "/a", &[], &[]), ("b", "/b", &[], &[]), ("c", "/c", &[], &[])]);
        let mut resolver = Resolver::new(&routes);
        assert!(resolver.try_add_edge(0, 1).is_none());
        assert!(resolver.try_add_edge(1, 2).is_none());
        assert_eq!(resolver.try_add_edge(2, 0), Some(vec![2, 0, 1]));
        assert_eq!(resolver.try_add_edge(1, 1), Some(vec![1]));
        assert!(resolver.graph.find_cycle().is_none());
    }

    #[test]
    fn test_specificity_order() {
        assert_eq!(
            order(&[("b", "/b", &[], &[]), ("a", "/a", &[], &[])]).unwrap(),
            ["a", "b"]
        );
    }

    #[test]
    fn test_equal_patterns_keep_registration_order() {
        assert_eq!(
            order(&[("x", "/{a}", &[], &[]), ("y", "/{b}", &[], &[])]).unwrap(),
            ["x", "y"]
        );
        assert_eq!(
            order(&[("y", "/{b}", &[], &[]), ("x", "/{a}", &[], &[])]).unwrap(),
            ["y", "x"]
        );
    }

    #[test]
    fn test_incomparable_patterns_keep_registration_order() {
        assert_eq!(
            order(&[("num", "/{id>\\d+}", &[], &[]), ("any", "/{slug}", &[], &[])]).unwrap(),
            ["num", "any"]
        );
        assert_eq!(
            order(&[("any", "/{slug}", &[], &[]), ("num", "/{id>\\d+}", &[], &[])]).unwrap(),
            ["any", "num"]
        );
    }

    #[test]
    fn test_before_propagates_upstream() {
        // `/0` sorts before `/a`, so placing it before `b` also places it
        // before `a`.
        assert_eq!(
            order(&[
                ("a", "/a", &[], &[]),
                ("b", "/b", &[], &[]),
                ("c", "/0", &["b"], &[]),
            ])
            .unwrap(),
            ["c", "a", "b"]
        );
    }

    #[test]
    fn test_after_propagates_downstream() {
        // `/z` sorts after `/b`, so placing it after `a` also places it after
        // `b`, even though `z` was registered first.
        assert_eq!(
            order(&[
                ("a", "/a", &[], &[]),
                ("z", "/z", &[], &["a"]),
                ("b", "/b", &[], &[]),
            ])
            .unwrap(),
            ["a", "b", "z"]
        );
    }

    #[test]
    fn test_propagation_visits_each_route_once() {
        let mut routes: Vec<Route<()>> = (0..48)
            .map(|i| Route::new(format!("b{i:02}"), &format!("/b{i:02}"), ()).unwrap())
            .collect();
        routes.push(Route::new("first", "/a", ()).unwrap().before("b47"));
        routes.push(Route::new("last", "/z", ()).unwrap().after("b00"));

        let order = resolve(&routes).unwrap();
        let expected: Vec<usize> = std::iter::once(48).chain(0..48).chain([49]).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_unknown_dependency() {
        let err = order(&[("a", "/a", &["ghost"], &[])]).unwrap_err();
        assert!(matches!(
            err,
            RouterError::UnknownDependency { route, dependency }
                if route == "a" && dependency == "ghost"
        ));
    }

    #[test]
    fn test_self_loop() {
        let err = order(&[("a", "/a", &["a"], &[])]).unwrap_err();
        assert!(matches!(err, RouterError::DependencyLoop(names) if names == ["a"]));
    }

    #[test]
    fn test_after_self_loop() {
        let err = order(&[("a", "/a", &[], &["a"])]).unwrap_err();
        assert!(matches!(err, RouterError::DependencyLoop(_)));
    }
}
