//! Dependency graph management using `petgraph`.
//!
//! Flattens a construct tree into resource nodes, merges explicit and
//! reference-derived dependencies into a directed graph, and resolves a
//! deterministic topological ordering for synthesis.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::Direction::{Incoming, Outgoing};
use petgraph::graph::NodeIndex;
use strata_common::error::{Result, StrataError};
use strata_common::types::LogicalId;

use crate::attribute::AttributeReference;
use crate::construct::ConstructTree;
use crate::resource::ResourceNode;

/// Origin of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Declared by the author through `depends_on`.
    Explicit,
    /// Implied by an attribute reference.
    Reference,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit"),
            Self::Reference => f.write_str("reference"),
        }
    }
}

/// A validated, acyclic dependency graph over the resources of one tree.
///
/// Node `i` of the internal graph is the `i`-th resource in pre-order, so
/// node indices double as first-seen positions for tie-breaking.
#[derive(Debug)]
pub struct DependencyGraph<'t> {
    /// Edges point from a dependency to its dependent.
    graph: petgraph::Graph<LogicalId, EdgeKind>,
    resources: Vec<&'t ResourceNode>,
}

impl<'t> DependencyGraph<'t> {
    /// Builds and validates the dependency graph of `tree`.
    ///
    /// # Errors
    ///
    /// - `StrataError::DuplicateLogicalId` if two resources share an id.
    /// - `StrataError::UnknownReference` if a dependency names a missing id.
    /// - `StrataError::CyclicDependency` if the edges contain a cycle.
    pub fn build(tree: &'t ConstructTree) -> Result<Self> {
        let resources = tree.flatten();
        let mut graph = petgraph::Graph::with_capacity(resources.len(), resources.len());
        let mut index: HashMap<&LogicalId, NodeIndex> = HashMap::with_capacity(resources.len());

        for &resource in &resources {
            let idx = graph.add_node(resource.logical_id.clone());
            if index.insert(&resource.logical_id, idx).is_some() {
                return Err(StrataError::DuplicateLogicalId {
                    logical_id: resource.logical_id.to_string(),
                });
            }
        }

        let lookup = |from: &ResourceNode, target: &LogicalId| {
            index
                .get(target)
                .copied()
                .ok_or_else(|| StrataError::UnknownReference {
                    from: from.logical_id.to_string(),
                    target: target.to_string(),
                })
        };

        for (pos, &resource) in resources.iter().enumerate() {
            let dependent = NodeIndex::new(pos);
            for target in &resource.explicit_depends_on {
                let dependency = lookup(resource, target)?;
                add_dependency(&mut graph, dependent, dependency, EdgeKind::Explicit);
            }

            let mut references: Vec<&AttributeReference> = Vec::new();
            for value in resource.attributes.values() {
                value.visit_references(&mut |r| references.push(r));
            }
            for reference in references {
                let dependency = lookup(resource, reference.target())?;
                add_dependency(&mut graph, dependent, dependency, EdgeKind::Reference);
            }
        }

        let built = Self { graph, resources };
        if petgraph::algo::toposort(&built.graph, None).is_err() {
            let cycle = built.find_cycle().unwrap_or_default();
            return Err(StrataError::CyclicDependency { cycle });
        }

        tracing::info!(
            resources = built.resources.len(),
            edges = built.graph.edge_count(),
            "dependency graph built"
        );
        Ok(built)
    }

    /// Resources in first-seen (pre-order) order.
    #[must_use]
    pub fn resources(&self) -> &[&'t ResourceNode] {
        &self.resources
    }

    /// Number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of distinct dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Logical ids the resource at `position` depends on, sorted.
    #[must_use]
    pub fn dependencies_of(&self, position: usize) -> Vec<&LogicalId> {
        let mut deps: Vec<&LogicalId> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), Incoming)
            .map(|idx| &self.graph[idx])
            .collect();
        deps.sort();
        deps
    }

    /// Position of a logical id in first-seen order.
    #[must_use]
    pub fn position(&self, logical_id: &LogicalId) -> Option<usize> {
        self.resources
            .iter()
            .position(|r| &r.logical_id == logical_id)
    }

    /// Returns the deployment ordering of resource positions.
    ///
    /// Dependencies appear before the resources that depend on them. Among
    /// resources whose dependencies are all placed, the one seen first in the
    /// tree is taken first, so equal graphs always yield equal orderings.
    #[must_use]
    pub fn resolve_order(&self) -> Vec<usize> {
        let n = self.graph.node_count();
        let mut in_degree: Vec<usize> = (0..n)
            .map(|i| self.graph.neighbors_directed(NodeIndex::new(i), Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(pos)) = ready.pop() {
            order.push(pos);
            for dependent in self.graph.neighbors_directed(NodeIndex::new(pos), Outgoing) {
                let d = dependent.index();
                in_degree[d] -= 1;
                if in_degree[d] == 0 {
                    ready.push(Reverse(d));
                }
            }
        }
        order
    }

    /// Renders the graph in Graphviz DOT format.
    ///
    /// Edges are labelled with their [`EdgeKind`]; an edge that is both
    /// declared and referenced carries the `explicit` label.
    #[must_use]
    pub fn to_dot(&self) -> String {
        format!("{}", petgraph::dot::Dot::new(&self.graph))
    }

    /// Finds one concrete cycle, in depends-on order, closing on its start.
    ///
    /// The cycle is taken from the strongly connected component holding the
    /// earliest-seen cyclic resource and is a shortest cycle through it.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let component = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some())
            .min_by_key(|scc| scc.iter().copied().min())?;
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = component.iter().copied().min()?;

        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            let mut deps: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Incoming)
                .filter(|d| members.contains(d))
                .collect();
            deps.sort();
            for dep in deps {
                if dep == start {
                    let mut path = vec![node];
                    let mut cursor = node;
                    while cursor != start {
                        let Some(&prev) = parent.get(&cursor) else {
                            break;
                        };
                        path.push(prev);
                        cursor = prev;
                    }
                    path.reverse();
                    path.push(start);
                    return Some(path.iter().map(|&i| self.graph[i].to_string()).collect());
                }
                if visited.insert(dep) {
                    let _ = parent.insert(dep, node);
                    queue.push_back(dep);
                }
            }
        }
        None
    }
}

/// Adds the edge `dependency -> dependent` unless one already exists.
fn add_dependency(
    graph: &mut petgraph::Graph<LogicalId, EdgeKind>,
    dependent: NodeIndex,
    dependency: NodeIndex,
    kind: EdgeKind,
) {
    if graph.find_edge(dependency, dependent).is_none() {
        let _ = graph.add_edge(dependency, dependent, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::ConstructTree;
    use crate::resource::ResourceType;

    fn ids<'a>(graph: &'a DependencyGraph<'_>, order: &[usize]) -> Vec<&'a str> {
        order
            .iter()
            .map(|&i| graph.resources()[i].logical_id.as_str())
            .collect()
    }

    fn node(tree: &mut ConstructTree, name: &str, deps: &[&str]) {
        let root = tree.root();
        let mut builder = tree.resource(root, name, ResourceType::Output);
        for dep in deps {
            builder = builder.attr(format!("ref_{dep}"), AttributeReference::new(*dep, "id"));
        }
        let _ = builder.add().expect("resource");
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let tree = ConstructTree::new("env");
        let graph = DependencyGraph::build(&tree).expect("should build");
        assert!(graph.is_empty());
        assert!(graph.resolve_order().is_empty());
    }

    #[test]
    fn single_node_resolves() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "api", &[]);
        let graph = DependencyGraph::build(&tree).expect("should build");
        assert_eq!(ids(&graph, &graph.resolve_order()), vec!["api"]);
    }

    #[test]
    fn linear_dependency_chain() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "api", &["db"]);
        node(&mut tree, "db", &[]);
        let graph = DependencyGraph::build(&tree).expect("should build");
        assert_eq!(ids(&graph, &graph.resolve_order()), vec!["db", "api"]);
    }

    #[test]
    fn diamond_dependency() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "a", &["b", "c"]);
        node(&mut tree, "b", &["d"]);
        node(&mut tree, "c", &["d"]);
        node(&mut tree, "d", &[]);
        let graph = DependencyGraph::build(&tree).expect("should build");
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(ids(&graph, &graph.resolve_order()), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn independent_nodes_keep_first_seen_order() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "z", &[]);
        node(&mut tree, "x", &[]);
        node(&mut tree, "y", &[]);
        let graph = DependencyGraph::build(&tree).expect("should build");
        assert_eq!(ids(&graph, &graph.resolve_order()), vec!["z", "x", "y"]);
    }

    #[test]
    fn explicit_and_reference_edges_are_merged() {
        let mut tree = ConstructTree::new("env");
        let root = tree.root();
        let bucket = tree
            .resource(root, "bucket", ResourceType::Bucket)
            .add()
            .expect("bucket");
        let _ = tree
            .resource(root, "object", ResourceType::BucketObject)
            .attr("bucket", bucket.attr("bucket"))
            .depends_on(&bucket)
            .add()
            .expect("object");
        let graph = DependencyGraph::build(&tree).expect("should build");
        assert_eq!(graph.edge_count(), 1);
        let deps: Vec<&str> = graph.dependencies_of(1).into_iter().map(LogicalId::as_str).collect();
        assert_eq!(deps, vec!["bucket"]);
    }

    #[test]
    fn cycle_detection_reports_genuine_cycle() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "a", &["b"]);
        node(&mut tree, "b", &["a"]);
        let err = DependencyGraph::build(&tree).unwrap_err();
        match err {
            StrataError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn three_node_cycle_detection() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "entry", &["a"]);
        node(&mut tree, "a", &["b"]);
        node(&mut tree, "b", &["c"]);
        node(&mut tree, "c", &["a"]);
        let err = DependencyGraph::build(&tree).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a -> b -> c -> a"), "got: {msg}");
        assert!(!msg.contains("entry"), "got: {msg}");
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "loop", &["loop"]);
        let err = DependencyGraph::build(&tree).unwrap_err();
        assert!(
            matches!(err, StrataError::CyclicDependency { ref cycle } if cycle == &["loop", "loop"])
        );
    }

    #[test]
    fn unknown_reference_fails() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "api", &["ghost"]);
        let err = DependencyGraph::build(&tree).unwrap_err();
        assert!(
            matches!(err, StrataError::UnknownReference { ref from, ref target } if from == "api" && target == "ghost"),
            "got: {err}"
        );
    }

    #[test]
    fn unknown_explicit_dependency_fails() {
        let mut tree = ConstructTree::new("env");
        let root = tree.root();
        let _ = tree
            .resource(root, "api", ResourceType::RestApi)
            .depends_on_id("missing")
            .add()
            .expect("api");
        let err = DependencyGraph::build(&tree).unwrap_err();
        assert!(err.to_string().contains("missing"), "got: {err}");
    }

    #[test]
    fn colliding_scope_paths_are_duplicate_logical_ids() {
        let mut tree = ConstructTree::new("env");
        let root = tree.root();
        let a = tree.create_child(root, "a").expect("a");
        let a_b = tree.create_child(root, "a_b").expect("a_b");
        let _ = tree.resource(a, "b/c", ResourceType::Output).add().expect("first");
        let _ = tree.resource(a_b, "c", ResourceType::Output).add().expect("second");

        let err = DependencyGraph::build(&tree).unwrap_err();
        assert!(
            matches!(err, StrataError::DuplicateLogicalId { ref logical_id } if logical_id == "a_b_c"),
            "got: {err}"
        );
    }

    #[test]
    fn dot_output_lists_resources() {
        let mut tree = ConstructTree::new("env");
        node(&mut tree, "api", &["db"]);
        node(&mut tree, "db", &[]);
        let graph = DependencyGraph::build(&tree).expect("should build");
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph"), "got: {dot}");
        assert!(dot.contains("api") && dot.contains("db"), "got: {dot}");
    }

    #[test]
    fn dot_output_labels_edge_kinds() {
        let mut tree = ConstructTree::new("env");
        let root = tree.root();
        let bucket = tree
            .resource(root, "bucket", ResourceType::Bucket)
            .add()
            .expect("bucket");
        let _ = tree
            .resource(root, "policy", ResourceType::BucketPolicy)
            .depends_on(&bucket)
            .add()
            .expect("policy");
        let _ = tree
            .resource(root, "name", ResourceType::Output)
            .attr("value", bucket.attr("bucket"))
            .add()
            .expect("output");
        let graph = DependencyGraph::build(&tree).expect("should build");
        let dot = graph.to_dot();
        assert_eq!(dot.matches("\"explicit\"").count(), 1, "got: {dot}");
        assert_eq!(dot.matches("\"reference\"").count(), 1, "got: {dot}");
    }
}
