//! Entitlement graph
//!
//! Turns flat (user, role, permission) rows into a directed graph:
//!
//! ```text
//! user --has_role--> role --grants--> permission
//! ```
//!
//! Nodes are keyed by [`NodeKey`] (kind + label), so inserting the same
//! row twice, or in a different order, yields the same node and edge sets.

use crate::types::{AccessRow, NodeKey, NodeKind, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Directed graph of users, roles and permissions for one analysis run
#[derive(Debug, Clone, Default)]
pub struct EntitlementGraph {
    /// Petgraph directed graph
    graph: DiGraph<NodeKey, Relation>,

    /// Node index mapping (key -> NodeIndex)
    node_indices: HashMap<NodeKey, NodeIndex>,
}

impl EntitlementGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a sequence of rows
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a AccessRow>,
    {
        let mut graph = Self::new();
        let mut row_count = 0usize;
        for row in rows {
            graph.add_row(row);
            row_count += 1;
        }

        debug!(
            rows = row_count,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built entitlement graph"
        );

        graph
    }

    /// Add one row: three nodes, a `has_role` edge and a `grants` edge
    pub fn add_row(&mut self, row: &AccessRow) {
        let user = self.add_node(NodeKey::user(row.user.as_str()));
        let role = self.add_node(NodeKey::role(row.role.as_str()));
        let permission = self.add_node(NodeKey::permission(row.permission.as_str()));

        self.graph.update_edge(user, role, Relation::HasRole);
        self.graph.update_edge(role, permission, Relation::Grants);
    }

    /// Get or create the node for `key`
    pub fn add_node(&mut self, key: NodeKey) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&key) {
            return idx;
        }

        let idx = self.graph.add_node(key.clone());
        self.node_indices.insert(key, idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Check whether a node exists
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.node_indices.contains_key(key)
    }

    /// Iterate over all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeKey> + '_ {
        self.graph.raw_nodes().iter().map(|node| &node.weight)
    }

    /// Iterate over all edges as (source, target, relation)
    pub fn edges(&self) -> impl Iterator<Item = (&NodeKey, &NodeKey, Relation)> + '_ {
        self.graph.edge_references().map(move |edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                *edge.weight(),
            )
        })
    }

    /// Node keys as an ordered set, independent of insertion order
    pub fn node_set(&self) -> BTreeSet<NodeKey> {
        self.nodes().cloned().collect()
    }

    /// Edges as an ordered set, independent of insertion order
    pub fn edge_set(&self) -> BTreeSet<(NodeKey, NodeKey, Relation)> {
        self.edges()
            .map(|(source, target, relation)| (source.clone(), target.clone(), relation))
            .collect()
    }

    /// Roles directly assigned to a user, sorted
    pub fn roles_of(&self, user: &str) -> Vec<&str> {
        self.targets(&NodeKey::user(user), NodeKind::Role)
    }

    /// Permissions directly granted by a role, sorted
    pub fn permissions_granted_by(&self, role: &str) -> Vec<&str> {
        self.targets(&NodeKey::role(role), NodeKind::Permission)
    }

    fn targets(&self, key: &NodeKey, kind: NodeKind) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(key) else {
            return Vec::new();
        };

        let mut labels: Vec<&str> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| &self.graph[n])
            .filter(|target| target.kind == kind)
            .map(|target| target.label.as_str())
            .collect();
        labels.sort_unstable();
        labels
    }

    /// Underlying petgraph graph, for exporters
    pub(crate) fn inner(&self) -> &DiGraph<NodeKey, Relation> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[(&str, &str, &str)]) -> Vec<AccessRow> {
        data.iter()
            .map(|(u, r, p)| AccessRow::new(*u, *r, *p))
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let empty: Vec<AccessRow> = Vec::new();
        let graph = EntitlementGraph::from_rows(&empty);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_single_row() {
        let graph = EntitlementGraph::from_rows(&rows(&[("alice", "admin", "Delete_Account")]));

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains(&NodeKey::user("alice")));
        assert!(graph.contains(&NodeKey::role("admin")));
        assert!(graph.contains(&NodeKey::permission("Delete_Account")));

        let edges = graph.edge_set();
        assert!(edges.contains(&(NodeKey::user("alice"), NodeKey::role("admin"), Relation::HasRole)));
        assert!(edges.contains(&(
            NodeKey::role("admin"),
            NodeKey::permission("Delete_Account"),
            Relation::Grants
        )));
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let graph = EntitlementGraph::from_rows(&rows(&[
            ("alice", "admin", "Modify_Invoice"),
            ("alice", "admin", "Modify_Invoice"),
        ]));

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let forward = rows(&[
            ("alice", "admin", "Modify_Invoice"),
            ("bob", "viewer", "Access_Billing"),
            ("alice", "auditor", "Access_Billing"),
        ]);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = EntitlementGraph::from_rows(&forward);
        let b = EntitlementGraph::from_rows(&reversed);

        assert_eq!(a.node_set(), b.node_set());
        assert_eq!(a.edge_set(), b.edge_set());
    }

    #[test]
    fn test_same_label_different_kinds_are_distinct() {
        let graph = EntitlementGraph::from_rows(&rows(&[("Delete_Account", "admin", "Delete_Account")]));

        assert_eq!(graph.node_count(), 3);
        assert!(graph.contains(&NodeKey::user("Delete_Account")));
        assert!(graph.contains(&NodeKey::permission("Delete_Account")));
    }

    #[test]
    fn test_empty_labels_are_nodes() {
        let graph = EntitlementGraph::from_rows(&rows(&[("", "", "")]));

        assert_eq!(graph.node_count(), 3);
        assert!(graph.contains(&NodeKey::user("")));
    }

    #[test]
    fn test_navigation() {
        let graph = EntitlementGraph::from_rows(&rows(&[
            ("alice", "finance", "Modify_Invoice"),
            ("alice", "admin", "Delete_Account"),
            ("bob", "finance", "Access_Billing"),
        ]));

        assert_eq!(graph.roles_of("alice"), vec!["admin", "finance"]);
        assert_eq!(
            graph.permissions_granted_by("finance"),
            vec!["Access_Billing", "Modify_Invoice"]
        );
        assert!(graph.roles_of("nobody").is_empty());
    }
}
