//! Render-ready graph export
//!
//! Produces the node/edge listing a renderer needs: every node carries a
//! colour by kind, and users with at least one alert are flagged and drawn
//! in red. Available as JSON or Graphviz DOT.

use crate::detector::{flagged_users, Alert};
use crate::error::Result;
use crate::graph::EntitlementGraph;
use crate::types::{NodeKey, NodeKind, Relation};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

/// Colour for flagged users
pub const FLAGGED_COLOR: &str = "red";

/// Default colour for a node kind
pub fn kind_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::User => "skyblue",
        NodeKind::Role => "lightgreen",
        NodeKind::Permission => "salmon",
    }
}

fn node_color(key: &NodeKey, flagged: &HashSet<&str>) -> &'static str {
    if is_flagged(key, flagged) {
        FLAGGED_COLOR
    } else {
        kind_color(key.kind)
    }
}

fn is_flagged(key: &NodeKey, flagged: &HashSet<&str>) -> bool {
    key.kind == NodeKind::User && flagged.contains(key.label.as_str())
}

/// Exported node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNode {
    /// Stable id (`kind:label`)
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub color: String,
    /// True for users with at least one alert
    pub flagged: bool,
}

/// Exported edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub from: String,
    pub to: String,
    pub relation: Relation,
}

/// Graph export for a presentation layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

impl GraphExport {
    /// Build the export, highlighting users named in `alerts`
    pub fn new(graph: &EntitlementGraph, alerts: &[Alert]) -> Self {
        let flagged: HashSet<&str> = flagged_users(alerts).into_iter().collect();

        let nodes = graph
            .nodes()
            .map(|key| ExportNode {
                id: key.id(),
                label: key.label.clone(),
                kind: key.kind,
                color: node_color(key, &flagged).to_string(),
                flagged: is_flagged(key, &flagged),
            })
            .collect();

        let edges = graph
            .edges()
            .map(|(source, target, relation)| ExportEdge {
                from: source.id(),
                to: target.id(),
                relation,
            })
            .collect();

        Self { nodes, edges }
    }

    /// Number of flagged nodes
    pub fn flagged_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.flagged).count()
    }

    /// Write pretty-printed JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn escape_dot(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the graph as Graphviz DOT
pub fn to_dot(graph: &EntitlementGraph, alerts: &[Alert]) -> String {
    let flagged: HashSet<&str> = flagged_users(alerts).into_iter().collect();

    let edge_attrs = |_: &DiGraph<NodeKey, Relation>, edge: EdgeReference<'_, Relation>| {
        format!("label = \"{}\" ", edge.weight())
    };
    let node_attrs = |_: &DiGraph<NodeKey, Relation>, (_, key): (NodeIndex, &NodeKey)| {
        format!(
            "label = \"{}\" style = filled fillcolor = \"{}\" ",
            escape_dot(&key.label),
            node_color(key, &flagged)
        )
    };

    let dot = Dot::with_attr_getters(
        graph.inner(),
        &[Config::NodeNoLabel, Config::EdgeNoLabel],
        &edge_attrs,
        &node_attrs,
    );

    format!("{}", dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::UserPermissions;
    use crate::detector::{detect, ToxicPolicy};
    use crate::types::AccessRow;

    fn fixture() -> (EntitlementGraph, Vec<Alert>) {
        let rows = vec![
            AccessRow::new("alice", "admin", "Modify_Invoice"),
            AccessRow::new("alice", "admin", "Delete_Account"),
            AccessRow::new("bob", "viewer", "Access_Billing"),
        ];
        let graph = EntitlementGraph::from_rows(&rows);
        let alerts = detect(
            &UserPermissions::from_rows(&rows),
            &ToxicPolicy::financial_defaults(),
        );
        (graph, alerts)
    }

    #[test]
    fn test_export_colors_and_flags() {
        let (graph, alerts) = fixture();
        let export = GraphExport::new(&graph, &alerts);

        assert_eq!(export.nodes.len(), graph.node_count());
        assert_eq!(export.edges.len(), graph.edge_count());
        assert_eq!(export.flagged_count(), 1);

        let alice = export.nodes.iter().find(|n| n.id == "user:alice").unwrap();
        assert!(alice.flagged);
        assert_eq!(alice.color, FLAGGED_COLOR);

        let bob = export.nodes.iter().find(|n| n.id == "user:bob").unwrap();
        assert!(!bob.flagged);
        assert_eq!(bob.color, "skyblue");

        let admin = export.nodes.iter().find(|n| n.id == "role:admin").unwrap();
        assert_eq!(admin.color, "lightgreen");
    }

    #[test]
    fn test_only_user_nodes_are_flagged() {
        let rows = vec![
            AccessRow::new("Delete_Account", "admin", "Modify_Invoice"),
            AccessRow::new("Delete_Account", "admin", "Delete_Account"),
        ];
        let graph = EntitlementGraph::from_rows(&rows);
        let alerts = detect(
            &UserPermissions::from_rows(&rows),
            &ToxicPolicy::financial_defaults(),
        );

        let export = GraphExport::new(&graph, &alerts);
        let perm = export
            .nodes
            .iter()
            .find(|n| n.id == "permission:Delete_Account")
            .unwrap();

        assert!(!perm.flagged);
        assert_eq!(perm.color, "salmon");
        assert_eq!(export.flagged_count(), 1);
    }

    #[test]
    fn test_json_shape() {
        let (graph, alerts) = fixture();
        let json = GraphExport::new(&graph, &alerts).to_json_string().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(value["nodes"].is_array());
        assert_eq!(value["edges"][0]["relation"], "has_role");
        assert_eq!(value["nodes"][0]["kind"], "user");
    }

    #[test]
    fn test_dot_output() {
        let (graph, alerts) = fixture();
        let dot = to_dot(&graph, &alerts);

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("label = \"alice\" style = filled fillcolor = \"red\""));
        assert!(dot.contains("label = \"bob\" style = filled fillcolor = \"skyblue\""));
        assert!(dot.contains("label = \"grants\""));
    }

    #[test]
    fn test_dot_escapes_quotes() {
        let rows = vec![AccessRow::new("o\"brien", "r", "p")];
        let graph = EntitlementGraph::from_rows(&rows);

        assert!(to_dot(&graph, &[]).contains("label = \"o\\\"brien\""));
    }
}
