//! Build -> aggregate -> detect, in one call

use crate::aggregate::UserPermissions;
use crate::detector::{detect, flagged_users, Alert, ToxicPolicy};
use crate::export::{to_dot, GraphExport};
use crate::graph::EntitlementGraph;
use crate::report::AlertReport;
use crate::types::AccessRow;
use tracing::info;

/// Result of analysing one dataset
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub graph: EntitlementGraph,
    pub permissions: UserPermissions,
    pub alerts: Vec<Alert>,
}

impl Analysis {
    /// Distinct flagged users, in alert order
    pub fn flagged_users(&self) -> Vec<&str> {
        flagged_users(&self.alerts)
    }

    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    pub fn report(&self) -> AlertReport {
        AlertReport::from_alerts(&self.alerts)
    }

    pub fn export(&self) -> GraphExport {
        GraphExport::new(&self.graph, &self.alerts)
    }

    pub fn to_dot(&self) -> String {
        to_dot(&self.graph, &self.alerts)
    }
}

/// Analyse a set of rows against a policy
pub fn analyze(rows: &[AccessRow], policy: &ToxicPolicy) -> Analysis {
    let graph = EntitlementGraph::from_rows(rows);
    let permissions = UserPermissions::from_rows(rows);
    let alerts = detect(&permissions, policy);

    info!(
        rows = rows.len(),
        users = permissions.len(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        alerts = alerts.len(),
        flagged = flagged_users(&alerts).len(),
        "Entitlement analysis complete"
    );

    Analysis {
        graph,
        permissions,
        alerts,
    }
}
