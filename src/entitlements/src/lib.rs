//! # AccessGraph Entitlements
//!
//! Separation-of-duties analysis over user -> role -> permission data.
//!
//! ## Features
//!
//! - **Entitlement graph** built with petgraph, nodes keyed by kind + label
//! - **Permission aggregation** per user, one role hop
//! - **Toxic combination detection** against an explicit, immutable policy
//! - **CSV alert report** (`User,Toxic_Permissions`)
//! - **Graph export** as JSON or Graphviz DOT with flagged users highlighted
//!
//! ## Example
//!
//! ```rust
//! use accessgraph_entitlements::{analyze, AccessRow, ToxicPolicy};
//!
//! let rows = vec![
//!     AccessRow::new("carol", "admin", "Access_Billing"),
//!     AccessRow::new("carol", "admin", "Delete_Account"),
//!     AccessRow::new("carol", "admin", "Modify_Invoice"),
//! ];
//!
//! let analysis = analyze(&rows, &ToxicPolicy::financial_defaults());
//!
//! assert_eq!(analysis.alerts.len(), 2);
//! assert_eq!(analysis.flagged_users(), vec!["carol"]);
//!
//! let csv = analysis.report().to_csv_bytes().unwrap();
//! assert!(csv.starts_with(b"User,Toxic_Permissions\n"));
//! ```

pub mod aggregate;
pub mod detector;
pub mod error;
pub mod export;
pub mod graph;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use aggregate::{PermissionSet, UserPermissions};
pub use detector::{detect, flagged_users, Alert, ToxicCombo, ToxicPolicy};
pub use error::{EntitlementError, Result};
pub use export::{to_dot, GraphExport};
pub use graph::EntitlementGraph;
pub use ingest::{read_rows, read_rows_with, IngestOptions, Strictness};
pub use pipeline::{analyze, Analysis};
pub use report::{AlertReport, ReportRow};
pub use types::{AccessRow, NodeKey, NodeKind, PermissionId, Relation, RoleId, UserId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
