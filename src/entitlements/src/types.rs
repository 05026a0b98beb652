//! Core entitlement types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique user label
pub type UserId = String;

/// Unique role label
pub type RoleId = String;

/// Unique permission label
pub type PermissionId = String;

/// One (User, Role, Permission) assignment from the input table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessRow {
    /// User holding the role
    pub user: UserId,

    /// Role assigned to the user
    pub role: RoleId,

    /// Permission granted by the role
    pub permission: PermissionId,
}

impl AccessRow {
    /// Create a new row
    pub fn new(
        user: impl Into<String>,
        role: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
            permission: permission.into(),
        }
    }
}

/// Kind of an entitlement graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Role,
    Permission,
}

impl NodeKind {
    /// Lowercase name, as used in exports
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::User => "user",
            NodeKind::Role => "role",
            NodeKind::Permission => "permission",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node identity: a label is only unique within its kind
///
/// A user called `Delete_Account` and the permission `Delete_Account`
/// are two different nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub label: String,
}

impl NodeKey {
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }

    pub fn user(label: impl Into<String>) -> Self {
        Self::new(NodeKind::User, label)
    }

    pub fn role(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Role, label)
    }

    pub fn permission(label: impl Into<String>) -> Self {
        Self::new(NodeKind::Permission, label)
    }

    /// Stable textual id (`kind:label`) for exports
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.label)
    }
}

/// Relation carried by an entitlement edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// User -> Role
    HasRole,
    /// Role -> Permission
    Grants,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::HasRole => "has_role",
            Relation::Grants => "grants",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_key_identity_includes_kind() {
        let user = NodeKey::user("Delete_Account");
        let perm = NodeKey::permission("Delete_Account");

        assert_ne!(user, perm);
        assert_eq!(user.id(), "user:Delete_Account");
        assert_eq!(perm.id(), "permission:Delete_Account");
    }

    #[test]
    fn test_relation_names() {
        assert_eq!(Relation::HasRole.to_string(), "has_role");
        assert_eq!(Relation::Grants.to_string(), "grants");
        assert_eq!(serde_json::to_string(&Relation::HasRole).unwrap(), "\"has_role\"");
    }
}
