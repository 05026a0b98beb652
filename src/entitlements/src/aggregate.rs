//! Per-user permission aggregation
//!
//! Scans rows directly rather than walking the graph: a user's permissions
//! are exactly the permissions listed on that user's rows. Roles granting
//! other roles are not modelled.

use crate::types::{AccessRow, PermissionId, UserId};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Unique, sorted set of permission labels held by one user
pub type PermissionSet = BTreeSet<PermissionId>;

/// Mapping of user -> effective permissions, in first-encounter order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPermissions {
    users: IndexMap<UserId, PermissionSet>,
}

impl UserPermissions {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate permissions from a sequence of rows
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a AccessRow>,
    {
        let mut permissions = Self::new();
        for row in rows {
            permissions.insert(row.user.as_str(), row.permission.as_str());
        }

        debug!(users = permissions.len(), "Aggregated user permissions");
        permissions
    }

    /// Record that `user` holds `permission`
    pub fn insert(&mut self, user: &str, permission: &str) {
        match self.users.get_mut(user) {
            Some(set) => {
                if !set.contains(permission) {
                    set.insert(permission.to_string());
                }
            }
            None => {
                let mut set = PermissionSet::new();
                set.insert(permission.to_string());
                self.users.insert(user.to_string(), set);
            }
        }
    }

    /// Permissions for a user, if the user appeared in the input
    pub fn get(&self, user: &str) -> Option<&PermissionSet> {
        self.users.get(user)
    }

    /// Iterate users in first-encounter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PermissionSet)> + '_ {
        self.users.iter().map(|(user, set)| (user.as_str(), set))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
