//! Toxic combination detection
//!
//! A toxic combination is a set of permissions that must never be held by
//! the same user (separation of duties). The detector checks every user's
//! permission set against every configured combination and emits one
//! [`Alert`] per (user, combination) match.
//!
//! # Example
//!
//! ```rust
//! use accessgraph_entitlements::{detect, AccessRow, ToxicPolicy, UserPermissions};
//!
//! let rows = vec![
//!     AccessRow::new("alice", "admin", "Modify_Invoice"),
//!     AccessRow::new("alice", "admin", "Delete_Account"),
//! ];
//!
//! let permissions = UserPermissions::from_rows(&rows);
//! let alerts = detect(&permissions, &ToxicPolicy::financial_defaults());
//!
//! assert_eq!(alerts.len(), 1);
//! assert_eq!(alerts[0].user, "alice");
//! ```

use crate::aggregate::{PermissionSet, UserPermissions};
use crate::error::{EntitlementError, Result};
use crate::types::{PermissionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator used when displaying combination members
pub const MEMBER_SEPARATOR: &str = ", ";

/// A set of permissions that together constitute a separation-of-duties risk
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToxicCombo {
    /// Optional display name (e.g., "invoice-tampering")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Member permissions, sorted
    pub permissions: BTreeSet<PermissionId>,
}

impl ToxicCombo {
    /// Create a combination, rejecting malformed member lists
    pub fn new<I, S>(permissions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let combo = Self {
            name: None,
            permissions: permissions.into_iter().map(Into::into).collect(),
        };
        combo.validate()?;
        Ok(combo)
    }

    /// Attach a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate the combination definition
    pub fn validate(&self) -> Result<()> {
        if self.permissions.iter().any(|p| p.is_empty()) {
            return Err(EntitlementError::InvalidPolicy(format!(
                "Toxic combination '{}' has an empty permission label",
                self.display_name()
            )));
        }

        // A single permission is not a combination
        if self.permissions.len() < 2 {
            return Err(EntitlementError::InvalidPolicy(format!(
                "Toxic combination '{}' must name at least two distinct permissions",
                self.display_name()
            )));
        }

        Ok(())
    }

    /// True if every member is present in `held` (case-sensitive)
    pub fn is_subset_of(&self, held: &PermissionSet) -> bool {
        self.permissions.is_subset(held)
    }

    /// Members joined as `"a, b"` in lexicographic order
    pub fn joined(&self) -> String {
        self.permissions
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(MEMBER_SEPARATOR)
    }

    /// Name if set, otherwise the joined members
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.joined(),
        }
    }
}

/// Ordered, immutable list of toxic combinations for one run
///
/// Cloning is cheap; the list is shared behind an `Arc` and can be handed
/// to concurrent analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToxicPolicy {
    combos: Arc<Vec<ToxicCombo>>,
}

impl ToxicPolicy {
    /// Build a policy from configured combinations
    ///
    /// Malformed combinations are dropped with a warning; an empty policy
    /// is valid and simply never alerts.
    pub fn from_combos(combos: impl IntoIterator<Item = ToxicCombo>) -> Self {
        let combos: Vec<ToxicCombo> = combos
            .into_iter()
            .filter(|combo| match combo.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed toxic combination");
                    false
                }
            })
            .collect();

        Self {
            combos: Arc::new(combos),
        }
    }

    /// The financial separation-of-duties defaults:
    /// `{Modify_Invoice, Delete_Account}` and `{Access_Billing, Delete_Account}`
    pub fn financial_defaults() -> Self {
        Self::from_combos(vec![
            ToxicCombo {
                name: Some("invoice-tampering".to_string()),
                permissions: ["Modify_Invoice", "Delete_Account"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
            ToxicCombo {
                name: Some("billing-cover-up".to_string()),
                permissions: ["Access_Billing", "Delete_Account"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            },
        ])
    }

    pub fn combos(&self) -> &[ToxicCombo] {
        &self.combos
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    /// Evaluate all users against this policy
    pub fn detect(&self, permissions: &UserPermissions) -> Vec<Alert> {
        detect(permissions, self)
    }
}

/// A user whose permissions contain a toxic combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Flagged user
    pub user: UserId,

    /// Matched combination
    pub combo: ToxicCombo,
}

impl Alert {
    /// Human-readable alert line
    pub fn message(&self) -> String {
        format!(
            "User '{}' has toxic permission combo: {}",
            self.user,
            self.combo.joined()
        )
    }
}

/// Detect toxic combinations
///
/// Users are visited in first-encounter order and combinations in
/// configured order. A user matching several combinations gets one alert
/// per match.
pub fn detect(permissions: &UserPermissions, policy: &ToxicPolicy) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for (user, held) in permissions.iter() {
        for combo in policy.combos() {
            if combo.is_subset_of(held) {
                alerts.push(Alert {
                    user: user.to_string(),
                    combo: combo.clone(),
                });
            }
        }
    }

    debug!(
        users = permissions.len(),
        combos = policy.len(),
        alerts = alerts.len(),
        "Toxic combination scan complete"
    );

    alerts
}

/// Distinct alerted users, in alert order
pub fn flagged_users(alerts: &[Alert]) -> Vec<&str> {
    let mut seen = BTreeSet::new();
    alerts
        .iter()
        .map(|alert| alert.user.as_str())
        .filter(|user| seen.insert(*user))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccessRow;

    fn permissions(data: &[(&str, &str)]) -> UserPermissions {
        let mut perms = UserPermissions::new();
        for (user, perm) in data {
            perms.insert(user, perm);
        }
        perms
    }

    #[test]
    fn test_combo_validation() {
        assert!(ToxicCombo::new(["A", "B"]).is_ok());
        assert!(ToxicCombo::new(["A"]).is_err());
        assert!(ToxicCombo::new(["A", "A"]).is_err());
        assert!(ToxicCombo::new(["A", ""]).is_err());
        assert!(ToxicCombo::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_joined_is_sorted() {
        let combo = ToxicCombo::new(["Modify_Invoice", "Delete_Account"]).unwrap();
        assert_eq!(combo.joined(), "Delete_Account, Modify_Invoice");
    }

    #[test]
    fn test_policy_drops_malformed_combos() {
        let policy = ToxicPolicy::from_combos(vec![
            ToxicCombo {
                name: None,
                permissions: ["Only_One".to_string()].into_iter().collect(),
            },
            ToxicCombo::new(["A", "B"]).unwrap(),
        ]);

        assert_eq!(policy.len(), 1);
    }

    #[test]
    fn test_empty_policy_never_alerts() {
        let perms = permissions(&[("alice", "Modify_Invoice"), ("alice", "Delete_Account")]);
        assert!(detect(&perms, &ToxicPolicy::default()).is_empty());
    }

    #[test]
    fn test_single_match() {
        let perms = permissions(&[("alice", "Modify_Invoice"), ("alice", "Delete_Account")]);
        let alerts = detect(&perms, &ToxicPolicy::financial_defaults());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].user, "alice");
        assert_eq!(alerts[0].combo.joined(), "Delete_Account, Modify_Invoice");
        assert_eq!(
            alerts[0].message(),
            "User 'alice' has toxic permission combo: Delete_Account, Modify_Invoice"
        );
    }

    #[test]
    fn test_partial_combo_does_not_alert() {
        let perms = permissions(&[("bob", "Access_Billing")]);
        assert!(detect(&perms, &ToxicPolicy::financial_defaults()).is_empty());
    }

    #[test]
    fn test_multiple_matches_in_configured_order() {
        let perms = permissions(&[
            ("carol", "Access_Billing"),
            ("carol", "Delete_Account"),
            ("carol", "Modify_Invoice"),
        ]);
        let policy = ToxicPolicy::financial_defaults();
        let alerts = policy.detect(&perms);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].combo, policy.combos()[0]);
        assert_eq!(alerts[1].combo, policy.combos()[1]);
    }

    #[test]
    fn test_case_sensitive_membership() {
        let perms = permissions(&[("dan", "modify_invoice"), ("dan", "Delete_Account")]);
        assert!(detect(&perms, &ToxicPolicy::financial_defaults()).is_empty());
    }

    #[test]
    fn test_flagged_users_are_distinct() {
        let rows = vec![
            AccessRow::new("carol", "admin", "Access_Billing"),
            AccessRow::new("carol", "admin", "Delete_Account"),
            AccessRow::new("carol", "admin", "Modify_Invoice"),
            AccessRow::new("erin", "ops", "Access_Billing"),
            AccessRow::new("erin", "ops", "Delete_Account"),
        ];
        let alerts = detect(&UserPermissions::from_rows(&rows), &ToxicPolicy::financial_defaults());

        assert_eq!(alerts.len(), 3);
        assert_eq!(flagged_users(&alerts), vec!["carol", "erin"]);
    }
}
