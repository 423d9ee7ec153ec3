//! Workflow status reference data
//!
//! A [`Status`] is a named state in an entity's approval lifecycle together
//! with its rule set: for each role, the statuses a holder of that role may
//! move the entity into from this status. Statuses are created at setup time
//! and never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{RoleName, StatusId};

/// Per-role transition targets of one status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionRules(BTreeMap<RoleName, BTreeSet<StatusId>>);

impl TransitionRules {
    /// Creates an empty rule set (a de facto terminal status)
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `targets` to the statuses reachable by `role`
    pub fn with_rule(mut self, role: RoleName, targets: impl IntoIterator<Item = StatusId>) -> Self {
        self.0.entry(role).or_default().extend(targets);
        self
    }

    /// Returns the targets reachable by `role`, if the role has a rule
    pub fn targets_for(&self, role: &RoleName) -> Option<&BTreeSet<StatusId>> {
        self.0.get(role)
    }

    /// Returns true if `role` may move the entity into `target`
    pub fn permits(&self, role: &RoleName, target: &StatusId) -> bool {
        self.0
            .get(role)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Iterates over `(role, targets)` pairs in role order
    pub fn iter(&self) -> impl Iterator<Item = (&RoleName, &BTreeSet<StatusId>)> {
        self.0.iter()
    }

    /// Returns every status referenced as a target by any role
    pub fn referenced_statuses(&self) -> BTreeSet<&StatusId> {
        self.0.values().flatten().collect()
    }

    /// Returns true if no role has any outgoing edge
    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

/// A named state in a workflow entity's approval lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    id: StatusId,
    title: String,
    #[serde(default)]
    rules: TransitionRules,
}

impl Status {
    /// Creates a status with the given rule set
    pub fn new(id: StatusId, title: impl Into<String>, rules: TransitionRules) -> Self {
        Self {
            id,
            title: title.into(),
            rules,
        }
    }

    /// Creates a status from a JSON-encoded rule table
    ///
    /// The table is an object mapping role names to arrays of status ids,
    /// e.g. `{"ROLE_HR": ["TIMESHEET-STATUS-HR-ACCEPT"]}`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRules` if the JSON does not decode into
    /// a rule table.
    pub fn from_rules_json(
        id: StatusId,
        title: impl Into<String>,
        rules_json: &str,
    ) -> Result<Self, DomainError> {
        let rules: TransitionRules = serde_json::from_str(rules_json)
            .map_err(|e| DomainError::InvalidRules(format!("{id}: {e}")))?;
        Ok(Self::new(id, title, rules))
    }

    /// Returns the status identifier
    pub fn id(&self) -> &StatusId {
        &self.id
    }

    /// Returns the human-readable title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the rule set
    pub fn rules(&self) -> &TransitionRules {
        &self.rules
    }

    /// Returns the rule table encoded as JSON
    pub fn rules_json(&self) -> String {
        serde_json::to_string(&self.rules).unwrap_or_else(|_| "{}".to_string())
    }

    /// Returns true if no role can leave this status
    pub fn is_terminal(&self) -> bool {
        self.rules.is_empty()
    }
}
