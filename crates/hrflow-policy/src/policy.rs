//! Status transition policy
//!
//! Compiles a status catalog into a lookup table and answers "may an actor
//! holding these roles move an entity from status S to status T?". A
//! transition is allowed when ANY held role lists the target in the current
//! status's rule set. Moving to the current status is a no-op and always
//! allowed.
//!
//! Decisions are pure: no I/O, no interior mutability, safe to share across
//! requests behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use hrflow_core::config::Config;
use hrflow_core::domain::{EntityKind, RoleName, RoleSet, Status, StatusId, TransitionRules};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::PolicyError;

/// Outcome of evaluating one proposed transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Target equals the current status
    NoOp,
    /// Permitted; `role` is the first held role (in name order) that grants it
    Allowed { role: RoleName },
    /// No held role permits the transition
    Denied,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Denied)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::NoOp => f.write_str("allowed (no-op)"),
            Decision::Allowed { role } => write!(f, "allowed via {role}"),
            Decision::Denied => f.write_str("denied"),
        }
    }
}

// ============================================================================
// StatusTransitionPolicy
// ============================================================================

/// Transition rules of one entity kind's status catalog
#[derive(Debug, Clone)]
pub struct StatusTransitionPolicy {
    kind: EntityKind,
    statuses: BTreeMap<StatusId, Status>,
    /// Catalog order, for listings
    order: Vec<StatusId>,
}

impl StatusTransitionPolicy {
    /// Builds a policy from a status catalog
    ///
    /// Rule targets that are not part of the catalog are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::DuplicateStatus` if a status id appears twice.
    pub fn new(
        kind: EntityKind,
        catalog: impl IntoIterator<Item = Status>,
    ) -> Result<Self, PolicyError> {
        let catalog: Vec<Status> = catalog.into_iter().collect();

        let mut known = BTreeSet::new();
        for status in &catalog {
            if !known.insert(status.id().clone()) {
                return Err(PolicyError::DuplicateStatus {
                    kind,
                    status: status.id().clone(),
                });
            }
        }

        let mut statuses = BTreeMap::new();
        let mut order = Vec::with_capacity(catalog.len());
        for status in catalog {
            let status = drop_unknown_targets(kind, status, &known);
            order.push(status.id().clone());
            statuses.insert(status.id().clone(), status);
        }

        debug!(kind = %kind, statuses = order.len(), "Transition policy initialized");

        Ok(Self {
            kind,
            statuses,
            order,
        })
    }

    /// Returns the entity kind this policy governs
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns true if `id` is part of the catalog
    pub fn contains(&self, id: &StatusId) -> bool {
        self.statuses.contains_key(id)
    }

    /// Looks up a status by id
    pub fn status(&self, id: &StatusId) -> Option<&Status> {
        self.statuses.get(id)
    }

    /// Iterates over the catalog in declaration order
    pub fn statuses(&self) -> impl Iterator<Item = &Status> {
        self.order.iter().filter_map(|id| self.statuses.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Evaluates a proposed transition for an actor holding `roles`
    ///
    /// # Errors
    ///
    /// - `PolicyError::UnknownStatus` if `current` is not in the catalog
    /// - `PolicyError::UnknownTarget` if `target` is not in the catalog
    pub fn evaluate(
        &self,
        current: &StatusId,
        target: &StatusId,
        roles: &RoleSet,
    ) -> Result<Decision, PolicyError> {
        let status = self.lookup(current)?;

        if current == target {
            trace!(kind = %self.kind, status = %current, "Self-transition is a no-op");
            return Ok(Decision::NoOp);
        }

        if !self.contains(target) {
            return Err(PolicyError::UnknownTarget {
                kind: self.kind,
                status: target.clone(),
            });
        }

        let granting = roles.iter().find(|role| status.rules().permits(role, target));

        let decision = match granting {
            Some(role) => Decision::Allowed { role: role.clone() },
            None => Decision::Denied,
        };

        debug!(
            kind = %self.kind,
            from = %current,
            to = %target,
            roles = %roles,
            decision = %decision,
            "Transition evaluated"
        );

        Ok(decision)
    }

    /// Returns true if an actor holding `roles` may move from `current` to `target`
    pub fn can_transition(
        &self,
        current: &StatusId,
        target: &StatusId,
        roles: &RoleSet,
    ) -> Result<bool, PolicyError> {
        self.evaluate(current, target, roles)
            .map(|decision| decision.is_allowed())
    }

    /// Returns every status an actor holding `roles` may move into from `current`
    ///
    /// The current status itself is not listed.
    pub fn allowed_targets(
        &self,
        current: &StatusId,
        roles: &RoleSet,
    ) -> Result<BTreeSet<StatusId>, PolicyError> {
        let status = self.lookup(current)?;
        Ok(roles
            .iter()
            .filter_map(|role| status.rules().targets_for(role))
            .flatten()
            .filter(|target| *target != current)
            .cloned()
            .collect())
    }

    fn lookup(&self, id: &StatusId) -> Result<&Status, PolicyError> {
        self.statuses.get(id).ok_or_else(|| PolicyError::UnknownStatus {
            kind: self.kind,
            status: id.clone(),
        })
    }
}

/// Rebuilds `status` without rule targets outside `known`
fn drop_unknown_targets(kind: EntityKind, status: Status, known: &BTreeSet<StatusId>) -> Status {
    let unknown: Vec<StatusId> = status
        .rules()
        .referenced_statuses()
        .into_iter()
        .filter(|target| !known.contains(*target))
        .cloned()
        .collect();
    if unknown.is_empty() {
        return status;
    }

    for target in &unknown {
        warn!(
            kind = %kind,
            status = %status.id(),
            target = %target,
            "Skipping rule target missing from catalog"
        );
    }

    let rules = status
        .rules()
        .iter()
        .fold(TransitionRules::new(), |rules, (role, targets)| {
            rules.with_rule(
                role.clone(),
                targets.iter().filter(|t| known.contains(*t)).cloned(),
            )
        });
    Status::new(status.id().clone(), status.title(), rules)
}

// ============================================================================
// PolicyRegistry
// ============================================================================

/// Transition policies of all workflow entity kinds
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: BTreeMap<EntityKind, StatusTransitionPolicy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the policy of the policy's kind
    pub fn with_policy(mut self, policy: StatusTransitionPolicy) -> Self {
        self.policies.insert(policy.kind(), policy);
        self
    }

    /// Compiles every status catalog in `config`
    ///
    /// Kinds without a catalog get no policy; updates touching their status
    /// then fail with `PolicyError::MissingRuleTable`.
    pub fn from_config(config: &Config) -> Result<Self, PolicyError> {
        let mut registry = Self::new();
        for kind in config.workflow.statuses.keys().copied() {
            let catalog = config
                .statuses_for(kind)
                .map_err(|e| PolicyError::InvalidDefinition {
                    kind,
                    reason: e.to_string(),
                })?;
            registry = registry.with_policy(StatusTransitionPolicy::new(kind, catalog)?);
        }
        Ok(registry)
    }

    /// Returns the policy of `kind`
    pub fn policy(&self, kind: EntityKind) -> Result<&StatusTransitionPolicy, PolicyError> {
        self.policies
            .get(&kind)
            .ok_or(PolicyError::MissingRuleTable(kind))
    }

    /// Shorthand for `policy(kind)?.can_transition(..)`
    pub fn can_transition(
        &self,
        kind: EntityKind,
        current: &StatusId,
        target: &StatusId,
        roles: &RoleSet,
    ) -> Result<bool, PolicyError> {
        self.policy(kind)?.can_transition(current, target, roles)
    }

    /// Iterates over the kinds that have a policy
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.policies.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use hrflow_core::config::{ConfigBuilder, StatusDefinition};

    use super::*;

    fn sid(s: &str) -> StatusId {
        StatusId::new(s).unwrap()
    }

    fn role(s: &str) -> RoleName {
        RoleName::new(s).unwrap()
    }

    fn roles(names: &[&str]) -> RoleSet {
        RoleSet::parse(names.iter().copied()).unwrap()
    }

    /// Catalog with the shape of the approval flow, using short ids
    fn sample_policy() -> StatusTransitionPolicy {
        let statuses = vec![
            Status::new(
                sid("OWNER_EDIT"),
                "Edited by owner",
                TransitionRules::new()
                    .with_rule(role("USER"), [sid("OWNER_ACCEPT")])
                    .with_rule(
                        role("HR"),
                        [sid("OWNER_ACCEPT"), sid("MANAGER_ACCEPT"), sid("HR_ACCEPT")],
                    ),
            ),
            Status::new(
                sid("OWNER_ACCEPT"),
                "Accepted by owner",
                TransitionRules::new()
                    .with_rule(
                        role("DEPARTMENT_MANAGER"),
                        [sid("OWNER_EDIT"), sid("MANAGER_ACCEPT")],
                    )
                    .with_rule(
                        role("HR"),
                        [sid("OWNER_EDIT"), sid("MANAGER_ACCEPT"), sid("HR_ACCEPT")],
                    ),
            ),
            Status::new(
                sid("MANAGER_ACCEPT"),
                "Accepted by manager",
                TransitionRules::new().with_rule(role("HR"), [sid("HR_ACCEPT")]),
            ),
            Status::new(sid("HR_ACCEPT"), "Accepted by HR", TransitionRules::new()),
        ];
        StatusTransitionPolicy::new(EntityKind::UserTimesheet, statuses).unwrap()
    }

    const ALL_ROLES: [&str; 4] = ["USER", "HR", "DEPARTMENT_MANAGER", "AUDITOR"];

    #[test]
    fn test_hr_may_jump_to_hr_accept() {
        let policy = sample_policy();
        assert!(policy
            .can_transition(&sid("OWNER_EDIT"), &sid("HR_ACCEPT"), &roles(&["HR"]))
            .unwrap());
    }

    #[test]
    fn test_user_may_not_jump_to_hr_accept() {
        let policy = sample_policy();
        assert!(!policy
            .can_transition(&sid("OWNER_EDIT"), &sid("HR_ACCEPT"), &roles(&["USER"]))
            .unwrap());
        assert_eq!(
            policy
                .evaluate(&sid("OWNER_EDIT"), &sid("HR_ACCEPT"), &roles(&["USER"]))
                .unwrap(),
            Decision::Denied
        );
    }

    #[test]
    fn test_manager_may_not_skip_to_hr_accept() {
        let policy = sample_policy();
        assert!(!policy
            .can_transition(
                &sid("OWNER_ACCEPT"),
                &sid("HR_ACCEPT"),
                &roles(&["DEPARTMENT_MANAGER"])
            )
            .unwrap());
    }

    #[test]
    fn test_self_transition_always_allowed() {
        let policy = sample_policy();
        for status in policy.statuses() {
            for name in ALL_ROLES {
                assert_eq!(
                    policy
                        .evaluate(status.id(), status.id(), &roles(&[name]))
                        .unwrap(),
                    Decision::NoOp,
                    "{} with {name}",
                    status.id()
                );
            }
        }
    }

    #[test]
    fn test_single_role_matches_rule_table() {
        let policy = sample_policy();
        for from in policy.statuses() {
            for to in policy.statuses() {
                if from.id() == to.id() {
                    continue;
                }
                for name in ALL_ROLES {
                    let expected = from.rules().permits(&role(name), to.id());
                    let actual = policy
                        .can_transition(from.id(), to.id(), &roles(&[name]))
                        .unwrap();
                    assert_eq!(actual, expected, "{} -> {} as {name}", from.id(), to.id());
                }
            }
        }
    }

    #[test]
    fn test_role_union() {
        let policy = sample_policy();
        for from in policy.statuses() {
            for to in policy.statuses() {
                for r1 in ALL_ROLES {
                    for r2 in ALL_ROLES {
                        let single = policy.can_transition(from.id(), to.id(), &roles(&[r1])).unwrap()
                            || policy.can_transition(from.id(), to.id(), &roles(&[r2])).unwrap();
                        let both = policy
                            .can_transition(from.id(), to.id(), &roles(&[r1, r2]))
                            .unwrap();
                        assert_eq!(both, single);
                    }
                }
            }
        }
    }

    #[test]
    fn test_allowed_reports_granting_role() {
        let policy = sample_policy();
        let decision = policy
            .evaluate(
                &sid("OWNER_ACCEPT"),
                &sid("HR_ACCEPT"),
                &roles(&["DEPARTMENT_MANAGER", "HR"]),
            )
            .unwrap();
        assert_eq!(decision, Decision::Allowed { role: role("HR") });
        assert_eq!(decision.to_string(), "allowed via HR");
    }

    #[test]
    fn test_empty_role_set_is_denied() {
        let policy = sample_policy();
        assert!(!policy
            .can_transition(&sid("OWNER_EDIT"), &sid("OWNER_ACCEPT"), &RoleSet::default())
            .unwrap());
    }

    #[test]
    fn test_unknown_current_status_is_error() {
        let policy = sample_policy();
        let err = policy
            .can_transition(&sid("ARCHIVED"), &sid("OWNER_EDIT"), &roles(&["HR"]))
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownStatus { .. }));
        assert!(!err.is_client_error());

        // Unknown current status fails even for a self-transition
        assert!(policy
            .can_transition(&sid("ARCHIVED"), &sid("ARCHIVED"), &roles(&["HR"]))
            .is_err());
    }

    #[test]
    fn test_unknown_target_is_client_error() {
        let policy = sample_policy();
        let err = policy
            .can_transition(&sid("OWNER_EDIT"), &sid("PAID"), &roles(&["HR"]))
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownTarget { .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_terminal_status_denies_everything() {
        let policy = sample_policy();
        assert!(policy.status(&sid("HR_ACCEPT")).unwrap().is_terminal());
        for name in ALL_ROLES {
            assert!(!policy
                .can_transition(&sid("HR_ACCEPT"), &sid("OWNER_EDIT"), &roles(&[name]))
                .unwrap());
        }
    }

    #[test]
    fn test_allowed_targets_is_union() {
        let policy = sample_policy();
        let targets = policy
            .allowed_targets(&sid("OWNER_ACCEPT"), &roles(&["DEPARTMENT_MANAGER", "HR"]))
            .unwrap();
        let expected: BTreeSet<StatusId> = [sid("OWNER_EDIT"), sid("MANAGER_ACCEPT"), sid("HR_ACCEPT")]
            .into_iter()
            .collect();
        assert_eq!(targets, expected);

        let targets = policy
            .allowed_targets(&sid("OWNER_EDIT"), &roles(&["AUDITOR"]))
            .unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_duplicate_status_rejected() {
        let result = StatusTransitionPolicy::new(
            EntityKind::UserTimesheet,
            vec![
                Status::new(sid("A"), "A", TransitionRules::new()),
                Status::new(sid("A"), "A again", TransitionRules::new()),
            ],
        );
        assert!(matches!(result, Err(PolicyError::DuplicateStatus { .. })));
    }

    #[test]
    fn test_unknown_rule_targets_are_dropped() {
        let policy = StatusTransitionPolicy::new(
            EntityKind::UserWorkSchedule,
            vec![
                Status::new(
                    sid("A"),
                    "A",
                    TransitionRules::new().with_rule(role("HR"), [sid("B"), sid("GHOST")]),
                ),
                Status::new(sid("B"), "B", TransitionRules::new()),
            ],
        )
        .unwrap();

        let rules = policy.status(&sid("A")).unwrap().rules();
        assert!(rules.permits(&role("HR"), &sid("B")));
        assert!(!rules.permits(&role("HR"), &sid("GHOST")));
    }

    #[test]
    fn test_statuses_keep_catalog_order() {
        let policy = sample_policy();
        let ids: Vec<&str> = policy.statuses().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, ["OWNER_EDIT", "OWNER_ACCEPT", "MANAGER_ACCEPT", "HR_ACCEPT"]);
        assert_eq!(policy.len(), 4);
    }

    #[test]
    fn test_decision_serializes_with_tag() {
        let json = serde_json::to_string(&Decision::Allowed { role: role("HR") }).unwrap();
        assert_eq!(json, r#"{"decision":"allowed","role":"HR"}"#);
        let json = serde_json::to_string(&Decision::Denied).unwrap();
        assert_eq!(json, r#"{"decision":"denied"}"#);
    }

    // -- Registry --

    #[test]
    fn test_registry_from_default_config() {
        let registry = PolicyRegistry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.kinds().count(), 2);

        let user = roles(&["ROLE_USER"]);
        assert!(registry
            .can_transition(
                EntityKind::UserTimesheet,
                &sid("TIMESHEET-STATUS-OWNER-EDIT"),
                &sid("TIMESHEET-STATUS-OWNER-ACCEPT"),
                &user,
            )
            .unwrap());
        assert!(!registry
            .can_transition(
                EntityKind::UserWorkSchedule,
                &sid("WORK-SCHEDULE-STATUS-OWNER-EDIT"),
                &sid("WORK-SCHEDULE-STATUS-HR-ACCEPT"),
                &user,
            )
            .unwrap());
    }

    #[test]
    fn test_registry_kinds_do_not_share_catalogs() {
        let registry = PolicyRegistry::from_config(&Config::default()).unwrap();
        let err = registry
            .can_transition(
                EntityKind::UserWorkSchedule,
                &sid("TIMESHEET-STATUS-OWNER-EDIT"),
                &sid("TIMESHEET-STATUS-OWNER-ACCEPT"),
                &roles(&["ROLE_HR"]),
            )
            .unwrap_err();
        assert!(matches!(err, PolicyError::UnknownStatus { .. }));
    }

    #[test]
    fn test_registry_missing_rule_table() {
        let registry = PolicyRegistry::new().with_policy(sample_policy());
        let err = registry.policy(EntityKind::UserWorkSchedule).unwrap_err();
        assert_eq!(err, PolicyError::MissingRuleTable(EntityKind::UserWorkSchedule));
    }

    #[test]
    fn test_registry_rejects_malformed_definition() {
        let config = ConfigBuilder::new()
            .statuses(
                EntityKind::UserTimesheet,
                vec![StatusDefinition::new("BAD ID", "Bad", &[])],
            )
            .build();
        let err = PolicyRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidDefinition { .. }));
    }
}
