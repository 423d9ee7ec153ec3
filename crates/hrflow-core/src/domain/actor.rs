//! Acting principal and its role set
//!
//! The identity collaborator resolves who is making a request; the core only
//! sees the resulting [`Actor`]. An actor is passed explicitly into every
//! policy check and audit capture instead of being cached between requests.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{ActorId, RoleName};

/// Role every authenticated principal holds
pub const DEFAULT_ROLE: &str = "ROLE_USER";

/// The set of role names held by an actor for the duration of one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleName>);

impl RoleSet {
    /// Creates a role set holding exactly `roles`
    pub fn from_roles(roles: impl IntoIterator<Item = RoleName>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// Parses role names, rejecting malformed ones
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRole` for the first malformed name.
    pub fn parse<I, S>(names: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(RoleName::new)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    /// Adds a role; returns true if it was not already present
    pub fn insert(&mut self, role: RoleName) -> bool {
        self.0.insert(role)
    }

    /// Returns true if the set holds `role`
    pub fn contains(&self, role: &RoleName) -> bool {
        self.0.contains(role)
    }

    /// Iterates over the held roles in name order
    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(RoleName::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

impl FromIterator<RoleName> for RoleSet {
    fn from_iter<T: IntoIterator<Item = RoleName>>(iter: T) -> Self {
        Self::from_roles(iter)
    }
}

/// The acting principal of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    roles: RoleSet,
}

impl Actor {
    /// Creates an actor, guaranteeing the default role is held
    pub fn new(id: ActorId, roles: RoleSet) -> Self {
        Self::with_default_role(id, roles, RoleName::default_user())
    }

    /// Creates an actor, guaranteeing `default_role` is held
    pub fn with_default_role(id: ActorId, mut roles: RoleSet, default_role: RoleName) -> Self {
        roles.insert(default_role);
        Self { id, roles }
    }

    /// Creates an actor holding exactly `roles`
    pub fn with_exact_roles(id: ActorId, roles: RoleSet) -> Self {
        Self { id, roles }
    }

    /// Returns the actor identifier
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Returns the held roles
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(s: &str) -> RoleName {
        RoleName::new(s).unwrap()
    }

    #[test]
    fn test_actor_always_holds_default_role() {
        let actor = Actor::new(
            ActorId::new("anowak").unwrap(),
            RoleSet::from_roles([role("ROLE_HR")]),
        );
        assert!(actor.roles().contains(&role(DEFAULT_ROLE)));
        assert!(actor.roles().contains(&role("ROLE_HR")));
        assert_eq!(actor.roles().len(), 2);
    }

    #[test]
    fn test_default_role_not_duplicated() {
        let actor = Actor::new(
            ActorId::new("anowak").unwrap(),
            RoleSet::from_roles([role(DEFAULT_ROLE)]),
        );
        assert_eq!(actor.roles().len(), 1);
    }

    #[test]
    fn test_custom_default_role() {
        let actor = Actor::with_default_role(
            ActorId::new("anowak").unwrap(),
            RoleSet::default(),
            role("ROLE_EMPLOYEE"),
        );
        assert!(actor.roles().contains(&role("ROLE_EMPLOYEE")));
        assert!(!actor.roles().contains(&role(DEFAULT_ROLE)));
    }

    #[test]
    fn test_exact_roles() {
        let actor = Actor::with_exact_roles(
            ActorId::new("anowak").unwrap(),
            RoleSet::from_roles([role("HR")]),
        );
        assert_eq!(actor.roles().len(), 1);
    }

    #[test]
    fn test_role_set_parse() {
        let roles = RoleSet::parse(["ROLE_HR", "ROLE_DEPARTMENT_MANAGER"]).unwrap();
        assert_eq!(roles.len(), 2);
        assert!(RoleSet::parse(["ROLE_HR", ""]).is_err());
    }

    #[test]
    fn test_role_set_display() {
        let roles = RoleSet::parse(["ROLE_USER", "ROLE_HR"]).unwrap();
        assert_eq!(roles.to_string(), "{ROLE_HR, ROLE_USER}");
    }
}
