//! CLI subcommands

pub mod check;
pub mod config;
pub mod replay;
pub mod statuses;
pub mod targets;

use anyhow::{Context, Result};
use hrflow_core::config::Config;
use hrflow_core::domain::{Actor, ActorId, RoleSet};
use hrflow_policy::PolicyRegistry;

/// Builds an actor holding `roles` plus the configured default role
///
/// With `exact` set, the default role is not added.
pub(crate) fn build_actor(config: &Config, id: &str, roles: &[String], exact: bool) -> Result<Actor> {
    let id = ActorId::new(id).context("Invalid actor name")?;
    let roles = RoleSet::parse(roles.iter().cloned()).context("Invalid role name")?;
    if exact {
        return Ok(Actor::with_exact_roles(id, roles));
    }
    let default_role = config
        .default_role()
        .context("Invalid workflow.default_role in configuration")?;
    Ok(Actor::with_default_role(id, roles, default_role))
}

/// Compiles the configured status catalogs
pub(crate) fn load_policies(config: &Config) -> Result<PolicyRegistry> {
    PolicyRegistry::from_config(config).context("Invalid status catalog in configuration")
}
