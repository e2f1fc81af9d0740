//! The ordered set of specialists a supervisor can dispatch to.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::SpecialistRole;
use crate::services::specialist::SpecialistAgent;

/// Specialists in registration order, unique by role name.
#[derive(Default)]
pub struct Team {
    members: Vec<Arc<SpecialistAgent>>,
}

impl Team {
    /// Empty team.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a specialist; a second agent with the same role name is rejected.
    pub fn add(&mut self, agent: SpecialistAgent) -> DomainResult<()> {
        if self.members.iter().any(|m| m.role_name() == agent.role_name()) {
            return Err(DomainError::ValidationFailed(format!(
                "team already has an agent named '{}'",
                agent.role_name()
            )));
        }
        self.members.push(Arc::new(agent));
        Ok(())
    }

    /// Agent for `role`, if registered.
    pub fn get(&self, role: SpecialistRole) -> Option<Arc<SpecialistAgent>> {
        self.members.iter().find(|m| m.role() == role).cloned()
    }

    /// Registered agents.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SpecialistAgent>> {
        self.members.iter()
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Names of the registered agents, for logging.
    pub fn role_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.role_name()).collect()
    }
}
