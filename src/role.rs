//! Role definitions, validated against the statement registry

use std::collections::BTreeMap;

use crate::error::{RbacError, Result};
use crate::statement::{Action, ActionMap, Resource, Statements};

/// Name of the role that bypasses every statement check.
pub const SUPER_ROLE: &str = "admin";

/// A named, flat bundle of grants. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    name: String,
    grants: ActionMap,
}

impl Role {
    pub fn builder(name: impl Into<String>) -> RoleBuilder {
        RoleBuilder { name: name.into(), grants: ActionMap::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grants(&self) -> &ActionMap {
        &self.grants
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.grants.get(&resource).is_some_and(|a| a.contains(&action))
    }
}

/// Accumulates grants for a role before validation.
///
/// `extend` copies another role's grants in; nothing links back to the base
/// role afterwards.
#[derive(Debug, Clone)]
pub struct RoleBuilder {
    name: String,
    grants: ActionMap,
}

impl RoleBuilder {
    pub fn extend(mut self, base: &Role) -> Self {
        for (resource, actions) in &base.grants {
            self.grants.entry(*resource).or_default().extend(actions.iter().copied());
        }
        self
    }

    pub fn grant(mut self, resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        self.grants.entry(resource).or_default().extend(actions);
        self
    }

    /// Grant every legal action of every resource in `statements`.
    pub fn grant_all(mut self, statements: &Statements) -> Self {
        for (resource, actions) in statements.as_map() {
            self.grants.entry(*resource).or_default().extend(actions.iter().copied());
        }
        self
    }

    /// Validate every grant and produce the role.
    pub fn build(self, statements: &Statements) -> Result<Role> {
        for (resource, actions) in &self.grants {
            if let Some(action) = actions.iter().find(|a| !statements.allows(*resource, **a)) {
                return Err(RbacError::InvalidGrant {
                    role: self.name,
                    resource: *resource,
                    action: *action,
                });
            }
        }
        let mut grants = self.grants;
        grants.retain(|_, a| !a.is_empty());
        Ok(Role { name: self.name, grants })
    }
}

/// The closed set of known roles.
#[derive(Debug, Clone, Default)]
pub struct Roles {
    by_name: BTreeMap<String, Role>,
}

impl Roles {
    pub fn new(statements: &Statements, builders: impl IntoIterator<Item = RoleBuilder>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for b in builders {
            let role = b.build(statements)?;
            if by_name.contains_key(role.name()) {
                return Err(RbacError::DuplicateRole(role.name));
            }
            by_name.insert(role.name.clone(), role);
        }
        Ok(Roles { by_name })
    }

    /// `admin`, `verifiedUser`, `mentor` and `judge`.
    pub fn hackathon(statements: &Statements) -> Result<Self> {
        use Action::*;
        let verified = Role::builder("verifiedUser")
            .grant(Resource::Profile, [Create, View, Update])
            .grant(Resource::Team, [Create, View, Update, Join, Invite, Remove, Leave])
            .grant(Resource::Ticket, [Create, View, Update])
            .build(statements)?;
        let mentor = Role::builder("mentor")
            .extend(&verified)
            .grant(Resource::AnyTicket, [List, View, Update])
            .grant(Resource::AnyTeam, [List, View])
            .grant(Resource::AnyProfile, [View]);
        let judge = Role::builder("judge")
            .extend(&verified)
            .grant(Resource::AnyTeam, [List, View])
            .grant(Resource::AnyProfile, [View])
            .grant(Resource::Judging, [View, Score]);
        Roles::new(
            statements,
            [
                Role::builder(SUPER_ROLE).grant_all(statements),
                Role::builder("verifiedUser").extend(&verified),
                mentor,
                judge,
            ],
        )
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.by_name.values()
    }
}
