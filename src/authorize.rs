//! Authorization evaluator
//!
//! A held role satisfies a query only if that one role covers every
//! requested action on every requested resource. Grants are never merged
//! across roles, so `{profile: [view]}` + `{profile: [update]}` does not
//! satisfy `{profile: [view, update]}`. Roles are tried in held order and
//! the first full match wins. Holding [`SUPER_ROLE`] allows everything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::role::{Role, Roles, SUPER_ROLE};
use crate::roleset::RoleSet;
use crate::statement::{Action, ActionMap, Resource, Statements};

/// Requested actions per resource kind, built per check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionQuery(ActionMap);

impl PermissionQuery {
    pub fn new() -> Self {
        PermissionQuery(ActionMap::new())
    }

    /// Shorthand for a single-resource query.
    pub fn on(resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        PermissionQuery::new().and(resource, actions)
    }

    pub fn and(mut self, resource: Resource, actions: impl IntoIterator<Item = Action>) -> Self {
        self.0.entry(resource).or_default().extend(actions);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, &BTreeSet<Action>)> {
        self.0.iter().map(|(r, a)| (*r, a))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The roles an authorization check is made for.
#[derive(Debug, Clone, Copy)]
pub enum Held<'a> {
    /// One role name.
    Role(&'a str),
    /// A raw comma-joined role string, decoded on entry.
    Roles(&'a str),
    /// An already decoded role set.
    Set(&'a RoleSet),
}

impl<'a> From<&'a str> for Held<'a> {
    fn from(raw: &'a str) -> Self {
        Held::Roles(raw)
    }
}

impl<'a> From<&'a RoleSet> for Held<'a> {
    fn from(set: &'a RoleSet) -> Self {
        Held::Set(set)
    }
}

/// Why one held role did not satisfy the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Shortfall {
    /// The principal holds no roles at all.
    NoRoles,
    /// The role name is not in the role table.
    UnknownRole { role: String },
    /// The role lacks this action.
    Missing { role: String, resource: Resource, action: Action },
}

/// Allow/deny, plus per-role reasons on denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<Shortfall>,
}

impl AuthorizationResult {
    fn allow() -> Self {
        AuthorizationResult { success: true, shortfalls: Vec::new() }
    }

    fn deny(shortfalls: Vec<Shortfall>) -> Self {
        AuthorizationResult { success: false, shortfalls }
    }
}

/// First (resource, action) the role lacks, or None if it covers the query.
fn first_missing(role: &Role, query: &PermissionQuery) -> Option<(Resource, Action)> {
    query
        .iter()
        .flat_map(|(r, actions)| actions.iter().map(move |a| (r, *a)))
        .find(|(r, a)| !role.allows(*r, *a))
}

/// Immutable authorization configuration: statements plus role table.
///
/// Built once at startup and shared (typically behind an `Arc`); evaluation
/// is read-only.
#[derive(Debug, Clone)]
pub struct AccessControl {
    statements: Statements,
    roles: Roles,
}

impl AccessControl {
    pub fn new(statements: Statements, roles: Roles) -> Self {
        AccessControl { statements, roles }
    }

    /// Hackathon statements and roles.
    pub fn hackathon() -> Result<Self> {
        let statements = Statements::hackathon();
        let roles = Roles::hackathon(&statements)?;
        Ok(AccessControl::new(statements, roles))
    }

    pub fn statements(&self) -> &Statements {
        &self.statements
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn is_known_role(&self, name: &str) -> bool {
        self.roles.contains(name)
    }

    /// May a principal holding `held` perform everything in `query`?
    pub fn authorize<'a>(&self, held: impl Into<Held<'a>>, query: &PermissionQuery) -> AuthorizationResult {
        let decoded;
        let set = match held.into() {
            Held::Role(name) => {
                decoded = std::iter::once(name).collect::<RoleSet>();
                &decoded
            }
            Held::Roles(raw) => {
                decoded = RoleSet::decode(raw);
                &decoded
            }
            Held::Set(set) => set,
        };
        self.evaluate(set, query)
    }

    fn evaluate(&self, set: &RoleSet, query: &PermissionQuery) -> AuthorizationResult {
        if set.is_empty() {
            debug!("denied: no roles held");
            return AuthorizationResult::deny(vec![Shortfall::NoRoles]);
        }
        if set.contains(SUPER_ROLE) {
            debug!(roles = %set, "allowed: super role");
            return AuthorizationResult::allow();
        }
        let mut shortfalls = Vec::with_capacity(set.len());
        for name in set {
            let Some(role) = self.roles.get(name) else {
                debug!(role = name, "skipping unknown role");
                shortfalls.push(Shortfall::UnknownRole { role: name.to_string() });
                continue;
            };
            match first_missing(role, query) {
                None => {
                    debug!(role = name, "allowed");
                    return AuthorizationResult::allow();
                }
                Some((resource, action)) => shortfalls.push(Shortfall::Missing {
                    role: name.to_string(),
                    resource,
                    action,
                }),
            }
        }
        debug!(roles = %set, "denied: no single role covers the query");
        AuthorizationResult::deny(shortfalls)
    }
}
