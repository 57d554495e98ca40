//! Statement registry: resource kinds and the actions legal on each

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A protected resource kind.
///
/// Kinds prefixed with `any` apply to every instance of the resource, the
/// others to instances the principal owns. The evaluator does not look at
/// the prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Configuration,
    AnyTeam,
    Team,
    AnyProfile,
    Profile,
    AnyTicket,
    Ticket,
    AnyUser,
    Judging,
}

/// An operation performable on a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    View,
    List,
    Create,
    Update,
    Delete,
    Join,
    Invite,
    Remove,
    Leave,
    SetRole,
    Ban,
    Score,
}

impl Resource {
    pub const ALL: [Resource; 9] = [
        Resource::Configuration,
        Resource::AnyTeam,
        Resource::Team,
        Resource::AnyProfile,
        Resource::Profile,
        Resource::AnyTicket,
        Resource::Ticket,
        Resource::AnyUser,
        Resource::Judging,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Configuration => "configuration",
            Resource::AnyTeam => "anyTeam",
            Resource::Team => "team",
            Resource::AnyProfile => "anyProfile",
            Resource::Profile => "profile",
            Resource::AnyTicket => "anyTicket",
            Resource::Ticket => "ticket",
            Resource::AnyUser => "anyUser",
            Resource::Judging => "judging",
        }
    }

    /// True for the "applies to all instances" kinds.
    pub fn is_administrative(self) -> bool {
        self.as_str().starts_with("any")
    }
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::View,
        Action::List,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Join,
        Action::Invite,
        Action::Remove,
        Action::Leave,
        Action::SetRole,
        Action::Ban,
        Action::Score,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Join => "join",
            Action::Invite => "invite",
            Action::Remove => "remove",
            Action::Leave => "leave",
            Action::SetRole => "setRole",
            Action::Ban => "ban",
            Action::Score => "score",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = ();

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Resource::ALL.into_iter().find(|r| r.as_str() == value).ok_or(())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Action::ALL.into_iter().find(|a| a.as_str() == value).ok_or(())
    }
}

/// Resource kind -> set of actions. Shared shape of statements, role grants
/// and permission queries.
pub type ActionMap = BTreeMap<Resource, BTreeSet<Action>>;

/// The closed universe of legal (resource, action) pairs.
///
/// Built once at startup and never mutated; every role grant is validated
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statements {
    legal: ActionMap,
}

impl Statements {
    pub fn new<I, A>(statements: I) -> Self
    where
        I: IntoIterator<Item = (Resource, A)>,
        A: IntoIterator<Item = Action>,
    {
        let mut legal = ActionMap::new();
        for (resource, actions) in statements {
            legal.entry(resource).or_default().extend(actions);
        }
        Statements { legal }
    }

    /// The hackathon vocabulary.
    pub fn hackathon() -> Self {
        use Action::*;
        Statements::new([
            (Resource::Configuration, vec![View, Update]),
            (Resource::AnyTeam, vec![List, View, Update, Delete]),
            (Resource::Team, vec![Create, View, Update, Delete, Join, Invite, Remove, Leave]),
            (Resource::AnyProfile, vec![List, View, Update, Delete]),
            (Resource::Profile, vec![Create, View, Update]),
            (Resource::AnyTicket, vec![List, View, Update, Delete]),
            (Resource::Ticket, vec![Create, View, Update]),
            (Resource::AnyUser, vec![List, View, SetRole, Ban, Delete]),
            (Resource::Judging, vec![View, Score]),
        ])
    }

    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.legal.get(&resource).is_some_and(|a| a.contains(&action))
    }

    /// Legal actions for a resource, if the resource has any statements.
    pub fn actions(&self, resource: Resource) -> Option<&BTreeSet<Action>> {
        self.legal.get(&resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.legal.keys().copied()
    }

    pub fn as_map(&self) -> &ActionMap {
        &self.legal
    }
}
