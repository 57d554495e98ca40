//! hackrbac - statement-based role access control for hackathon management
//!
//! - [`Statements`]: the fixed resource -> legal actions table
//! - [`Roles`]: named grant bundles validated against the statements
//! - [`RoleSet`]: the comma-joined role string stored on a user record
//! - [`AccessControl::authorize`]: may a role set perform a [`PermissionQuery`]?
//! - [`Guard`]s: authentication then permission checks in front of an operation
//! - [`Store`]: LMDB-backed users and sessions, the persistence side of role sets
//!
//! ```
//! use hackrbac::{AccessControl, Action, PermissionQuery, Resource};
//!
//! let acl = AccessControl::hackathon().unwrap();
//! let q = PermissionQuery::on(Resource::Profile, [Action::Create, Action::Update]);
//! assert!(acl.authorize("verifiedUser", &q).success);
//! assert!(!acl.authorize("verifiedUser", &PermissionQuery::on(Resource::Configuration, [Action::View])).success);
//! ```

pub mod authorize;
pub mod config;
pub mod error;
pub mod guard;
pub mod role;
pub mod roleset;
pub mod session;
pub mod statement;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

pub use authorize::{AccessControl, AuthorizationResult, Held, PermissionQuery, Shortfall};
pub use config::ServerConfig;
pub use error::{RbacError, Result};
pub use guard::{And, Authenticated, Check, Guard, GuardError, Principal, RequestContext, Require};
pub use role::{Role, RoleBuilder, Roles, SUPER_ROLE};
pub use roleset::{add_role, remove_role, RoleSet};
pub use session::{generate_token, PrincipalSource};
pub use statement::{Action, ActionMap, Resource, Statements};
pub use store::Store;
