//! Guards: reusable "require X before running Y" checks over a request
//!
//! Authentication presence is checked before any permission, and the two
//! failures are distinct errors so callers can answer 401 vs 403.

use thiserror::Error;
use tracing::debug;

use crate::authorize::{AccessControl, PermissionQuery};
use crate::roleset::RoleSet;

/// The authenticated actor for a request, roles already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: u64,
    pub name: String,
    pub roles: RoleSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(String),
}

/// Request-scoped view: the shared access control plus the caller, if any.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub acl: &'a AccessControl,
    pub principal: Option<&'a Principal>,
}

impl<'a> RequestContext<'a> {
    pub fn new(acl: &'a AccessControl, principal: Option<&'a Principal>) -> Self {
        RequestContext { acl, principal }
    }

    pub fn principal(&self) -> Result<&'a Principal, GuardError> {
        self.principal.ok_or(GuardError::Unauthenticated)
    }

    /// Run `op` with the principal if `guard` passes.
    pub fn guarded<G, T, F>(&self, guard: &G, op: F) -> Result<T, GuardError>
    where
        G: Guard + ?Sized,
        F: FnOnce(&'a Principal) -> T,
    {
        guard.check(self)?;
        Ok(op(self.principal()?))
    }
}

pub trait Guard {
    fn check(&self, cx: &RequestContext<'_>) -> Result<(), GuardError>;

    /// Run `self`, then `next`.
    fn and<G: Guard>(self, next: G) -> And<Self, G>
    where
        Self: Sized,
    {
        And(self, next)
    }
}

/// Passes when any principal is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

impl Guard for Authenticated {
    fn check(&self, cx: &RequestContext<'_>) -> Result<(), GuardError> {
        cx.principal().map(|_| ())
    }
}

/// Authenticated, and the principal's roles satisfy the query.
#[derive(Debug, Clone)]
pub struct Require(pub PermissionQuery);

impl Guard for Require {
    fn check(&self, cx: &RequestContext<'_>) -> Result<(), GuardError> {
        let p = cx.principal()?;
        let res = cx.acl.authorize(&p.roles, &self.0);
        if res.success {
            return Ok(());
        }
        debug!(user = p.id, shortfalls = ?res.shortfalls, "guard denied");
        Err(GuardError::Forbidden("insufficient permissions".into()))
    }
}

/// Authenticated, and an arbitrary predicate over the principal holds
/// (e.g. membership of a specific team).
pub struct Check<F> {
    reason: &'static str,
    pred: F,
}

impl<F: Fn(&Principal) -> bool> Check<F> {
    pub fn new(reason: &'static str, pred: F) -> Self {
        Check { reason, pred }
    }
}

impl<F: Fn(&Principal) -> bool> Guard for Check<F> {
    fn check(&self, cx: &RequestContext<'_>) -> Result<(), GuardError> {
        if (self.pred)(cx.principal()?) {
            Ok(())
        } else {
            Err(GuardError::Forbidden(self.reason.into()))
        }
    }
}

/// Two guards in sequence; the first failure wins.
#[derive(Debug, Clone)]
pub struct And<A, B>(A, B);

impl<A: Guard, B: Guard> Guard for And<A, B> {
    fn check(&self, cx: &RequestContext<'_>) -> Result<(), GuardError> {
        self.0.check(cx)?;
        self.1.check(cx)
    }
}

impl<G: Guard + ?Sized> Guard for &G {
    fn check(&self, cx: &RequestContext<'_>) -> Result<(), GuardError> {
        (**self).check(cx)
    }
}
