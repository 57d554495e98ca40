//! HTTP surface (feature `server`)
//!
//! Endpoints:
//!   GET    /health                 - liveness
//!   POST   /bootstrap              - create first (admin) user, returns token
//!   POST   /users                  - register a user with no roles, returns token
//!   GET    /users                  - list users              (anyUser:list)
//!   GET    /me                     - caller                  (authenticated)
//!   DELETE /sessions               - revoke caller's token   (authenticated)
//!   POST   /users/:id/roles        - add role                (anyUser:setRole)
//!   DELETE /users/:id/roles/:role  - remove role             (anyUser:setRole)
//!   POST   /authorize              - evaluate a query for the caller (authenticated)
//!   GET    /configuration          - hackathon settings      (configuration:view)
//!   PUT    /configuration          - replace settings        (configuration:update)
//!
//! Callers authenticate with `Authorization: Bearer <token>`. A missing or
//! unknown token answers 401, a failed permission check 403.

use std::sync::{Arc, RwLock};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{
    AccessControl, Action, AuthorizationResult, Authenticated, GuardError, PermissionQuery, Principal,
    PrincipalSource, RbacError, RequestContext, Require, Resource, Store,
};

// ============================================================================
// State
// ============================================================================

/// Hackathon-wide settings edited through `/configuration`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HackathonSettings {
    pub name: String,
    pub registration_open: bool,
    pub max_team_size: u32,
}

impl Default for HackathonSettings {
    fn default() -> Self {
        HackathonSettings { name: "Hackathon".into(), registration_open: true, max_team_size: 4 }
    }
}

#[derive(Clone)]
pub struct AppState {
    acl: Arc<AccessControl>,
    store: Store,
    settings: Arc<RwLock<HackathonSettings>>,
    session_ttl: Option<u64>,
}

impl AppState {
    pub fn new(acl: Arc<AccessControl>, store: Store, session_ttl: Option<u64>) -> Self {
        AppState { acl, store, settings: Arc::default(), session_ttl }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct NameReq {
    name: String,
}

#[derive(Deserialize)]
struct RoleReq {
    role: String,
}

#[derive(Deserialize)]
struct AuthorizeReq {
    permissions: PermissionQuery,
}

#[derive(Serialize)]
struct SessionRes {
    user_id: u64,
    token: String,
}

#[derive(Serialize)]
struct UserInfo {
    id: u64,
    name: String,
    roles: Vec<String>,
}

impl From<Principal> for UserInfo {
    fn from(p: Principal) -> Self {
        let roles = p.roles.iter().map(String::from).collect();
        UserInfo { id: p.id, name: p.name, roles }
    }
}

#[derive(Serialize)]
struct HealthRes {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

/// Failure answered to the client with a status and the envelope.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(ApiResponse::<()>::err(self.1))).into_response()
    }
}

impl From<GuardError> for ApiError {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::Unauthenticated => ApiError(StatusCode::UNAUTHORIZED, e.to_string()),
            GuardError::Forbidden(_) => ApiError(StatusCode::FORBIDDEN, e.to_string()),
        }
    }
}

impl From<RbacError> for ApiError {
    fn from(e: RbacError) -> Self {
        let status = match &e {
            RbacError::UserNotFound(_) => StatusCode::NOT_FOUND,
            RbacError::UserExists(_) | RbacError::AlreadyBootstrapped => StatusCode::CONFLICT,
            _ => {
                error!(error = %e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError(status, e.to_string())
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

// ============================================================================
// Helpers
// ============================================================================

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ").map(str::trim)
}

/// Principal behind the request's bearer token, if any.
fn caller(state: &AppState, headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    match bearer(headers) {
        Some(token) => Ok(state.store.principal(token)?),
        None => Ok(None),
    }
}

fn require(resource: Resource, action: Action) -> Require {
    Require(PermissionQuery::on(resource, [action]))
}

/// Longest accepted user name, in characters. Names are LMDB keys.
pub const MAX_NAME_LEN: usize = 64;

fn valid_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError(StatusCode::BAD_REQUEST, "name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError(StatusCode::BAD_REQUEST, format!("name longer than {MAX_NAME_LEN} characters")));
    }
    Ok(name)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthRes> {
    Json(HealthRes { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

async fn post_bootstrap(State(s): State<AppState>, Json(req): Json<NameReq>) -> ApiResult<SessionRes> {
    let user_id = s.store.bootstrap(valid_name(&req.name)?)?;
    let token = s.store.create_session(user_id, s.session_ttl)?;
    ok(SessionRes { user_id, token })
}

async fn post_user(State(s): State<AppState>, Json(req): Json<NameReq>) -> ApiResult<SessionRes> {
    let open = s.settings.read().unwrap_or_else(|p| p.into_inner()).registration_open;
    if !open {
        return Err(ApiError(StatusCode::FORBIDDEN, "registration is closed".into()));
    }
    let user_id = s.store.create_user(valid_name(&req.name)?)?;
    let token = s.store.create_session(user_id, s.session_ttl)?;
    ok(SessionRes { user_id, token })
}

async fn get_users(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<Vec<UserInfo>> {
    let p = caller(&s, &headers)?;
    RequestContext::new(&s.acl, p.as_ref()).guarded(&require(Resource::AnyUser, Action::List), |_| ())?;
    ok(s.store.list_users()?.into_iter().map(UserInfo::from).collect())
}

async fn get_me(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<UserInfo> {
    let p = caller(&s, &headers)?;
    let me = RequestContext::new(&s.acl, p.as_ref()).guarded(&Authenticated, Principal::clone)?;
    ok(me.into())
}

async fn delete_session(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<bool> {
    let p = caller(&s, &headers)?;
    RequestContext::new(&s.acl, p.as_ref()).guarded(&Authenticated, |_| ())?;
    let token = bearer(&headers).unwrap_or_default();
    ok(s.store.revoke_session(token)?)
}

async fn post_role(
    State(s): State<AppState>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<RoleReq>,
) -> ApiResult<Vec<String>> {
    let p = caller(&s, &headers)?;
    let actor = RequestContext::new(&s.acl, p.as_ref())
        .guarded(&require(Resource::AnyUser, Action::SetRole), |p| p.id)?;
    if !s.acl.is_known_role(&req.role) {
        return Err(ApiError(StatusCode::BAD_REQUEST, format!("unknown role {}", req.role)));
    }
    let roles = s.store.add_role(id, &req.role)?;
    info!(actor, user = id, role = %req.role, "role granted");
    ok(roles.iter().map(String::from).collect())
}

async fn delete_role(
    State(s): State<AppState>,
    Path((id, role)): Path<(u64, String)>,
    headers: HeaderMap,
) -> ApiResult<Vec<String>> {
    let p = caller(&s, &headers)?;
    let actor = RequestContext::new(&s.acl, p.as_ref())
        .guarded(&require(Resource::AnyUser, Action::SetRole), |p| p.id)?;
    let roles = s.store.remove_role(id, &role)?;
    info!(actor, user = id, role = %role, "role revoked");
    ok(roles.iter().map(String::from).collect())
}

async fn post_authorize(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AuthorizeReq>,
) -> ApiResult<AuthorizationResult> {
    let p = caller(&s, &headers)?;
    let res = RequestContext::new(&s.acl, p.as_ref())
        .guarded(&Authenticated, |p| s.acl.authorize(&p.roles, &req.permissions))?;
    ok(res)
}

async fn get_configuration(State(s): State<AppState>, headers: HeaderMap) -> ApiResult<HackathonSettings> {
    let p = caller(&s, &headers)?;
    RequestContext::new(&s.acl, p.as_ref()).guarded(&require(Resource::Configuration, Action::View), |_| ())?;
    ok(s.settings.read().unwrap_or_else(|p| p.into_inner()).clone())
}

async fn put_configuration(
    State(s): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<HackathonSettings>,
) -> ApiResult<HackathonSettings> {
    let p = caller(&s, &headers)?;
    let actor = RequestContext::new(&s.acl, p.as_ref())
        .guarded(&require(Resource::Configuration, Action::Update), |p| p.id)?;
    *s.settings.write().unwrap_or_else(|p| p.into_inner()) = req.clone();
    info!(actor, "configuration updated");
    ok(req)
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/health", get(health))
        .route("/bootstrap", post(post_bootstrap))
        .route("/users", post(post_user).get(get_users))
        .route("/me", get(get_me))
        .route("/sessions", delete(delete_session))
        .route("/users/:id/roles", post(post_role))
        .route("/users/:id/roles/:role", delete(delete_role))
        .route("/authorize", post(post_authorize))
        .route("/configuration", get(get_configuration).put(put_configuration))
        .layer(cors)
        .with_state(state)
}
