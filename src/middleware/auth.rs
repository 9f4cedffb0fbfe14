use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use moka::sync::Cache; // ✅ High-performance TTL Cache
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::db::models::request::ServerRequest;
use crate::db::models::role::Role;
use crate::db::models::user::User;
use crate::error::AppError;

/// ✅ **Authenticated caller, resolved from the token and the stored account**
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub user_id: i32,
    #[serde(rename = "nama")]
    pub name: String,
    pub role: Role,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

impl Principal {
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// ✅ **403 unless the caller holds one of `roles`**
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if self.has_role(roles) {
            return Ok(());
        }
        warn!("⛔ User {} ({}) denied, requires one of {:?}", self.user_id, self.role, roles);
        Err(AppError::forbidden("Forbidden."))
    }

    /// Requesters only see their own requests; every other role may read any request.
    pub fn can_access(&self, request: &ServerRequest) -> bool {
        self.role != Role::Requester || request.owner_id == self.user_id
    }

    pub fn ensure_access(&self, request: &ServerRequest) -> Result<(), AppError> {
        if self.can_access(request) {
            return Ok(());
        }
        warn!("⛔ User {} denied access to pengajuan {}", self.user_id, request.id);
        Err(AppError::forbidden("Forbidden."))
    }
}

/// ✅ **Principal cache using `moka`**
pub type PrincipalCache = Arc<Cache<i32, Principal>>;

pub fn create_principal_cache(ttl: Duration) -> PrincipalCache {
    Arc::new(Cache::builder().time_to_live(ttl).max_capacity(10_000).build())
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header."))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid Authorization header."))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization header."))?;
    if !scheme.eq_ignore_ascii_case("Bearer") || token.trim().is_empty() {
        return Err(AppError::unauthorized("Invalid Authorization header."));
    }
    Ok(token.trim())
}

async fn resolve_principal(state: &AppState, user_id: i32) -> Result<Principal, AppError> {
    if let Some(principal) = state.principals.get(&user_id) {
        return Ok(principal);
    }

    let user = state.store.find_user(user_id).await?.ok_or_else(|| {
        warn!("⛔ Token for deleted user {}", user_id);
        AppError::unauthorized("Unauthorized.")
    })?;

    let principal = Principal::from(&user);
    state.principals.insert(user_id, principal.clone());
    Ok(principal)
}

/// ✅ **Bearer token middleware**
///
/// Decodes the token, loads the account (through the principal cache) and attaches the
/// [`Principal`] to the request. A deleted account or a role changed since issuance is a 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())?;

    let claims = state.credentials.decode(token).map_err(|e| {
        warn!("❌ Token rejected: {}", e);
        AppError::unauthorized("Invalid or expired token.")
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::unauthorized("Invalid or expired token."))?;

    let principal = resolve_principal(&state, user_id).await?;
    if principal.role != claims.role {
        warn!(
            "⛔ Stale token for user {}: token role {}, stored role {}",
            user_id, claims.role, principal.role
        );
        return Err(AppError::unauthorized("Unauthorized."));
    }

    debug!("🔑 Authenticated user {} as {}", principal.user_id, principal.role);
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
