use axum::{extract::State, routing::{get, post}, Extension, Router};
use tracing::{info, warn};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use crate::app_state::AppState;
use crate::db::models::role::Role;
use crate::db::models::user::{
    AuthSession, LoginInput, LoginRequest, NewUser, RegisterInput, Registration, User,
};
use crate::error::AppError;
use crate::middleware::auth::Principal;
use crate::utils::api_response::ApiResponse;
use crate::utils::validation::Valid;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Handles user login
///
/// The role in the body must match the stored role; the match is loose
/// (`DEKAN`, `dekan`, `kepala-lab` all work).
///
/// # Returns
/// * `200 OK` - `{token, user}`
/// * `400 Bad Request` - Missing email, password or role
/// * `401 Unauthorized` - Unknown email, wrong password or wrong role
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body(content = LoginInput, description = "Email, password and the role to sign in as"),
    responses(
        (status = 200, description = "Successful login", body = AuthSession),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Valid(payload): Valid<LoginInput>,
) -> Result<ApiResponse<AuthSession>, AppError> {
    let LoginRequest { email, password, role } = payload;

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!("❌ Login attempt for unknown email {}", email);
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !state.credentials.verify_password(&password, &user.password_hash)? {
        warn!("❌ Wrong password for {}", email);
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    if user.role != role {
        warn!("❌ {} tried to sign in as {} but holds {}", email, role, user.role);
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = state.credentials.issue(user.id, user.role)?;
    info!("✅ {} logged in as {}", user.email, user.role);
    Ok(ApiResponse::ok("Login successful", AuthSession { token, user }))
}

/// Creates an account
///
/// Staff may only create `PEMOHON` accounts. Server admins may create any role.
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body(content = RegisterInput, description = "New account details"),
    responses(
        (status = 201, description = "Account created", body = AuthSession),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller may not create this role"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearerAuth" = []))
)]
pub async fn register(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Valid(payload): Valid<RegisterInput>,
) -> Result<ApiResponse<AuthSession>, AppError> {
    principal.require_role(&[Role::Staff, Role::ServerAdmin])?;

    let Registration { name, email, password, phone, role } = payload;
    if principal.role == Role::Staff && role != Role::Requester {
        warn!("⛔ Staff {} tried to create a {} account", principal.user_id, role);
        return Err(AppError::forbidden("Staff may only create PEMOHON accounts."));
    }

    let password_hash = state.credentials.hash_password(&password)?;
    let user: User = state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
            phone,
            role,
        })
        .await?;

    let token = state.credentials.issue(user.id, user.role)?;
    info!("🆕 {} created {} account {}", principal.user_id, user.role, user.email);
    Ok(ApiResponse::created("User registered", AuthSession { token, user }))
}

/// Returns the principal resolved from the bearer token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current principal", body = Principal),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn me(Extension(principal): Extension<Principal>) -> ApiResponse<Principal> {
    ApiResponse::ok("Authenticated", principal)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn secure_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/me", get(me))
}

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.clone().unwrap_or_default();
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        openapi.components = Some(components);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(login, register, me),
    components(schemas(LoginInput, RegisterInput, AuthSession, User, Principal)),
    tags((name = "Authentication", description = "Login and account registration")),
    modifiers(&SecurityAddon)
)]
pub struct AuthDoc;
