use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::db::models::role::Role;
use crate::utils::validation::{trimmed, FieldErrors, Validate};

#[derive(Serialize, Deserialize, Debug, Clone, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    #[serde(rename = "nama")]
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(rename = "noTelepon")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Compact view embedded in request, approval and audit listings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    #[serde(rename = "nama")]
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Insert payload, password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub nama: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub no_telepon: Option<String>,
    /// Defaults to `PEMOHON`.
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl Validate for RegisterInput {
    type Output = Registration;

    fn validate(self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("nama", self.nama);
        let email = errors
            .email("email", self.email, true)
            .map(|email| email.to_lowercase())
            .unwrap_or_default();

        let password = self.password.unwrap_or_default();
        if password.chars().count() < 6 {
            errors.push("password", "Must be at least 6 characters");
        }

        let role = match trimmed(self.role) {
            None => Role::Requester,
            Some(raw) => Role::parse_loose(&raw).unwrap_or_else(|| {
                errors.push("role", "Unknown role");
                Role::Requester
            }),
        };

        errors.finish(Registration {
            name,
            email,
            password,
            phone: trimmed(self.no_telepon),
            role,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl Validate for LoginInput {
    type Output = LoginRequest;

    fn validate(self) -> Result<LoginRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = errors.required_text("email", self.email);
        let password = self.password.filter(|p| !p.is_empty()).unwrap_or_else(|| {
            errors.push("password", "Required");
            String::new()
        });
        let role = match trimmed(self.role) {
            Some(raw) => Role::parse_loose(&raw).unwrap_or_else(|| {
                errors.push("role", "Unknown role");
                Role::Requester
            }),
            None => {
                errors.push("role", "Required");
                Role::Requester
            }
        };

        errors.finish(LoginRequest {
            email: email.to_lowercase(),
            password,
            role,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub nama: Option<String>,
    pub email: Option<String>,
    pub no_telepon: Option<String>,
}

impl Validate for UpdateUserInput {
    type Output = UserChanges;

    fn validate(self) -> Result<UserChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = errors.required_text("nama", self.nama);
        let email = errors
            .email("email", self.email, true)
            .map(|email| email.to_lowercase())
            .unwrap_or_default();

        errors.finish(UserChanges {
            name,
            email,
            phone: trimmed(self.no_telepon),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}
