use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::repository::{NewUser, UserChanges};

const MAX_NAME_CHARS: usize = 100;

/// Request body for registering a user.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    /// Given name (1-100 characters).
    #[schema(example = "Ada")]
    pub first_name: String,
    /// Family name (1-100 characters).
    #[schema(example = "Lovelace")]
    pub last_name: String,
    /// Email address, unique across all users.
    #[schema(example = "ada@example.com")]
    pub email: String,
}

/// Partial update; omitted fields are left unchanged.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "Ada")]
    pub first_name: Option<String>,
    #[schema(example = "King")]
    pub last_name: Option<String>,
    #[schema(example = "ada.king@example.com")]
    pub email: Option<String>,
}

fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{MAX_NAME_CHARS} characters"
        )));
    }
    Ok(value.to_string())
}

fn validate_email(value: &str) -> Result<String, AppError> {
    let email = value.trim().to_lowercase();
    let invalid = || AppError::Validation("Email must be a valid address".into());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(email)
}

pub fn validate_create_request(payload: CreateUserRequest) -> Result<NewUser, AppError> {
    Ok(NewUser {
        first_name: validate_name("First name", &payload.first_name)?,
        last_name: validate_name("Last name", &payload.last_name)?,
        email: validate_email(&payload.email)?,
    })
}

pub fn validate_update_request(payload: UpdateUserRequest) -> Result<UserChanges, AppError> {
    let changes = UserChanges {
        first_name: payload
            .first_name
            .as_deref()
            .map(|v| validate_name("First name", v))
            .transpose()?,
        last_name: payload
            .last_name
            .as_deref()
            .map(|v| validate_name("Last name", v))
            .transpose()?,
        email: payload.email.as_deref().map(validate_email).transpose()?,
    };

    if changes.is_empty() {
        return Err(AppError::Validation(
            "At least one field must be provided".into(),
        ));
    }
    Ok(changes)
}

/// A registered user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
