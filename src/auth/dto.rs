use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserResource {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub is_admin: bool,
    pub pfp: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserResource {
    /// Resource without the session token.
    pub fn public(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            token: None,
            is_admin: user.is_admin,
            pfp: user.pfp,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    /// Resource exposing the session token, only for the user it belongs to.
    pub fn with_token(user: User) -> Self {
        let token = user.token.clone();
        Self {
            token,
            ..Self::public(user)
        }
    }
}
