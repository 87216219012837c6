//! JSON request and response bodies for the REST gateway.
//!
//! Pure mappings of the wire messages; no logic lives here.

use serde::{Deserialize, Serialize};

use crate::proto;

/// Registration payload.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterUserBody {
    /// Account name.
    #[serde(default)]
    pub name: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Raw password; hashed before persistence.
    #[serde(default)]
    pub password: String,
}

/// Login payload: name or email plus password.
#[derive(Debug, Default, Deserialize)]
pub struct AuthenticateUserBody {
    /// Account name (alternative to email).
    #[serde(default)]
    pub name: String,
    /// Email address (alternative to name).
    #[serde(default)]
    pub email: String,
    /// Raw password.
    #[serde(default)]
    pub password: String,
}

/// Partial update payload; empty fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserBody {
    /// Replacement account name.
    #[serde(default)]
    pub name: String,
    /// Replacement email address.
    #[serde(default)]
    pub email: String,
    /// Replacement raw password.
    #[serde(default)]
    pub password: String,
}

/// Refresh-token exchange payload.
#[derive(Debug, Deserialize)]
pub struct RefreshUserTokenBody {
    /// The refresh token issued at login.
    pub refresh_token: String,
}

/// Token validation payload.
#[derive(Debug, Deserialize)]
pub struct ValidateUserTokenBody {
    /// The access token to validate.
    pub token: String,
}

/// User representation returned to callers.
#[derive(Debug, Serialize)]
pub struct UserViewBody {
    /// Unique identifier.
    pub id: i64,
    /// Account name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl From<proto::UserView> for UserViewBody {
    fn from(view: proto::UserView) -> Self {
        Self {
            id: view.id,
            name: view.name,
            email: view.email,
        }
    }
}

/// Access/refresh token pair issued at login.
#[derive(Debug, Serialize)]
pub struct TokenPairBody {
    /// Short-lived access token.
    pub token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// Freshly minted access token.
#[derive(Debug, Serialize)]
pub struct AccessTokenBody {
    /// Short-lived access token.
    pub access_token: String,
}

/// Subject a validated token belongs to.
#[derive(Debug, Serialize)]
pub struct SubjectBody {
    /// The user id encoded in the token.
    pub user_id: i64,
}

/// Number of records an update touched.
#[derive(Debug, Serialize)]
pub struct UpdatedBody {
    /// Rows affected.
    pub updated_count: i64,
}

/// Number of records a delete touched.
#[derive(Debug, Serialize)]
pub struct RemovedBody {
    /// Rows affected.
    pub removed_count: i64,
}

/// Listing of all users.
#[derive(Debug, Serialize)]
pub struct UserListBody {
    /// All known users.
    pub users: Vec<UserViewBody>,
}
