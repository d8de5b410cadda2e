/**
 * Account Handler Types
 *
 * Request and response bodies for the `/api/users` endpoints. Request
 * fields are optional so that a missing field produces the endpoint's own
 * 400 message instead of a body rejection.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::users::{User, UserStore};
use crate::backend::error::BackendError;
use crate::shared::Role;

/// Registration request
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct RegisterRequest {
    /// 3-30 letters, digits or underscores
    pub username: Option<String>,
    pub email: Option<String>,
    /// At least 6 characters; hashed before storage
    pub password: Option<String>,
}

/// Login request
///
/// `loginIdentifier` may be either the email or the username.
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_identifier: Option<String>,
    pub password: Option<String>,
}

/// Profile update; empty fields keep the current value
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub race: Option<String>,
    pub picture: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct UpdateRoleRequest {
    pub role: Option<String>,
}

/// Add or remove an ally of the calling contractor
#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ManageAllyRequest {
    /// `add` or `remove`
    pub action: Option<String>,
    pub ally_username: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct CheckUsernameRequest {
    pub username: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(default)]
pub struct CheckEmailRequest {
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
}

/// Contractor reference embedded in a serialized user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AllyRef {
    pub id: Uuid,
    pub username: String,
}

/// User as returned to its owner and to staff
///
/// Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub picture: String,
    pub role: Role,
    pub race: String,
    pub ally_of: Option<AllyRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    /// Build the response, resolving `ally_of` to the contractor's username
    ///
    /// A dangling `ally_of` is reported as no ally.
    pub async fn load(users: &dyn UserStore, user: User) -> Result<Self, BackendError> {
        let ally_of = match user.ally_of {
            Some(id) => users.find_by_id(id).await?.map(|contractor| AllyRef {
                id: contractor.id,
                username: contractor.username,
            }),
            None => None,
        };

        Ok(Self::with_ally(user, ally_of))
    }

    pub fn with_ally(user: User, ally_of: Option<AllyRef>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            picture: user.picture,
            role: user.role,
            race: user.race,
            ally_of,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User as listed publicly
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub picture: String,
    pub role: Role,
    pub race: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            picture: user.picture,
            role: user.role,
            race: user.race,
        }
    }
}

/// Registration response
#[derive(Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub user: UserResponse,
}

/// Login response: the user plus a bearer token
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// JWT for the `Authorization: Bearer` header
    pub token: String,
}
