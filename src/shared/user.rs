//! User roles
//!
//! Three roles exist. Their wire names are the ones stored in the database
//! and sent to clients:
//!
//! | Role | Wire name | Messaging |
//! |---|---|---|
//! | `Admin` | `admin` | privileged: receives every standard user's messages, unlimited |
//! | `Contractor` | `contractor` | elevated: unlimited, may message anyone |
//! | `User` | `user` | standard: five messages a day, always to the privileged account |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::SharedError;

/// Race given to every new account
pub const DEFAULT_RACE: &str = "Nhân tộc";

/// Race given to the first account, which becomes the admin
pub const ADMIN_RACE: &str = "Tổng lãnh thiên thần";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Contractor,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Contractor => "contractor",
            Role::User => "user",
        }
    }

    /// Whether sends by this role count against the daily quota
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Role::User)
    }

    /// Admins and contractors may list every account
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Contractor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "contractor" => Ok(Role::Contractor),
            "user" => Ok(Role::User),
            other => Err(SharedError::unknown_variant("role", other)),
        }
    }
}
