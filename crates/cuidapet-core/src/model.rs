//! Account domain models
//!
//! A single `User` identity carries one of three roles. Each role may own at
//! most one extension profile, modelled as the tagged union [`RoleProfile`]
//! so that the "profile role must match user role" rule is one checked
//! precondition instead of per-type dispatch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Account role
///
/// The wire tokens are lowercase Spanish and case-sensitive. They are kept
/// verbatim so existing clients and stored rows stay compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "programador")]
    Programmer,
    #[serde(rename = "empleado")]
    Employee,
    #[serde(rename = "cliente")]
    Client,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Programmer, Role::Employee, Role::Client];

    /// Wire token for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Programmer => "programador",
            Role::Employee => "empleado",
            Role::Client => "cliente",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the three role tokens
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid role '{value}'. Must be one of: programador, empleado, cliente")]
pub struct RoleParseError {
    pub value: String,
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "programador" => Ok(Role::Programmer),
            "empleado" => Ok(Role::Employee),
            "cliente" => Ok(Role::Client),
            _ => Err(RoleParseError {
                value: s.to_string(),
            }),
        }
    }
}

/// Generated user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generated profile identifier (unique per profile table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub i64);

impl ProfileId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored user, including the credential digest
///
/// Never serialize this type into a response; use [`UserSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserRecord {
    /// Credential-free projection
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Public user representation (safe for API responses)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

/// Insert payload for a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Client extension profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub user_id: UserId,
    pub address: String,
    pub phone: String,
}

/// Employee extension profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub user_id: UserId,
    pub specialty: String,
    pub full_name: String,
    pub national_id: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
}

/// Programmer extension profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgrammerProfile {
    pub user_id: UserId,
    pub national_id: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
}

/// Role-specific extension record, keyed by the role it requires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RoleProfile {
    Client(ClientProfile),
    Employee(EmployeeProfile),
    Programmer(ProgrammerProfile),
}

impl RoleProfile {
    /// The role the referenced user must hold
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Client(_) => Role::Client,
            RoleProfile::Employee(_) => Role::Employee,
            RoleProfile::Programmer(_) => Role::Programmer,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            RoleProfile::Client(p) => p.user_id,
            RoleProfile::Employee(p) => p.user_id,
            RoleProfile::Programmer(p) => p.user_id,
        }
    }
}

impl From<ClientProfile> for RoleProfile {
    fn from(profile: ClientProfile) -> Self {
        RoleProfile::Client(profile)
    }
}

impl From<EmployeeProfile> for RoleProfile {
    fn from(profile: EmployeeProfile) -> Self {
        RoleProfile::Employee(profile)
    }
}

impl From<ProgrammerProfile> for RoleProfile {
    fn from(profile: ProgrammerProfile) -> Self {
        RoleProfile::Programmer(profile)
    }
}
