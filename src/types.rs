//! Core types for the signed user registry
//!
//! Domain records, their wire codes, and the JSON request/response shapes
//! of the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::ExportedUser;

/// Registry-assigned user identifier
pub type UserId = i64;

// ============ User Types ============

/// User role. Wire codes start at 1 so 0 stays "unset".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn code(self) -> i32 {
        match self {
            Role::Admin => 1,
            Role::User => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Role::Admin),
            2 => Some(Role::User),
            _ => None,
        }
    }
}

/// Account status. Wire codes start at 1 so 0 stays "unset".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn code(self) -> i32 {
        match self {
            UserStatus::Active => 1,
            UserStatus::Inactive => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(UserStatus::Active),
            2 => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

/// An identity bound to the server key.
///
/// `identity_hash` is the hex SHA-384 of `raw_identity`, and `signature`
/// signs the text of `identity_hash`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedIdentity {
    pub raw_identity: String,
    pub identity_hash: String,
    pub signature: String,
}

/// Stored user record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub email_hash: String,
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, identity: SignedIdentity, role: Role, status: UserStatus) -> Self {
        Self {
            id,
            email: identity.raw_identity,
            role,
            status,
            email_hash: identity.identity_hash,
            signature: identity.signature,
            created_at: Utc::now(),
        }
    }

    /// Replace the identity together with its hash and signature
    pub fn rebind(&mut self, identity: SignedIdentity) {
        self.email = identity.raw_identity;
        self.email_hash = identity.identity_hash;
        self.signature = identity.signature;
    }

    /// Wire projection used by the binary export
    pub fn to_exported(&self) -> ExportedUser {
        ExportedUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role.code(),
            status: self.status.code(),
            email_hash: self.email_hash.clone(),
            signature: self.signature.clone(),
            created_at: self.created_at.timestamp_millis(),
        }
    }
}

// ============ API Request/Response Types ============

/// Create user request
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: UserStatus,
}

/// Partial update. A new email is re-hashed and re-signed.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            hint: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            hint: None,
        }
    }

    pub fn error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            hint: Some(hint.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub users_count: usize,
    pub key_id: String,
}
