//! Binary export format
//!
//! An export batch is a protobuf message equivalent to:
//!
//! ```proto
//! syntax = "proto3";
//! package users;
//!
//! enum UserRole { USER_ROLE_UNSPECIFIED = 0; ADMIN = 1; USER = 2; }
//! enum Status   { STATUS_UNSPECIFIED = 0; ACTIVE = 1; INACTIVE = 2; }
//!
//! message User {
//!   int64    id         = 1;
//!   string   email      = 2;
//!   UserRole role       = 3;
//!   Status   status     = 4;
//!   string   email_hash = 5;
//!   string   signature  = 6;
//!   int64    created_at = 7;  // epoch millis
//! }
//!
//! message Users { repeated User users = 1; }
//! ```
//!
//! Encoding and decoding are purely structural. Hash and signature checks
//! belong to [`crate::verifier`].

use prost::Message;

use crate::crypto::sha384_hex;
use crate::types::{Role, UserId, UserStatus};

const USERS_TAG: u32 = 1;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record {index}: missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("record {index}: unknown {field} code {value}")]
    UnknownEnum {
        index: usize,
        field: &'static str,
        value: i32,
    },
    #[error("malformed export: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Wire projection of a signed user
#[derive(Clone, PartialEq, Message)]
pub struct ExportedUser {
    #[prost(int64, tag = "1")]
    pub id: UserId,
    #[prost(string, tag = "2")]
    pub email: String,
    #[prost(int32, tag = "3")]
    pub role: i32,
    #[prost(int32, tag = "4")]
    pub status: i32,
    #[prost(string, tag = "5")]
    pub email_hash: String,
    #[prost(string, tag = "6")]
    pub signature: String,
    #[prost(int64, tag = "7")]
    pub created_at: i64,
}

impl ExportedUser {
    pub fn role(&self) -> Option<Role> {
        Role::from_code(self.role)
    }

    pub fn status(&self) -> Option<UserStatus> {
        UserStatus::from_code(self.status)
    }
}

#[derive(Clone, PartialEq, Message)]
struct Users {
    #[prost(message, repeated, tag = "1")]
    users: Vec<ExportedUser>,
}

/// Canonical identity hash: lowercase hex SHA-384 of the UTF-8 bytes
pub fn identity_hash(identity: &str) -> String {
    sha384_hex(identity.as_bytes())
}

/// Encode a batch after checking every record carries email, role and status
pub fn encode(batch: &[ExportedUser]) -> CodecResult<Vec<u8>> {
    for (index, user) in batch.iter().enumerate() {
        check_required(index, user)?;
    }

    let mut buf =
        Vec::with_capacity(prost::encoding::message::encoded_len_repeated(USERS_TAG, batch));
    for user in batch {
        prost::encoding::message::encode(USERS_TAG, user, &mut buf);
    }
    Ok(buf)
}

/// Decode a batch produced by [`encode`]
pub fn decode(bytes: &[u8]) -> CodecResult<Vec<ExportedUser>> {
    let Users { users } = Users::decode(bytes)?;
    for (index, user) in users.iter().enumerate() {
        check_required(index, user)?;
    }
    Ok(users)
}

fn check_required(index: usize, user: &ExportedUser) -> CodecResult<()> {
    if user.email.is_empty() {
        return Err(CodecError::MissingField {
            index,
            field: "email",
        });
    }
    check_code(index, "role", user.role, Role::from_code(user.role).is_some())?;
    check_code(
        index,
        "status",
        user.status,
        UserStatus::from_code(user.status).is_some(),
    )
}

fn check_code(index: usize, field: &'static str, value: i32, known: bool) -> CodecResult<()> {
    match (value, known) {
        (0, _) => Err(CodecError::MissingField { index, field }),
        (_, false) => Err(CodecError::UnknownEnum {
            index,
            field,
            value,
        }),
        _ => Ok(()),
    }
}
