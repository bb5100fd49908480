//! Application state: the user registry and the server signing identity

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::codec::{self, ExportedUser};
use crate::config::Config;
use crate::crypto::key_id;
use crate::error::{ApiError, ApiResult};
use crate::keystore::KeyStore;
use crate::signer::Signer;
use crate::types::*;
use crate::validation::validate_email;

pub const EXPORTED_RECORDS_METRIC: &str = "signed_users_records_exported_total";

/// Global application state
pub struct AppState {
    /// Users indexed by ID
    pub users: DashMap<UserId, User>,
    /// Email -> ID lookup
    pub email_index: DashMap<String, UserId>,
    /// Next ID to assign
    next_id: AtomicI64,
    /// Signs identity hashes on create and on email change
    signer: Signer,
    /// Public key PEM served to verifying clients
    public_key_pem: String,
    key_id: String,
    /// Configuration
    pub config: Config,
    /// Start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config, keys: &KeyStore) -> Arc<Self> {
        Arc::new(Self {
            users: DashMap::new(),
            email_index: DashMap::new(),
            next_id: AtomicI64::new(1),
            signer: Signer::new(keys),
            public_key_pem: keys.public_key_pem().to_string(),
            key_id: key_id(keys.public_key_pem()),
            config,
            start_time: Instant::now(),
        })
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    fn check_email(&self, email: &str) -> ApiResult<()> {
        validate_email(email, self.config.max_email_length)
            .map_err(|e| ApiError::bad_request_with_hint(e, "Provide an address like user@example.com"))
    }

    // ============ User Operations ============

    /// Create a user, binding its email to the server key
    pub fn create_user(&self, req: CreateUserRequest) -> ApiResult<User> {
        self.check_email(&req.email)?;

        // email_index before users, same order as update_user
        let user = match self.email_index.entry(req.email.clone()) {
            Entry::Occupied(_) => return Err(ApiError::Conflict("User exists".into())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let identity = self.signer.sign_identity(&req.email);
                let user = User::new(id, identity, req.role, req.status);
                self.users.insert(id, user.clone());
                slot.insert(id);
                user
            }
        };

        tracing::info!("Created user {} ({})", user.id, user.email_hash);
        Ok(user)
    }

    /// Get user by ID
    pub fn get_user(&self, id: UserId) -> ApiResult<User> {
        self.users
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or_else(|| not_found(id))
    }

    /// All users in insertion (ID) order
    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    /// Apply a partial update. Changing the email re-signs it so the stored
    /// hash and signature never go stale.
    pub fn update_user(&self, id: UserId, req: UpdateUserRequest) -> ApiResult<User> {
        loop {
            let seen = self.get_user(id)?.email;
            let new_email = req.email.as_deref().filter(|email| *email != seen);

            let Some(email) = new_email else {
                let mut user = self.users.get_mut(&id).ok_or_else(|| not_found(id))?;
                if user.email != seen {
                    continue;
                }
                apply_fields(&mut user, req.role, req.status);
                tracing::info!("Updated user {}", id);
                return Ok(user.clone());
            };

            self.check_email(email)?;

            // email_index before users, same order as create_user
            let slot = match self.email_index.entry(email.to_string()) {
                Entry::Occupied(owner) if *owner.get() == id => continue,
                Entry::Occupied(_) => return Err(ApiError::Conflict("User exists".into())),
                Entry::Vacant(slot) => slot,
            };
            let mut user = self.users.get_mut(&id).ok_or_else(|| not_found(id))?;
            if user.email != seen {
                // Lost a race with another email change; start over
                continue;
            }

            user.rebind(self.signer.sign_identity(email));
            apply_fields(&mut user, req.role, req.status);
            let updated = user.clone();
            slot.insert(id);
            drop(user);

            self.email_index.remove_if(&seen, |_, owner| *owner == id);
            tracing::info!("Re-signed user {} after email change", id);
            return Ok(updated);
        }
    }

    /// Delete a user, returning the removed record
    pub fn delete_user(&self, id: UserId) -> ApiResult<User> {
        let (_, user) = self.users.remove(&id).ok_or_else(|| not_found(id))?;
        self.email_index.remove_if(&user.email, |_, owner| *owner == id);
        tracing::info!("Deleted user {}", id);
        Ok(user)
    }

    // ============ Export ============

    /// Wire projection of every user in ID order
    pub fn export_batch(&self) -> Vec<ExportedUser> {
        self.list_users().iter().map(User::to_exported).collect()
    }

    /// Encoded export batch
    pub fn export_bytes(&self) -> ApiResult<Vec<u8>> {
        let batch = self.export_batch();
        let bytes = codec::encode(&batch)?;
        metrics::counter!(EXPORTED_RECORDS_METRIC).increment(batch.len() as u64);
        tracing::debug!("Exported {} users ({} bytes)", batch.len(), bytes.len());
        Ok(bytes)
    }

    /// Get health info
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".into(),
            version: self.config.version.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            users_count: self.users.len(),
            key_id: self.key_id.clone(),
        }
    }
}

fn apply_fields(user: &mut User, role: Option<Role>, status: Option<UserStatus>) {
    if let Some(role) = role {
        user.role = role;
    }
    if let Some(status) = status {
        user.status = status;
    }
}

fn not_found(id: UserId) -> ApiError {
    ApiError::NotFound(format!("User with ID {} not found", id))
}
