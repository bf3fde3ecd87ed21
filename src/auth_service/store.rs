use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::auth::claims::{Identity, RoleSet};
use crate::auth::service::RoleSource;

/// A registered user account.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            subject: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// In-memory user registry keyed by email.
///
/// Also serves as the [`RoleSource`] consulted when an access token is
/// re-issued from a refresh token.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, UserRecord>>,
    next_id: AtomicI64,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Register a new account with the given roles.
    ///
    /// Fails when the email is already taken; the password is stored as
    /// a bcrypt hash only.
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        roles: RoleSet,
    ) -> Result<UserRecord> {
        let password_hash =
            bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")?;

        let mut users = self.users.write().await;
        if users.contains_key(email) {
            anyhow::bail!("Email is already registered");
        }

        let record = UserRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password_hash,
            roles,
        };
        users.insert(email.to_string(), record.clone());
        Ok(record)
    }

    /// Check credentials, returning the account on success.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Option<UserRecord> {
        let users = self.users.read().await;
        let record = users.get(email)?;

        match bcrypt::verify(password, &record.password_hash) {
            Ok(true) => Some(record.clone()),
            Ok(false) => None,
            Err(e) => {
                tracing::error!(error = %e, "password verification failed");
                None
            }
        }
    }

    pub async fn exists(&self, email: &str) -> bool {
        self.users.read().await.contains_key(email)
    }
}

#[async_trait]
impl RoleSource for UserStore {
    async fn roles_for(&self, subject: &str) -> Option<RoleSet> {
        self.users
            .read()
            .await
            .get(subject)
            .map(|record| record.roles.clone())
    }
}
