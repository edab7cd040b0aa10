use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;

/// Newtype for a plaintext password to keep it out of logs.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// A directory account: who can sign in and which roles they carry.
#[derive(Debug, Clone)]
pub struct Account {
    pub username: String,
    pub display_name: String,
    pub roles: Vec<String>,
    password_hash: String,
}

/// Source of account records for credential verification.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve credentials to an account.
    ///
    /// Returns `Ok(None)` for an unknown username or a wrong password;
    /// callers must not learn which.
    async fn verify_credentials(
        &self,
        username: &str,
        password: &Password,
    ) -> Result<Option<Account>, AppError>;
}

/// Directory backed by a map built at startup.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: HashMap<String, Account>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account, hashing its password with Argon2id.
    pub fn add_account(
        &mut self,
        username: &str,
        display_name: &str,
        password: &Password,
        roles: Vec<String>,
    ) -> Result<(), AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_str().as_bytes(), &salt)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to hash password: {}", e)))?
            .to_string();

        self.accounts.insert(
            username.to_string(),
            Account {
                username: username.to_string(),
                display_name: display_name.to_string(),
                roles,
                password_hash,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &Password,
    ) -> Result<Option<Account>, AppError> {
        let Some(account) = self.accounts.get(username) else {
            return Ok(None);
        };

        let parsed_hash = PasswordHash::new(&account.password_hash)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Invalid stored hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_str().as_bytes(), &parsed_hash) {
            Ok(()) => Ok(Some(account.clone())),
            Err(_) => Ok(None),
        }
    }
}
