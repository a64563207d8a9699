use super::ConfigSection;
use crate::{ConfigDocumentSet, ConfigError};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use serde::Serialize;

pub const USERNAME_PATH: &str = "io.sapl/server/accesscontrol/admin-username";
pub const ENCODED_PASSWORD_PATH: &str = "io.sapl/server/accesscontrol/encoded-admin-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Moderate,
    Strong,
}

/// Strength from length alone: 10+ characters strong, 6 to 9 moderate.
pub fn password_strength(password: &str) -> PasswordStrength {
    match password.chars().count() {
        n if n > 9 => PasswordStrength::Strong,
        n if n > 5 => PasswordStrength::Moderate,
        _ => PasswordStrength::Weak,
    }
}

/// Argon2id PHC string for `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ConfigError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::PasswordHash(e.to_string()))
}

/// Checks `candidate` against a hash produced by [`hash_password`].
pub fn verify_password(encoded: &str, candidate: &str) -> bool {
    PasswordHash::new(encoded)
        .map(|parsed| {
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// The initial administrator account. Only the username and the hashed
/// password are ever written.
#[derive(Debug, Clone, Default)]
pub struct AdminUserConfig {
    username: String,
    password: String,
    password_repeat: String,
    saved: bool,
}

impl AdminUserConfig {
    pub fn load(docs: &ConfigDocumentSet) -> Self {
        Self {
            username: docs.get_or(USERNAME_PATH, "").to_string(),
            ..Self::default()
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn set_password_repeat(&mut self, password_repeat: impl Into<String>) {
        self.password_repeat = password_repeat.into();
    }

    pub fn password_strength(&self) -> PasswordStrength {
        password_strength(&self.password)
    }

    pub fn passwords_match(&self) -> bool {
        self.password == self.password_repeat
    }
}

impl ConfigSection for AdminUserConfig {
    fn name(&self) -> &'static str {
        "admin user"
    }

    fn is_valid_config(&self) -> bool {
        !self.username.is_empty() && self.passwords_match()
    }

    fn write_to(&self, docs: &mut ConfigDocumentSet) -> Result<(), ConfigError> {
        docs.set_at(USERNAME_PATH, self.username.as_str())?;
        docs.set_at(ENCODED_PASSWORD_PATH, hash_password(&self.password)?)
    }

    fn is_saved(&self) -> bool {
        self.saved
    }

    fn set_saved(&mut self, saved: bool) {
        self.saved = saved;
    }
}
