//! Password hashing and login.
//!
//! Hashes are salted, iterated SHA-256 stored as `hex(salt)$hex(digest)`.
//! The login path collapses every failure (unknown username, disabled
//! account, wrong password) into the same [`Error::Authentication`] value;
//! the distinction is logged at `warn` for operators but never surfaced to
//! the caller, so a login form cannot be used to probe which usernames
//! exist.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{NewUser, Role, User};
use crate::repository::{Repository, UserRepository};

const SALT_LEN: usize = 16;
const HASH_ITERATIONS: u32 = 100_000;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt)
        .map_err(|e| Error::Configuration(format!("random source unavailable: {}", e)))?;
    Ok(format!(
        "{}${}",
        hex::encode(salt),
        hex::encode(digest(password, &salt))
    ))
}

/// Check a password against a stored `hex(salt)$hex(digest)` hash.
/// A malformed stored hash compares as a mismatch, not an error.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
        return false;
    };
    let actual = digest(password, &salt);
    actual.ct_eq(&expected).into()
}

fn digest(password: &str, salt: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    out.copy_from_slice(&hasher.finalize());
    for _ in 1..HASH_ITERATIONS {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(out);
        out.copy_from_slice(&hasher.finalize());
    }
    out
}

/// Login and registration over the user repository.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
}

impl AuthService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Verify credentials and return the user. All failure modes return the
    /// same error value.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let user = match self.users.find_by_username(username)? {
            Some(user) => user,
            None => {
                warn!(username, "Login rejected: unknown username");
                return Err(Error::Authentication);
            }
        };
        if !user.is_active {
            warn!(username, "Login rejected: account is disabled");
            return Err(Error::Authentication);
        }
        if !verify_password(password, &user.password_hash) {
            warn!(username, "Login rejected: wrong password");
            return Err(Error::Authentication);
        }

        info!(username, "Login succeeded");
        Ok(user)
    }

    /// Create an account with a hashed password. A taken username is a
    /// validation error and leaves the store unchanged.
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
        role: Role,
    ) -> Result<User> {
        if username.trim().is_empty() {
            return Err(Error::validation("username must not be empty"));
        }
        if password.is_empty() {
            return Err(Error::validation("password must not be empty"));
        }

        let id = self.users.create(&NewUser {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            email,
            role,
        })?;

        info!(username, id, "User registered");
        self.users.get_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn service() -> AuthService {
        let db = Database::open_in_memory().expect("db");
        AuthService::new(UserRepository::new(db))
    }

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same").expect("hash");
        let b = hash_password("same").expect("hash");
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn test_malformed_stored_hash_is_a_mismatch() {
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "nothex$nothex"));
        assert!(!verify_password("x", ""));
    }

    #[test]
    fn test_register_then_authenticate() {
        let auth = service();
        auth.register("alice", "pw1", None, Role::User)
            .expect("register");

        let user = auth.authenticate("alice", "pw1").expect("login");
        assert_eq!(user.username, "alice");
        assert!(user.password_hash.contains('$'));
    }

    #[test]
    fn test_all_failures_use_the_same_error() {
        let auth = service();
        let user = auth
            .register("bob", "pw1", None, Role::User)
            .expect("register");

        // Unknown username.
        assert!(matches!(
            auth.authenticate("nobody", "pw1"),
            Err(Error::Authentication)
        ));
        // Wrong password.
        assert!(matches!(
            auth.authenticate("bob", "wrong"),
            Err(Error::Authentication)
        ));
        // Disabled account with the right password.
        auth.users
            .update(
                user.id,
                &crate::models::UserPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .expect("disable");
        assert!(matches!(
            auth.authenticate("bob", "pw1"),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_duplicate_username_is_validation() {
        let auth = service();
        auth.register("carol", "pw1", None, Role::User)
            .expect("register");

        assert!(matches!(
            auth.register("carol", "pw2", None, Role::User),
            Err(Error::Validation(_))
        ));
    }
}
