//! bcrypt password hashing.

use std::sync::LazyLock;

use road_core::entities::MIN_PASSWORD_LEN;

use crate::error::AuthError;

/// bcrypt work factor used by [`hash_password`].
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash of a password no account has, at [`DEFAULT_COST`].
static UNMATCHABLE_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("roadtrack-no-such-account", DEFAULT_COST).ok());

/// Hash a password at bcrypt's default cost.
///
/// # Errors
///
/// `Hashing` if the password is shorter than [`MIN_PASSWORD_LEN`] or bcrypt
/// fails.
pub fn hash_password(plain: &str) -> Result<String, AuthError> {
    hash_password_with_cost(plain, DEFAULT_COST)
}

/// Hash a password at an explicit cost. Low costs are only for tests.
///
/// # Errors
///
/// Same as [`hash_password`].
pub fn hash_password_with_cost(plain: &str, cost: u32) -> Result<String, AuthError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Hashing(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    bcrypt::hash(plain, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a password against a stored hash. A malformed hash counts as a
/// mismatch.
#[must_use]
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match bcrypt::verify(plain, hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

/// Run one full bcrypt verification and discard the result. Login calls this
/// for unknown emails so they cost the same as a wrong password.
pub fn verify_against_unmatchable(plain: &str) {
    if let Some(hash) = UNMATCHABLE_HASH.as_deref() {
        let _ = bcrypt::verify(plain, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password_with_cost("correct-horse", 4).unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(matches!(
            hash_password_with_cost("abc", 4),
            Err(AuthError::Hashing(_))
        ));
    }

    #[test]
    fn unmatchable_hash_is_a_real_bcrypt_hash() {
        let hash = UNMATCHABLE_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$2"));
        assert!(!verify_password("correct-horse", hash));
        verify_against_unmatchable("correct-horse");
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-bcrypt-hash"));
    }
}
