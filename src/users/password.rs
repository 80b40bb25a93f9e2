use anyhow::{anyhow, Context};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

fn argon2id() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Salted Argon2id hash in PHC string form.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2id()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` on a mismatch; `Err` only when `stored` is not a usable PHC hash.
#[cfg_attr(not(test), allow(dead_code))]
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("parse stored hash: {e}"))?;
    match argon2id().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("verify password: {e}")),
    }
}

/// Runs [`hash_password`] on the blocking pool so the request task can yield.
pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("hashing task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_its_own_plaintext() {
        let hash = hash_password("hunter22").expect("hash");
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn same_plaintext_hashes_differently_each_time() {
        let first = hash_password("hunter22").expect("hash");
        let second = hash_password("hunter22").expect("hash");
        assert_ne!(first, second);
        assert!(verify_password("hunter22", &first).unwrap());
        assert!(verify_password("hunter22", &second).unwrap());
    }

    #[test]
    fn hash_is_self_describing_and_not_plaintext() {
        let hash = hash_password("hunter22").expect("hash");
        assert!(!hash.contains("hunter22"));
        assert!(hash.starts_with("$argon2id$v=19$"));
    }

    #[test]
    fn stored_value_that_is_not_a_hash_is_an_error() {
        for stored in ["", "hunter22", "not-a-valid-hash"] {
            let err = verify_password("hunter22", stored).unwrap_err();
            assert!(err.to_string().starts_with("parse stored hash"), "{stored:?}: {err}");
        }
    }

    #[tokio::test]
    async fn blocking_wrapper_produces_verifiable_hash() {
        let hash = hash_password_blocking("s3cret!".into()).await.expect("hash");
        assert!(verify_password("s3cret!", &hash).unwrap());
    }
}
