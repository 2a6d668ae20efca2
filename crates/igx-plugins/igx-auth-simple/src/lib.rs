//! # igx-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and HMAC-signed session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use igx_core::traits::AuthProvider;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub struct SimpleAuthProvider {
    /// Key for signing session tokens. Changing it signs everyone out.
    session_key: SecretString,
}

impl SimpleAuthProvider {
    pub fn new(session_key: SecretString) -> Self {
        Self { session_key }
    }

    fn mac_for(&self, user_id: Uuid) -> anyhow::Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.session_key.expose_secret().as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid session key: {e}"))?;
        mac.update(user_id.as_bytes());
        Ok(mac)
    }
}

#[async_trait]
impl AuthProvider for SimpleAuthProvider {
    /// Hashes on the blocking pool; argon2 is deliberately slow.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))
        })
        .await?
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed_hash = match PasswordHash::new(&hash) {
                Ok(p) => p,
                Err(_) => return false,
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        })
        .await
        .unwrap_or(false)
    }

    /// Token format: `<uuid>.<hex hmac-sha256 of the uuid bytes>`.
    fn issue_session(&self, user_id: Uuid) -> anyhow::Result<String> {
        let signature = self.mac_for(user_id)?.finalize().into_bytes();
        Ok(format!("{user_id}.{}", hex::encode(signature)))
    }

    fn resolve_session(&self, token: &str) -> Option<Uuid> {
        let (id, signature) = token.split_once('.')?;
        let user_id = Uuid::parse_str(id).ok()?;
        let signature = hex::decode(signature).ok()?;
        self.mac_for(user_id).ok()?.verify_slice(&signature).ok()?;
        Some(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(key: &str) -> SimpleAuthProvider {
        SimpleAuthProvider::new(SecretString::from(key.to_string()))
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let auth = provider("0123456789abcdef");
        let hash = auth.hash_password("hunter22").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(auth.verify_password("hunter22", &hash).await);
        assert!(!auth.verify_password("hunter23", &hash).await);
    }

    #[tokio::test]
    async fn test_malformed_hash_never_verifies() {
        let auth = provider("0123456789abcdef");
        assert!(!auth.verify_password("anything", "not-a-phc-string").await);
    }

    #[test]
    fn test_session_round_trip() {
        let auth = provider("0123456789abcdef");
        let id = Uuid::now_v7();
        let token = auth.issue_session(id).unwrap();
        assert_eq!(auth.resolve_session(&token), Some(id));
    }

    #[test]
    fn test_tampered_sessions_are_rejected() {
        let auth = provider("0123456789abcdef");
        let token = auth.issue_session(Uuid::now_v7()).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = format!("{}.{signature}", Uuid::now_v7());
        assert_eq!(auth.resolve_session(&forged), None);
        assert_eq!(auth.resolve_session("garbage"), None);
        assert_eq!(auth.resolve_session(""), None);

        let other_key = provider("fedcba9876543210");
        assert_eq!(other_key.resolve_session(&token), None);
    }
}
