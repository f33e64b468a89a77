use argon2::{
    Algorithm, Argon2, Params, ParamsBuilder, Version,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
};
use hmac::{Hmac, Mac};
use password_hash::Error as PasswordHashError;
use rand::{TryRngCore, rngs::OsRng};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::error::CoreError;

/// Password hashing and session token digests.
///
/// Passwords are hashed with Argon2id over `password || pepper`. Session
/// tokens are random and only their HMAC-SHA-256 digest is persisted.
#[derive(Debug)]
pub struct AuthCrypto {
    argon2: Argon2<'static>,
    password_pepper: Zeroizing<Vec<u8>>,
    token_hmac_key: Zeroizing<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum AuthCryptoError {
    #[error("password pepper must not be empty")]
    EmptyPasswordPepper,
    #[error("token HMAC key must not be empty")]
    EmptyTokenKey,
    #[error("invalid Argon2 parameters: {0}")]
    InvalidArgon2Params(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("random source failure: {0}")]
    Random(String),
}

impl From<PasswordHashError> for AuthCryptoError {
    fn from(err: PasswordHashError) -> Self {
        AuthCryptoError::PasswordHash(err.to_string())
    }
}

impl From<AuthCryptoError> for CoreError {
    fn from(err: AuthCryptoError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

type HmacSha256 = Hmac<Sha256>;

impl AuthCrypto {
    const DEFAULT_MEMORY_KIB: u32 = 64 * 1024;
    const DEFAULT_ITERATIONS: u32 = 3;
    const DEFAULT_PARALLELISM: u32 = 1;
    const SALT_LENGTH: usize = password_hash::Salt::RECOMMENDED_LENGTH;
    /// Raw session tokens are this many random bytes, hex encoded.
    pub const TOKEN_BYTES: usize = 32;

    pub fn new(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        Self::with_params(
            password_pepper,
            token_hmac_key,
            ParamsBuilder::new()
                .m_cost(Self::DEFAULT_MEMORY_KIB)
                .t_cost(Self::DEFAULT_ITERATIONS)
                .p_cost(Self::DEFAULT_PARALLELISM)
                .output_len(32)
                .build()
                .map_err(|err| {
                    AuthCryptoError::InvalidArgon2Params(err.to_string())
                })?,
        )
    }

    /// Cheap parameters for test suites, which hash many passwords.
    pub fn for_tests(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
    ) -> Result<Self, AuthCryptoError> {
        let params = ParamsBuilder::new()
            .m_cost(Params::MIN_M_COST)
            .t_cost(1)
            .p_cost(1)
            .output_len(32)
            .build()
            .map_err(|err| {
                AuthCryptoError::InvalidArgon2Params(err.to_string())
            })?;
        Self::with_params(password_pepper, token_hmac_key, params)
    }

    pub fn with_params(
        password_pepper: impl AsRef<[u8]>,
        token_hmac_key: impl AsRef<[u8]>,
        params: Params,
    ) -> Result<Self, AuthCryptoError> {
        let pepper = password_pepper.as_ref();
        if pepper.is_empty() {
            return Err(AuthCryptoError::EmptyPasswordPepper);
        }

        let key = token_hmac_key.as_ref();
        if key.is_empty() {
            return Err(AuthCryptoError::EmptyTokenKey);
        }

        let argon2 =
            Argon2::new(Algorithm::Argon2id, Version::default(), params);

        Ok(Self {
            argon2,
            password_pepper: Zeroizing::new(pepper.to_vec()),
            token_hmac_key: Zeroizing::new(key.to_vec()),
        })
    }

    fn peppered(&self, password: &str) -> Zeroizing<Vec<u8>> {
        let mut material = Zeroizing::new(Vec::with_capacity(
            password.len() + self.password_pepper.len(),
        ));
        material.extend_from_slice(password.as_bytes());
        material.extend_from_slice(&self.password_pepper);
        material
    }

    /// Returns a PHC string suitable for storage.
    pub fn hash_password(
        &self,
        password: &str,
    ) -> Result<String, AuthCryptoError> {
        let material = self.peppered(password);

        let mut salt_bytes = [0u8; Self::SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|err| AuthCryptoError::Random(err.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(AuthCryptoError::from)?;
        let hash = self.argon2.hash_password(&material, &salt)?.to_string();
        Ok(hash)
    }

    pub fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthCryptoError> {
        let parsed = PasswordHash::new(password_hash)?;
        let material = self.peppered(password);
        Ok(self.argon2.verify_password(&material, &parsed).is_ok())
    }

    /// A fresh opaque session token (hex).
    pub fn generate_token(&self) -> Result<String, AuthCryptoError> {
        let mut bytes = Zeroizing::new([0u8; Self::TOKEN_BYTES]);
        OsRng
            .try_fill_bytes(&mut bytes[..])
            .map_err(|err| AuthCryptoError::Random(err.to_string()))?;
        Ok(hex::encode(&bytes[..]))
    }

    /// Hex HMAC-SHA-256 digest of a token, as stored in `sessions`.
    pub fn hash_token(&self, token: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.token_hmac_key)
            .expect("HMAC-SHA-256 accepts keys of any size");
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> AuthCrypto {
        AuthCrypto::for_tests("pepper", "token-key").unwrap()
    }

    #[test]
    fn hashes_passwords_and_verifies() {
        let crypto = crypto();
        let hash = crypto.hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(crypto.verify_password("correct horse", &hash).unwrap());
        assert!(!crypto.verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn pepper_is_part_of_the_hash() {
        let hash = crypto().hash_password("correct horse").unwrap();
        let other = AuthCrypto::for_tests("other-pepper", "token-key").unwrap();
        assert!(!other.verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn tokens_are_random_hex() {
        let crypto = crypto();
        let a = crypto.generate_token().unwrap();
        let b = crypto.generate_token().unwrap();
        assert_eq!(a.len(), AuthCrypto::TOKEN_BYTES * 2);
        assert_ne!(a, b);
    }

    #[test]
    fn token_digests_are_keyed() {
        let crypto = crypto();
        let digest = crypto.hash_token("opaque-token");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, crypto.hash_token("opaque-token"));

        let other = AuthCrypto::for_tests("pepper", "other-key").unwrap();
        assert_ne!(digest, other.hash_token("opaque-token"));
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(matches!(
            AuthCrypto::new("", "token"),
            Err(AuthCryptoError::EmptyPasswordPepper)
        ));
        assert!(matches!(
            AuthCrypto::new("pepper", ""),
            Err(AuthCryptoError::EmptyTokenKey)
        ));
    }
}
