/// Password hashing module using Argon2id
///
/// Passwords are hashed with Argon2id and a fresh random salt per call, so the
/// same plaintext never produces the same digest twice. The digest is stored in
/// PHC string format, which embeds the algorithm, the cost parameters and the
/// salt; verification reads the parameters back out of the digest, so changing
/// the configured cost never invalidates existing hashes.
///
/// # Cost
///
/// The cost factor is configurable through [`PasswordHasherConfig`]. The
/// defaults follow the OWASP minimum for Argon2id:
///
/// - **Memory**: 19 MiB (19456 KiB)
/// - **Iterations**: 2 passes
/// - **Parallelism**: 1 lane
///
/// # Example
///
/// ```
/// use orgauth_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password_123")?;
///
/// assert!(verify_password("super_secret_password_123", &hash));
/// assert!(!verify_password("wrong_password", &hash));
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use serde::{Deserialize, Serialize};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The configured cost parameters are rejected by Argon2
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),
}

/// Argon2id cost parameters
///
/// Only affects newly produced hashes. Existing hashes carry their own
/// parameters and keep verifying after the configuration changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHasherConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes over memory
    pub iterations: u32,

    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for PasswordHasherConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordHasherConfig {
    /// Hashes a password with these cost parameters
    ///
    /// # Returns
    ///
    /// PHC string format hash, e.g.
    /// ```text
    /// $argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$hash...
    /// ```
    ///
    /// # Errors
    ///
    /// - `PasswordError::InvalidParams` if Argon2 rejects the cost parameters
    /// - `PasswordError::HashError` if hashing itself fails
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let params = ParamsBuilder::new()
            .m_cost(self.memory_kib)
            .t_cost(self.iterations)
            .p_cost(self.parallelism)
            .output_len(32)
            .build()
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// A well-formed digest with these cost parameters that matches no password
    ///
    /// Verifying against it costs the same as verifying against a real hash,
    /// so a lookup miss is not faster than a wrong password.
    pub fn dummy_hash(&self) -> String {
        format!(
            "$argon2id$v=19$m={},t={},p={}${}${}",
            self.memory_kib,
            self.iterations,
            self.parallelism,
            DUMMY_SALT,
            DUMMY_OUTPUT,
        )
    }
}

/// Base64 of a fixed 16-byte salt
const DUMMY_SALT: &str = "c29tZXNhbHRzb21lc2FsdA";

/// 32 zero bytes, base64 without padding
const DUMMY_OUTPUT: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hashes a password using the default cost parameters
///
/// # Example
///
/// ```
/// use orgauth_shared::auth::password::hash_password;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("my_password")?;
/// assert!(hash.starts_with("$argon2id$"));
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    PasswordHasherConfig::default().hash(password)
}

/// Verifies a password against a stored digest
///
/// The comparison is constant-time inside Argon2. A digest that cannot be
/// parsed is treated as a failed verification rather than an error, so a
/// corrupted row can never be mistaken for a successful login.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    // Parameters are embedded in the hash
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so the suite stays fast
    fn fast() -> PasswordHasherConfig {
        PasswordHasherConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_password_format() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=19456"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=1"));
    }

    #[test]
    fn test_configured_cost_is_embedded() {
        let config = PasswordHasherConfig {
            memory_kib: 2048,
            iterations: 3,
            parallelism: 2,
        };
        let hash = config.hash("password").unwrap();

        assert!(hash.contains("m=2048"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=2"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = PasswordHasherConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };

        assert!(matches!(
            config.hash("password"),
            Err(PasswordError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = fast().hash("same_password").unwrap();
        let hash2 = fast().hash("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = fast().hash("correct_password").unwrap();
        assert!(verify_password("correct_password", &hash));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = fast().hash("correct_password").unwrap();

        assert!(!verify_password("wrong_password", &hash));
        assert!(!verify_password("", &hash));
        assert!(!verify_password("correct_password ", &hash));
    }

    #[test]
    fn test_verify_password_malformed_hash() {
        assert!(!verify_password("password", "invalid_hash"));
        assert!(!verify_password("password", "$argon2id$invalid"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn test_dummy_hash_is_parseable_and_never_matches() {
        let config = fast();
        let dummy = config.dummy_hash();

        let parsed = PasswordHash::new(&dummy).expect("dummy hash should parse");
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(dummy.contains("m=1024,t=1,p=1"));

        for password in ["", "password", "password123"] {
            assert!(!verify_password(password, &dummy));
        }
    }

    #[test]
    fn test_verify_survives_cost_change() {
        let old = fast().hash("password").unwrap();
        // Verification does not depend on the current configuration
        assert!(verify_password("password", &old));
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let passwords = [
            "simple",
            "with spaces",
            "with-special-chars!@#$%",
            "unicode-密码-パスワード",
        ];

        for password in passwords {
            let hash = fast().hash(password).unwrap();
            assert!(verify_password(password, &hash), "Password '{}' should verify", password);
        }
    }
}
