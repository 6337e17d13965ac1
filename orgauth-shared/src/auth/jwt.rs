/// Bearer token issuance and verification
///
/// Tokens are JWTs signed with HS256 (HMAC-SHA256) using a process-wide
/// secret. A token binds a user identity and email and is valid for exactly
/// [`TOKEN_TTL_SECONDS`] from issuance. There is no refresh or renewal path.
///
/// # Claims
///
/// - `sub`: user ID
/// - `email`: user email at issuance
/// - `iat`: issued at (Unix timestamp)
/// - `exp`: expiry (Unix timestamp), always `iat + 3600`
///
/// # Expiry
///
/// Expiry is checked here against an explicit clock (`verify_at`) with zero
/// leeway: a token is expired once `now >= exp`. The signature library's own
/// time check is disabled so that tests can advance the clock.
///
/// # Example
///
/// ```
/// use orgauth_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tokens = TokenService::new("your-secret-key-at-least-32-bytes");
/// let user_id = Uuid::new_v4();
///
/// let token = tokens.issue(user_id, "user@example.com")?;
/// let identity = tokens.verify(&token)?;
/// assert_eq!(identity.user_id, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifetime of every issued token
pub const TOKEN_TTL_SECONDS: i64 = 3600;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature does not match the payload
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Token is past its expiry
    #[error("Token has expired")]
    Expired,

    /// Token could not be parsed or is missing claims
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Claims carried by every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Email of the subject at issuance
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Builds claims issued at `now`, expiring [`TOKEN_TTL_SECONDS`] later
    pub fn new(user_id: Uuid, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();

        Self {
            sub: user_id,
            email: email.into(),
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        }
    }

    /// Checks expiry against the given clock
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Identity recovered from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// User the token was issued to
    pub user_id: Uuid,

    /// Email the token was issued with
    pub email: String,
}

impl From<Claims> for VerifiedIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

/// Issues and verifies tokens with a fixed signing secret
///
/// Built once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service for the given secret
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issues a token for the user, valid for one hour from now
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, JwtError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issues a token as if the current time were `now`
    pub fn issue_at(
        &self,
        user_id: Uuid,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, email, now))
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(e.to_string()))
    }

    /// Verifies a token against the current time
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, JwtError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token against the given clock
    ///
    /// # Errors
    ///
    /// - `JwtError::InvalidSignature` if the signature does not match
    /// - `JwtError::Expired` if `now >= exp`
    /// - `JwtError::Malformed` if the token cannot be decoded
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedIdentity, JwtError> {
        self.decode_claims(token)
            .and_then(|claims| {
                if claims.is_expired_at(now) {
                    Err(JwtError::Expired)
                } else {
                    Ok(claims)
                }
            })
            .map(VerifiedIdentity::from)
    }

    /// Decodes and checks the signature without looking at expiry
    pub fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Malformed(e.to_string()),
            })
    }
}
