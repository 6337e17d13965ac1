/// Authentication and authorization primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 bearer token issuance and verification
/// - [`middleware`]: the authorization guard and `AuthContext` extractor
///
/// # Example
///
/// ```no_run
/// use orgauth_shared::auth::password::{hash_password, verify_password};
/// use orgauth_shared::auth::jwt::TokenService;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash));
///
/// let tokens = TokenService::new("secret-key-at-least-32-bytes-long!!");
/// let token = tokens.issue(Uuid::new_v4(), "user@example.com")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
