/// JWT token generation and validation
///
/// Tokens are signed with HS256 (HMAC-SHA256) and carry the user's identity.
/// A single token type is issued at login/registration; the refresh endpoint
/// re-issues a token from an expired-but-authentic one, so this module also
/// exposes a signature-only decode that ignores expiry.
///
/// # Security
///
/// - **Algorithm**: HS256
/// - **Expiration**: 7 days by default
/// - **Validation**: signature, expiration, and issuer checks
/// - **Secret**: at least 32 bytes, enforced at config load
///
/// # Example
///
/// ```
/// use leadline_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "a-secret-key-that-is-at-least-32-bytes";
///
/// let token = create_token(&Claims::new(user_id), secret)?;
/// let claims = validate_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer embedded in every claim set
const ISSUER: &str = "leadline";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// JWT claims structure
///
/// # Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "leadline")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims with the default 7-day expiration
    pub fn new(user_id: Uuid) -> Self {
        Self::with_expiration(user_id, Duration::days(7))
    }

    /// Creates claims with a custom expiration
    pub fn with_expiration(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a JWT token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, expiration, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for wrong issuers, and `JwtError::ValidationError` otherwise.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Decodes a token while ignoring its expiration
///
/// Used by the refresh endpoint: an expired token with a valid signature can
/// still be exchanged for a fresh one, provided the user is still active.
/// The signature and issuer are fully verified.
///
/// # Errors
///
/// Returns an error if the signature or issuer is invalid.
pub fn decode_expired_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();

        let token = create_token(&Claims::new(user_id), SECRET).expect("Should create token");
        let validated = validate_token(&token, SECRET).expect("Should validate token");

        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.iss, ISSUER);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4()), SECRET).unwrap();

        let result = validate_token(&token, "wrong-secret-that-is-long-enough-too");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(Uuid::new_v4(), Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_decode_expired_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::with_expiration(user_id, Duration::seconds(-3600));
        let token = create_token(&claims, SECRET).unwrap();

        // Regular validation rejects it, the refresh path decodes it.
        assert!(validate_token(&token, SECRET).is_err());

        let decoded = decode_expired_token(&token, SECRET).expect("Should decode expired token");
        assert_eq!(decoded.sub, user_id);
    }

    #[test]
    fn test_decode_expired_rejects_bad_signature() {
        let token = create_token(&Claims::new(Uuid::new_v4()), SECRET).unwrap();

        let result = decode_expired_token(&token, "another-secret-also-32-bytes-long!!");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let mut claims = Claims::new(Uuid::new_v4());
        claims.iss = "someone-else".to_string();

        let token = create_token(&claims, SECRET).unwrap();
        let result = validate_token(&token, SECRET);

        assert!(matches!(result.unwrap_err(), JwtError::InvalidIssuer));
    }
}
