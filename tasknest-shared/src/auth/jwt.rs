/// Signed bearer tokens
///
/// A token is an HS256 JWT carrying the user id (`sub`) and a random nonce
/// (`jti`). The signature lets the server recover the user id without a
/// lookup table; whether the token is still live is decided separately by the
/// user's stored token list (see [`crate::auth::tokens`]).
///
/// Tokens carry no `exp` claim. They stay valid until revoked.
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::jwt::{create_token, decode_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "a-secret-of-at-least-thirty-two-bytes";
///
/// let token = create_token(&Claims::new(user_id), secret)?;
/// let claims = decode_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on every token
pub const ISSUER: &str = "tasknest";

/// Number of random bytes in the token nonce
const NONCE_BYTES: usize = 16;

/// Error type for token signing and decoding
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, issuer or structure check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Invalid issuer
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Claims embedded in a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Token ID - random nonce, makes every issued token distinct
    pub jti: String,

    /// Issuer - always "tasknest"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Creates claims for a user with a fresh random nonce
    pub fn new(user_id: Uuid) -> Self {
        let mut nonce = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut nonce);

        Self {
            sub: user_id,
            jti: hex::encode(nonce),
            iss: ISSUER.to_string(),
            iat: Utc::now().timestamp(),
        }
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| TokenError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies the signature and issuer of a token and returns its claims
///
/// Expiry is not checked; tokens are revoked explicitly instead.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["sub", "iss"]);
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
        _ => TokenError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
