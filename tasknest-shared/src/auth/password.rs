/// Password hashing and password rules
///
/// Passwords are hashed with Argon2id and stored as PHC strings, which embed the
/// algorithm, parameters and salt. Plaintext passwords never leave this module
/// in any other form.
///
/// # Parameters
///
/// - **Memory**: 19 MiB (19456 KiB)
/// - **Iterations**: 2 passes
/// - **Parallelism**: 1 lane
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("verysecret123456")?;
/// assert!(verify_password("verysecret123456", &hash)?);
/// assert!(!verify_password("wrong-guess-123", &hash)?);
/// # Ok(())
/// # }
/// ```

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Substring no password may contain (compared case-insensitively)
const FORBIDDEN_SUBSTRING: &str = "password";

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(19456)
        .t_cost(2)
        .p_cost(1)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password using Argon2id with a fresh random salt
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC hash string
///
/// The comparison is constant-time. Returns `Ok(false)` on mismatch and an
/// error only when the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Burns one verification against a fixed hash
///
/// Used when a login names an unknown email, so the response takes as long as
/// a wrong-password attempt.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// Computes the fixed hash used by [`verify_dummy`]
///
/// Call once at startup so the first unknown-email login does not also pay
/// for hashing.
pub fn prepare_dummy_hash() {
    let _ = dummy_hash();
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    DUMMY_HASH
        .get_or_init(|| hash_password("tasknest-dummy-credential").ok())
        .as_deref()
}

/// Checks a plaintext password against the account rules
///
/// - At least 8 characters long
/// - Does not contain "password" in any letter case
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("verysecret123456").is_ok());
/// assert!(validate_password_strength("2short").is_err());
/// assert!(validate_password_strength("MyPassWord99").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password.to_lowercase().contains(FORBIDDEN_SUBSTRING) {
        return Err("Password must not contain \"password\"".to_string());
    }

    Ok(())
}
