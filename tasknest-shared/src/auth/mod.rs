/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the password rules
/// - [`jwt`]: signing and decoding bearer tokens
/// - [`tokens`]: the Token Service (issue, validate, revoke)
/// - [`context`]: the identity attached to authenticated requests
///
/// Authorization is ownership: every task operation is scoped by the
/// authenticated user's id, so there are no roles or scopes to check.

pub mod context;
pub mod jwt;
pub mod password;
pub mod tokens;
