/// Account and task operations
///
/// These are the operations the HTTP layer calls. Each takes the
/// authenticated [`User`](crate::models::user::User) where ownership matters
/// and returns a [`ServiceError`] the HTTP layer maps to a status code.
///
/// - `accounts`: signup, login, logout, profile updates, deletion, avatars
/// - `tasks`: owner-scoped task CRUD

pub mod accounts;
pub mod error;
pub mod tasks;

pub use accounts::Accounts;
pub use error::ServiceError;
pub use tasks::Tasks;
