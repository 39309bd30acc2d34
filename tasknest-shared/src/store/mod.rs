/// Persistence layer
///
/// The rest of the crate talks to storage through the [`Store`] trait. Two
/// implementations exist:
///
/// - [`postgres::PgStore`]: PostgreSQL through sqlx (production)
/// - [`memory::MemoryStore`]: in-process maps (tests, database-less runs)
///
/// Both give the same guarantees: unique emails, single-record atomic updates
/// (the token list included), owner-scoped task access and cascading task
/// deletion when a user goes away. Task lookups always take the owner id, so
/// there is no way to reach another user's task through this interface.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    task::{CreateTask, Task, TaskPatch, TaskQuery},
    user::{CreateUser, UpdateUser, User},
};

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already has this email
    #[error("Email is already in use")]
    DuplicateEmail,

    /// A task was created for a user that does not exist
    #[error("Task owner does not exist")]
    MissingOwner,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(constraint) = db_err.constraint() {
                if constraint.contains("email") {
                    return StoreError::DuplicateEmail;
                }
                if constraint.contains("owner") {
                    return StoreError::MissingOwner;
                }
            }
        }

        StoreError::Database(err.to_string())
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// User record operations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user with an empty token list and no avatar
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up by (already lower-cased) email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Writes the `Some` fields and bumps `updated_at`
    ///
    /// Returns `None` if the user does not exist.
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// Deletes the user record; returns false if it did not exist
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// Appends a token to the end of the user's token list
    async fn push_token(&self, id: Uuid, token: &str) -> StoreResult<bool>;

    /// Removes one token from the user's token list
    async fn pull_token(&self, id: Uuid, token: &str) -> StoreResult<bool>;

    /// Empties the user's token list
    async fn clear_tokens(&self, id: Uuid) -> StoreResult<bool>;

    /// Stores or clears the avatar bytes
    async fn set_avatar(&self, id: Uuid, avatar: Option<Vec<u8>>) -> StoreResult<bool>;

    async fn count_users(&self) -> StoreResult<i64>;
}

/// Owner-scoped task operations
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a task; fails with `MissingOwner` if the owner does not exist
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>>;

    async fn list_tasks(&self, owner_id: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        data: TaskPatch,
    ) -> StoreResult<Option<Task>>;

    /// Deletes and returns the task, or `None` if the owner has no such task
    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>>;

    /// Deletes every task of one owner, returning how many went
    async fn delete_tasks_by_owner(&self, owner_id: Uuid) -> StoreResult<u64>;
}

/// Complete persistence collaborator
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Checks that the backing storage answers
    async fn ping(&self) -> StoreResult<()>;
}
