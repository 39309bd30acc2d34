/// PostgreSQL store
///
/// Each trait method is a single statement, so every change to one user or one
/// task is atomic at the row level. The token list lives in a `TEXT[]` column
/// and is changed with `array_append` / `array_remove`, which keeps concurrent
/// logins for the same user from overwriting each other.
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::db::pool::{create_pool, DatabaseConfig};
/// use tasknest_shared::store::{postgres::PgStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgStore::new(pool);
///
/// let user = store.find_user_by_email("mike@example.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreResult, TaskStore, UserStore};
use crate::models::{
    task::{CreateTask, Task, TaskPatch, TaskQuery},
    user::{CreateUser, UpdateUser, User},
};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, age, tokens, avatar, created_at, updated_at";

const TASK_COLUMNS: &str = "id, description, completed, owner_id, created_at, updated_at";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, age) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.age)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.age.is_some() {
            bind_count += 1;
            query.push_str(&format!(", age = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {}", USER_COLUMNS));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(age) = data.age {
            q = q.bind(age);
        }

        let user = q.fetch_optional(&self.pool).await?;

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = array_append(tokens, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn pull_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = array_remove(tokens, $2), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_tokens(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET tokens = '{}', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_avatar(&self, id: Uuid, avatar: Option<Vec<u8>>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET avatar = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(avatar)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let query = format!(
            "INSERT INTO tasks (owner_id, description, completed) \
             VALUES ($1, $2, $3) \
             RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.owner_id)
            .bind(data.description)
            .bind(data.completed)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>> {
        let query = format!(
            "SELECT {} FROM tasks WHERE id = $1 AND owner_id = $2",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn list_tasks(&self, owner_id: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let mut sql = format!("SELECT {} FROM tasks WHERE owner_id = $1", TASK_COLUMNS);
        let mut bind_count = 1;

        if query.completed.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" AND completed = ${}", bind_count));
        }

        // Sort columns come from a closed enum, never from client text
        match query.sort {
            Some(sort) => sql.push_str(&format!(
                " ORDER BY {} {}, seq ASC",
                sort.field.column(),
                sort.direction.as_sql()
            )),
            None => sql.push_str(" ORDER BY seq ASC"),
        }

        if query.limit.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" LIMIT ${}", bind_count));
        }
        if query.skip.is_some() {
            bind_count += 1;
            sql.push_str(&format!(" OFFSET ${}", bind_count));
        }

        debug!(owner_id = %owner_id, sql = %sql, "Listing tasks");

        let mut q = sqlx::query_as::<_, Task>(&sql).bind(owner_id);

        if let Some(completed) = query.completed {
            q = q.bind(completed);
        }
        if let Some(limit) = query.limit {
            q = q.bind(i64::from(limit));
        }
        if let Some(skip) = query.skip {
            q = q.bind(i64::from(skip));
        }

        let tasks = q.fetch_all(&self.pool).await?;

        Ok(tasks)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        data: TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND owner_id = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(owner_id);

        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let task = q.fetch_optional(&self.pool).await?;

        Ok(task)
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>> {
        let query = format!(
            "DELETE FROM tasks WHERE id = $1 AND owner_id = $2 RETURNING {}",
            TASK_COLUMNS
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn delete_tasks_by_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}
