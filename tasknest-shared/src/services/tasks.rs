/// Task operations
///
/// Every call takes the acting user. A task is looked up by its id and that
/// user together, so someone else's task and a task that does not exist look
/// the same to the caller: `NotFound`.

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::ServiceError;
use crate::models::{
    task::{CreateTask, NewTask, Task, TaskPatch, TaskQuery},
    user::User,
    FieldError,
};
use crate::store::Store;

/// Owner-scoped task operations
#[derive(Clone)]
pub struct Tasks {
    store: Arc<dyn Store>,
}

impl Tasks {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a task owned by `owner`
    pub async fn create(&self, owner: &User, input: NewTask) -> Result<Task, ServiceError> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|e| ServiceError::Validation(FieldError::from_validation(&e)))?;

        let task = self
            .store
            .create_task(CreateTask {
                owner_id: owner.id,
                description: input.description,
                completed: input.completed,
            })
            .await?;

        info!(task_id = %task.id, owner_id = %owner.id, "Task created");
        Ok(task)
    }

    /// Lists the tasks of `owner` with optional filter, order and paging
    pub async fn list_for_owner(
        &self,
        owner: &User,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, ServiceError> {
        let tasks = self.store.list_tasks(owner.id, query).await?;
        debug!(owner_id = %owner.id, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    pub async fn get(&self, owner: &User, task_id: Uuid) -> Result<Task, ServiceError> {
        self.store
            .find_task(task_id, owner.id)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    /// Applies a patch given as a raw JSON object
    ///
    /// The task is resolved first; for a found task, a key outside the
    /// whitelist rejects the whole body.
    pub async fn update(
        &self,
        owner: &User,
        task_id: Uuid,
        body: Map<String, JsonValue>,
    ) -> Result<Task, ServiceError> {
        let current = self.get(owner, task_id).await?;
        let patch = TaskPatch::from_json(body)?;

        if patch.is_empty() {
            return Ok(current);
        }

        let task = self
            .store
            .update_task(task_id, owner.id, patch)
            .await?
            .ok_or(ServiceError::NotFound)?;

        info!(task_id = %task.id, owner_id = %owner.id, "Task updated");
        Ok(task)
    }

    /// Deletes a task and returns it
    pub async fn remove(&self, owner: &User, task_id: Uuid) -> Result<Task, ServiceError> {
        let task = self
            .store
            .delete_task(task_id, owner.id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        info!(task_id = %task.id, owner_id = %owner.id, "Task deleted");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::{memory::MemoryStore, UserStore};
    use serde_json::json;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(CreateUser {
                name: "Someone".to_string(),
                email: email.to_string(),
                password_hash: "$argon2id$hash".to_string(),
                age: 0,
            })
            .await
            .unwrap()
    }

    fn new_task(description: &str) -> NewTask {
        NewTask {
            description: description.to_string(),
            completed: false,
        }
    }

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    async fn setup() -> (Tasks, User, User) {
        let store = Arc::new(MemoryStore::new());
        let one = user(&store, "mike@example.com").await;
        let two = user(&store, "jess@example.com").await;
        (Tasks::new(store), one, two)
    }

    #[tokio::test]
    async fn test_create_binds_owner() {
        let (tasks, one, _) = setup().await;

        let task = tasks.create(&one, new_task("  From tests ")).await.unwrap();

        assert_eq!(task.owner_id, one.id);
        assert_eq!(task.description, "From tests");
        assert!(!task.completed);
    }

    #[tokio::test]
    async fn test_create_requires_description() {
        let (tasks, one, _) = setup().await;

        let result = tasks.create(&one, new_task("   ")).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_only_own_tasks() {
        let (tasks, one, two) = setup().await;
        tasks.create(&one, new_task("First task")).await.unwrap();
        tasks.create(&one, new_task("Second task")).await.unwrap();
        tasks.create(&two, new_task("Third task")).await.unwrap();

        let listed = tasks.list_for_owner(&one, &TaskQuery::default()).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|t| t.owner_id == one.id));
        assert_eq!(listed[0].description, "First task");
    }

    #[tokio::test]
    async fn test_other_owner_gets_not_found() {
        let (tasks, one, two) = setup().await;
        let task = tasks.create(&one, new_task("First task")).await.unwrap();

        assert!(matches!(tasks.get(&two, task.id).await, Err(ServiceError::NotFound)));
        assert!(matches!(
            tasks.update(&two, task.id, object(json!({ "completed": true }))).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(tasks.remove(&two, task.id).await, Err(ServiceError::NotFound)));

        let still_there = tasks.get(&one, task.id).await.unwrap();
        assert!(!still_there.completed);
    }

    #[tokio::test]
    async fn test_update_whitelist() {
        let (tasks, one, _) = setup().await;
        let task = tasks.create(&one, new_task("First task")).await.unwrap();

        let result = tasks
            .update(&one, task.id, object(json!({ "completed": true, "owner": "me" })))
            .await;
        assert!(matches!(result, Err(ServiceError::InvalidUpdates(_))));
        assert!(!tasks.get(&one, task.id).await.unwrap().completed);

        let updated = tasks
            .update(&one, task.id, object(json!({ "completed": true })))
            .await
            .unwrap();
        assert!(updated.completed);
        assert_eq!(updated.description, "First task");
    }

    #[tokio::test]
    async fn test_remove_returns_task() {
        let (tasks, one, _) = setup().await;
        let task = tasks.create(&one, new_task("First task")).await.unwrap();

        let removed = tasks.remove(&one, task.id).await.unwrap();
        assert_eq!(removed.id, task.id);
        assert!(matches!(tasks.get(&one, task.id).await, Err(ServiceError::NotFound)));
    }
}
