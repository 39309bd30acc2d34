/// In-memory store
///
/// Keeps users and tasks in maps behind a single `RwLock`. Every trait method
/// takes the lock once, which gives the same per-record atomicity the
/// PostgreSQL store gets from single statements. Used by the test suites and
/// when the server starts without `DATABASE_URL`.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{
    task::{CreateTask, SortDirection, Task, TaskPatch, TaskQuery, TaskSortField},
    user::{CreateUser, UpdateUser, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Tasks in insertion order
    tasks: Vec<Task>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn with_user<T>(&mut self, id: Uuid, f: impl FnOnce(&mut User) -> T) -> Option<T> {
        self.users.get_mut(&id).map(|user| {
            let out = f(user);
            user.updated_at = Utc::now();
            out
        })
    }
}

/// Store that lives in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_tasks(a: &Task, b: &Task, field: TaskSortField) -> Ordering {
    match field {
        TaskSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        TaskSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        TaskSortField::Description => a.description.cmp(&b.description),
        TaskSortField::Completed => a.completed.cmp(&b.completed),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.email_taken(&data.email, None) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            age: data.age,
            tokens: Vec::new(),
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &data.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        Ok(tables.with_user(id, |user| {
            if let Some(name) = data.name {
                user.name = name;
            }
            if let Some(email) = data.email {
                user.email = email;
            }
            if let Some(password_hash) = data.password_hash {
                user.password_hash = password_hash;
            }
            if let Some(age) = data.age {
                user.age = age;
            }
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let removed = tables.users.remove(&id).is_some();
        if removed {
            // Same as ON DELETE CASCADE
            tables.tasks.retain(|t| t.owner_id != id);
        }

        Ok(removed)
    }

    async fn push_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .with_user(id, |user| user.tokens.push(token.to_string()))
            .is_some())
    }

    async fn pull_token(&self, id: Uuid, token: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .with_user(id, |user| user.tokens.retain(|t| t != token))
            .is_some())
    }

    async fn clear_tokens(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.with_user(id, |user| user.tokens.clear()).is_some())
    }

    async fn set_avatar(&self, id: Uuid, avatar: Option<Vec<u8>>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(tables.with_user(id, |user| user.avatar = avatar).is_some())
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.users.len() as i64)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&data.owner_id) {
            return Err(StoreError::MissingOwner);
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            description: data.description,
            completed: data.completed,
            owner_id: data.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(task.clone());

        Ok(task)
    }

    async fn find_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn list_tasks(&self, owner_id: Uuid, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;

        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .filter(|t| query.completed.map_or(true, |c| t.completed == c))
            .cloned()
            .collect();

        if let Some(sort) = query.sort {
            // Stable, so ties keep insertion order like the SQL tiebreaker
            tasks.sort_by(|a, b| {
                let ordering = compare_tasks(a, b, sort.field);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let skip = query.skip.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);

        Ok(tasks.into_iter().skip(skip).take(limit).collect())
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        data: TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;

        Ok(tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .map(|task| {
                if let Some(description) = data.description {
                    task.description = description;
                }
                if let Some(completed) = data.completed {
                    task.completed = completed;
                }
                task.updated_at = Utc::now();
                task.clone()
            }))
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;

        let position = tables
            .tasks
            .iter()
            .position(|t| t.id == id && t.owner_id == owner_id);

        Ok(position.map(|index| tables.tasks.remove(index)))
    }

    async fn delete_tasks_by_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;

        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.owner_id != owner_id);

        Ok((before - tables.tasks.len()) as u64)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskSort;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$hash".to_string(),
            age: 0,
        }
    }

    fn new_task(owner_id: Uuid, description: &str, completed: bool) -> CreateTask {
        CreateTask {
            owner_id,
            description: description.to_string(),
            completed,
        }
    }

    #[tokio::test]
    async fn test_unique_email() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("a@example.com")).await.unwrap();
        let second = store.create_user(new_user("b@example.com")).await.unwrap();

        assert!(matches!(
            store.create_user(new_user("a@example.com")).await,
            Err(StoreError::DuplicateEmail)
        ));

        let taken = UpdateUser {
            email: Some("a@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(second.id, taken.clone()).await,
            Err(StoreError::DuplicateEmail)
        ));

        // Re-saving your own email is fine
        assert!(store.update_user(first.id, taken).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_token_list_order() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("t@example.com")).await.unwrap();

        for token in ["one", "two", "three"] {
            assert!(store.push_token(user.id, token).await.unwrap());
        }
        store.pull_token(user.id, "two").await.unwrap();

        let tokens = store.find_user(user.id).await.unwrap().unwrap().tokens;
        assert_eq!(tokens, vec!["one", "three"]);

        store.clear_tokens(user.id).await.unwrap();
        let tokens = store.find_user(user.id).await.unwrap().unwrap().tokens;
        assert!(tokens.is_empty());

        assert!(!store.push_token(Uuid::new_v4(), "stray").await.unwrap());
    }

    #[tokio::test]
    async fn test_tasks_are_owner_scoped() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();
        let task = store.create_task(new_task(alice.id, "Alice's", false)).await.unwrap();

        assert!(store.find_task(task.id, bob.id).await.unwrap().is_none());
        assert!(store
            .update_task(task.id, bob.id, TaskPatch { completed: Some(true), ..Default::default() })
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_task(task.id, bob.id).await.unwrap().is_none());

        let still_there = store.find_task(task.id, alice.id).await.unwrap().unwrap();
        assert!(!still_there.completed);
    }

    #[tokio::test]
    async fn test_create_task_requires_owner() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create_task(new_task(Uuid::new_v4(), "Orphan", false)).await,
            Err(StoreError::MissingOwner)
        ));
    }

    #[tokio::test]
    async fn test_list_query() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("list@example.com")).await.unwrap();
        for (description, completed) in [("b", true), ("c", false), ("a", true)] {
            store.create_task(new_task(owner.id, description, completed)).await.unwrap();
        }

        let all = store.list_tasks(owner.id, &TaskQuery::default()).await.unwrap();
        let order: Vec<&str> = all.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);

        let done = TaskQuery { completed: Some(true), ..Default::default() };
        assert_eq!(store.list_tasks(owner.id, &done).await.unwrap().len(), 2);

        let sorted = TaskQuery {
            sort: Some("description:desc".parse::<TaskSort>().unwrap()),
            skip: Some(1),
            limit: Some(1),
            ..Default::default()
        };
        let page = store.list_tasks(owner.id, &sorted).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].description, "b");
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("gone@example.com")).await.unwrap();
        let other = store.create_user(new_user("stays@example.com")).await.unwrap();
        let task = store.create_task(new_task(owner.id, "Mine", false)).await.unwrap();
        store.create_task(new_task(other.id, "Theirs", false)).await.unwrap();

        assert!(store.delete_user(owner.id).await.unwrap());
        assert!(store.find_task(task.id, owner.id).await.unwrap().is_none());
        assert_eq!(
            store.list_tasks(other.id, &TaskQuery::default()).await.unwrap().len(),
            1
        );
        assert!(!store.delete_user(owner.id).await.unwrap());
    }
}
