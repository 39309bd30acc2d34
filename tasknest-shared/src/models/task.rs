/// Task model, creation input, patches and list queries
///
/// Every task has exactly one owner. Store operations take the owner id next
/// to the task id, so a task belonging to someone else is simply not found.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     description TEXT NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;
use validator::Validate;

use super::{check_whitelist, reject_nulls, user::PatchError, FieldError};

/// Fields a client may change on a task
pub const ALLOWED_TASK_UPDATES: &[&str] = &["description", "completed"];

/// A task owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Task text (trimmed, non-empty)
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// Owning user
    #[serde(rename = "owner")]
    pub owner_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Task creation request body
///
/// Unknown keys (including any client-supplied owner) are ignored; the owner
/// always comes from the authenticated identity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTask {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub completed: bool,
}

impl NewTask {
    pub fn normalized(mut self) -> Self {
        self.description = self.description.trim().to_string();
        self
    }
}

/// Input for inserting a task into the store
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub description: String,
    pub completed: bool,
}

/// Task update with whitelisted fields only
///
/// Also used as the store-level update input; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct TaskPatch {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,

    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Builds a patch from a raw JSON object, rejecting the whole object if
    /// any key is outside [`ALLOWED_TASK_UPDATES`]
    pub fn from_json(body: Map<String, JsonValue>) -> Result<Self, PatchError> {
        check_whitelist(&body, ALLOWED_TASK_UPDATES).map_err(PatchError::Disallowed)?;
        reject_nulls(&body).map_err(PatchError::Invalid)?;

        let mut patch: TaskPatch = serde_json::from_value(JsonValue::Object(body))
            .map_err(|e| PatchError::Invalid(vec![FieldError::new("body", e.to_string())]))?;
        patch.description = patch.description.map(|d| d.trim().to_string());

        patch
            .validate()
            .map_err(|e| PatchError::Invalid(FieldError::from_validation(&e)))?;

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }
}

/// Field a task list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    CreatedAt,
    UpdatedAt,
    Description,
    Completed,
}

impl TaskSortField {
    /// Column name in the `tasks` table
    pub fn column(&self) -> &'static str {
        match self {
            TaskSortField::CreatedAt => "created_at",
            TaskSortField::UpdatedAt => "updated_at",
            TaskSortField::Description => "description",
            TaskSortField::Completed => "completed",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering for a task list, parsed from `field:direction`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

impl FromStr for TaskSort {
    type Err = FieldError;

    /// Parses `createdAt:desc`, `description`, `completed:asc`, ...
    ///
    /// The direction defaults to ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, Some(direction)),
            None => (s, None),
        };

        let field = match field {
            "createdAt" => TaskSortField::CreatedAt,
            "updatedAt" => TaskSortField::UpdatedAt,
            "description" => TaskSortField::Description,
            "completed" => TaskSortField::Completed,
            other => {
                return Err(FieldError::new(
                    "sortBy",
                    format!("Cannot sort by '{}'", other),
                ))
            }
        };

        let direction = match direction {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(FieldError::new(
                    "sortBy",
                    format!("Unknown sort direction '{}'", other),
                ))
            }
        };

        Ok(TaskSort { field, direction })
    }
}

/// Filter, ordering and pagination for listing a user's tasks
///
/// The default query returns every owned task in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub sort: Option<TaskSort>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

/// Raw query-string options for `GET /tasks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListParams {
    pub completed: Option<String>,
    pub limit: Option<String>,
    pub skip: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

impl TryFrom<TaskListParams> for TaskQuery {
    type Error = Vec<FieldError>;

    fn try_from(params: TaskListParams) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        let mut query = TaskQuery::default();

        if let Some(completed) = params.completed {
            match completed.as_str() {
                "true" => query.completed = Some(true),
                "false" => query.completed = Some(false),
                _ => errors.push(FieldError::new("completed", "Must be true or false")),
            }
        }

        for (field, raw, slot) in [
            ("limit", params.limit, &mut query.limit),
            ("skip", params.skip, &mut query.skip),
        ] {
            if let Some(raw) = raw {
                match raw.parse::<u32>() {
                    Ok(value) => *slot = Some(value),
                    Err(_) => errors.push(FieldError::new(field, "Must be a non-negative integer")),
                }
            }
        }

        if let Some(sort_by) = params.sort_by {
            match sort_by.parse::<TaskSort>() {
                Ok(sort) => query.sort = Some(sort),
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(errors)
        }
    }
}
