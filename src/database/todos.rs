use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::models::{Priority, Todo};
use crate::error::ServiceError;

const TODO_COLUMNS: &str =
    "id, text, completed, due_date, category, priority, description, user_id, created_at";

#[derive(Debug, Deserialize)]
pub struct NewTodo {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub description: Option<String>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct TodoChanges {
    pub text: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub description: Option<String>,
}

/// Task storage, scoped to one owner on every query. A missing id and
/// another owner's id are indistinguishable from the outside: both are
/// `NotFound`.
pub struct TodoStore {
    db: SqlitePool,
}

impl TodoStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, owner: i64) -> Result<Vec<Todo>, ServiceError> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = ? ORDER BY created_at, id"
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;

        Ok(todos)
    }

    pub async fn get(&self, owner: i64, id: i64) -> Result<Todo, ServiceError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::NotFound)?;

        Ok(todo)
    }

    pub async fn create(&self, owner: i64, new: NewTodo) -> Result<Todo, ServiceError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (text, completed, due_date, category, priority, description, user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(new.text)
        .bind(new.completed)
        .bind(new.due_date)
        .bind(new.category)
        .bind(new.priority)
        .bind(new.description)
        .bind(owner)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(todo)
    }

    pub async fn update(
        &self,
        owner: i64,
        id: i64,
        changes: TodoChanges,
    ) -> Result<Todo, ServiceError> {
        let mut todo = self.get(owner, id).await?;

        if let Some(text) = changes.text {
            todo.text = text;
        }
        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = changes.due_date {
            todo.due_date = Some(due_date);
        }
        if let Some(category) = changes.category {
            todo.category = Some(category);
        }
        if let Some(priority) = changes.priority {
            todo.priority = priority;
        }
        if let Some(description) = changes.description {
            todo.description = Some(description);
        }

        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos
             SET text = ?, completed = ?, due_date = ?, category = ?, priority = ?, description = ?
             WHERE id = ? AND user_id = ?
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(todo.text)
        .bind(todo.completed)
        .bind(todo.due_date)
        .bind(todo.category)
        .bind(todo.priority)
        .bind(todo.description)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::NotFound)?;

        Ok(todo)
    }

    pub async fn delete(&self, owner: i64, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }

    /// Bulk-delete the owner's completed todos; returns how many went.
    /// Vacuously succeeds with 0 when none match.
    pub async fn delete_completed(&self, owner: i64) -> Result<u64, ServiceError> {
        let result = sqlx::query("DELETE FROM todos WHERE user_id = ? AND completed = 1")
            .bind(owner)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::database::users::UserDirectory;

    async fn owner(directory: &UserDirectory, username: &str) -> i64 {
        directory
            .create(
                username,
                &format!("{username}@example.com"),
                username,
                "digest",
            )
            .await
            .unwrap()
            .id
    }

    fn todo(text: &str) -> NewTodo {
        NewTodo {
            text: text.to_string(),
            completed: false,
            due_date: None,
            category: None,
            priority: Priority::default(),
            description: None,
        }
    }

    #[tokio::test]
    async fn owner_is_injected_and_listed_in_creation_order() {
        let pool = test_pool().await;
        let alice = owner(&UserDirectory::new(pool.clone()), "alice").await;
        let store = TodoStore::new(pool);

        let first = store.create(alice, todo("first")).await.unwrap();
        let second = store.create(alice, todo("second")).await.unwrap();
        assert_eq!(first.user_id, alice);
        assert_eq!(first.priority, Priority::Medium);

        let listed = store.list(alice).await.unwrap();
        assert_eq!(
            listed.iter().map(|t| t.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }

    #[tokio::test]
    async fn foreign_items_collapse_to_not_found() {
        let pool = test_pool().await;
        let directory = UserDirectory::new(pool.clone());
        let alice = owner(&directory, "alice").await;
        let bob = owner(&directory, "bob").await;
        let store = TodoStore::new(pool);

        let item = store.create(alice, todo("alice's")).await.unwrap();

        assert!(matches!(
            store.get(bob, item.id).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            store.update(bob, item.id, TodoChanges::default()).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            store.delete(bob, item.id).await,
            Err(ServiceError::NotFound)
        ));

        // The owner still sees it untouched
        let mine = store.get(alice, item.id).await.unwrap();
        assert_eq!(mine.text, "alice's");
    }

    #[tokio::test]
    async fn update_changes_only_provided_fields() {
        let pool = test_pool().await;
        let alice = owner(&UserDirectory::new(pool.clone()), "alice").await;
        let store = TodoStore::new(pool);

        let item = store.create(alice, todo("buy milk")).await.unwrap();
        let updated = store
            .update(
                alice,
                item.id,
                TodoChanges {
                    completed: Some(true),
                    priority: Some(Priority::High),
                    ..TodoChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.text, "buy milk");
        assert!(updated.completed);
        assert_eq!(updated.priority, Priority::High);
    }

    #[tokio::test]
    async fn delete_completed_touches_only_the_callers_completed_items() {
        let pool = test_pool().await;
        let directory = UserDirectory::new(pool.clone());
        let alice = owner(&directory, "alice").await;
        let bob = owner(&directory, "bob").await;
        let store = TodoStore::new(pool);

        let done = store.create(alice, todo("done")).await.unwrap();
        store
            .update(
                alice,
                done.id,
                TodoChanges {
                    completed: Some(true),
                    ..TodoChanges::default()
                },
            )
            .await
            .unwrap();
        store.create(alice, todo("pending")).await.unwrap();

        let bobs = store.create(bob, todo("bob done")).await.unwrap();
        store
            .update(
                bob,
                bobs.id,
                TodoChanges {
                    completed: Some(true),
                    ..TodoChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(store.delete_completed(alice).await.unwrap(), 1);
        let remaining = store.list(alice).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "pending");

        // Bob's completed item is untouched, and a second sweep is vacuous
        assert_eq!(store.list(bob).await.unwrap().len(), 1);
        assert_eq!(store.delete_completed(alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found() {
        let pool = test_pool().await;
        let alice = owner(&UserDirectory::new(pool.clone()), "alice").await;
        let store = TodoStore::new(pool);

        let item = store.create(alice, todo("once")).await.unwrap();
        store.delete(alice, item.id).await.unwrap();
        assert!(matches!(
            store.delete(alice, item.id).await,
            Err(ServiceError::NotFound)
        ));
    }
}
