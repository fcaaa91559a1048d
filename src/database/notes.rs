use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::database::models::Note;
use crate::error::ServiceError;

const NOTE_COLUMNS: &str = "id, title, content, category, color, user_id, created_at, updated_at";

pub const DEFAULT_COLOR: &str = "yellow";

#[derive(Debug, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
}

/// Note storage with the same ownership collapse as todos. Listing is by
/// last-updated descending; `updated_at` moves on every successful update.
pub struct NoteStore {
    db: SqlitePool,
}

impl NoteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self, owner: i64) -> Result<Vec<Note>, ServiceError> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ? ORDER BY updated_at DESC, id DESC"
        ))
        .bind(owner)
        .fetch_all(&self.db)
        .await?;

        Ok(notes)
    }

    pub async fn get(&self, owner: i64, id: i64) -> Result<Note, ServiceError> {
        let note = sqlx::query_as::<_, Note>(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::NotFound)?;

        Ok(note)
    }

    pub async fn create(&self, owner: i64, new: NewNote) -> Result<Note, ServiceError> {
        let now = Utc::now();
        let note = sqlx::query_as::<_, Note>(&format!(
            "INSERT INTO notes (title, content, category, color, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(new.title)
        .bind(new.content)
        .bind(new.category)
        .bind(new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()))
        .bind(owner)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(note)
    }

    pub async fn update(
        &self,
        owner: i64,
        id: i64,
        changes: NoteChanges,
    ) -> Result<Note, ServiceError> {
        let mut note = self.get(owner, id).await?;

        if let Some(title) = changes.title {
            note.title = title;
        }
        if let Some(content) = changes.content {
            note.content = Some(content);
        }
        if let Some(category) = changes.category {
            note.category = Some(category);
        }
        if let Some(color) = changes.color {
            note.color = color;
        }

        let note = sqlx::query_as::<_, Note>(&format!(
            "UPDATE notes
             SET title = ?, content = ?, category = ?, color = ?, updated_at = ?
             WHERE id = ? AND user_id = ?
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(note.title)
        .bind(note.content)
        .bind(note.category)
        .bind(note.color)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::NotFound)?;

        Ok(note)
    }

    pub async fn delete(&self, owner: i64, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::database::users::UserDirectory;
    use std::time::Duration;

    async fn owner(pool: &SqlitePool, username: &str) -> i64 {
        UserDirectory::new(pool.clone())
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

    fn note(title: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: None,
            category: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn color_defaults_to_yellow() {
        let pool = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let store = NoteStore::new(pool);

        let created = store.create(alice, note("groceries")).await.unwrap();
        assert_eq!(created.color, DEFAULT_COLOR);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_and_round_trips() {
        let pool = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let store = NoteStore::new(pool);

        let created = store.create(alice, note("X")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let updated = store
            .update(
                alice,
                created.id,
                NoteChanges {
                    color: Some("blue".to_string()),
                    ..NoteChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "X");
        assert_eq!(updated.color, "blue");
        assert!(updated.updated_at > updated.created_at);

        let listed = store.list(alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "X");
        assert_eq!(listed[0].color, "blue");
    }

    #[tokio::test]
    async fn listing_orders_by_last_update_descending() {
        let pool = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let store = NoteStore::new(pool);

        let first = store.create(alice, note("first")).await.unwrap();
        let second = store.create(alice, note("second")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        store
            .update(
                alice,
                first.id,
                NoteChanges {
                    content: Some("bumped".to_string()),
                    ..NoteChanges::default()
                },
            )
            .await
            .unwrap();

        let listed = store.list(alice).await.unwrap();
        assert_eq!(
            listed.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }

    #[tokio::test]
    async fn foreign_notes_collapse_to_not_found() {
        let pool = test_pool().await;
        let alice = owner(&pool, "alice").await;
        let bob = owner(&pool, "bob").await;
        let store = NoteStore::new(pool);

        let item = store.create(alice, note("private")).await.unwrap();
        assert!(matches!(
            store.get(bob, item.id).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            store.delete(bob, item.id).await,
            Err(ServiceError::NotFound)
        ));
    }
}
