use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::User;
use crate::error::{DuplicateField, ServiceError};

const USER_COLUMNS: &str = "id, username, email, name, hashed_password, created_at";

/// Lookup and uniqueness enforcement for account identities.
pub struct UserDirectory {
    db: SqlitePool,
}

impl UserDirectory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Create an account, enforcing both uniqueness constraints before the
    /// insert becomes visible. Username is checked first, then email; the
    /// reported field follows that order when both collide.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        name: &str,
        hashed_password: &str,
    ) -> Result<User, ServiceError> {
        let mut tx = self.db.begin().await?;

        let username_taken: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&mut *tx)
                .await?;
        if username_taken.is_some() {
            return Err(ServiceError::Duplicate(DuplicateField::Username));
        }

        let email_taken: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        if email_taken.is_some() {
            return Err(ServiceError::Duplicate(DuplicateField::Email));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, name, hashed_password, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(email)
        .bind(name)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(remap_unique_violation)?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn update_name(&self, id: i64, name: &str) -> Result<User, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ServiceError::Unauthenticated)?;

        Ok(user)
    }

    pub async fn update_password(&self, id: i64, hashed_password: &str) -> Result<(), ServiceError> {
        let result = sqlx::query("UPDATE users SET hashed_password = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::Unauthenticated);
        }
        Ok(())
    }

    /// Remove an account. Todos and notes go with it via `ON DELETE CASCADE`.
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::Unauthenticated);
        }
        Ok(())
    }
}

/// A constraint violation that slipped past the pre-check (concurrent
/// registration) must still surface as `Duplicate`, never as a raw
/// persistence fault.
fn remap_unique_violation(err: sqlx::Error) -> ServiceError {
    if let sqlx::Error::Database(ref db) = err {
        if db.is_unique_violation() {
            // SQLite reports e.g. "UNIQUE constraint failed: users.email"
            if db.message().contains("users.email") {
                return ServiceError::Duplicate(DuplicateField::Email);
            }
            return ServiceError::Duplicate(DuplicateField::Username);
        }
    }
    ServiceError::Database(err)
}
