use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account identity record. `username` and `email` are globally unique;
/// `username` and `id` are immutable after creation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// Owned task item. `user_id` is always set server-side from the resolved
/// identity, never from client input.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub priority: Priority,
    pub description: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Owned note. `updated_at` is refreshed on every successful mutation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub category: Option<String>,
    pub color: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
