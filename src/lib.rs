pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;

use sqlx::SqlitePool;

use auth::{AuthService, PasswordHasher, TokenService};
use database::notes::NoteStore;
use database::todos::TodoStore;
use database::users::UserDirectory;

/// Shared per-process handles: the connection pool and the two pieces of
/// security configuration services need. Everything is passed explicitly;
/// no hidden globals.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub hasher: PasswordHasher,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(db: SqlitePool, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self { db, hasher, tokens }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.db.clone(), self.hasher.clone(), self.tokens.clone())
    }

    pub fn users(&self) -> UserDirectory {
        UserDirectory::new(self.db.clone())
    }

    pub fn todos(&self) -> TodoStore {
        TodoStore::new(self.db.clone())
    }

    pub fn notes(&self) -> NoteStore {
        NoteStore::new(self.db.clone())
    }
}
