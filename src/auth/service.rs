use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenService;
use crate::database::models::User;
use crate::database::users::UserDirectory;
use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Registration, login and credential maintenance.
///
/// Sessions are anonymous until a presented token verifies, and fall back
/// to anonymous when it expires; nothing is stored server-side between
/// requests.
pub struct AuthService {
    users: UserDirectory,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(db: SqlitePool, hasher: PasswordHasher, tokens: TokenService) -> Self {
        Self {
            users: UserDirectory::new(db),
            hasher,
            tokens,
        }
    }

    /// Create an account and immediately issue a token for it; registration
    /// implies login. Only the password's hash is ever stored.
    pub async fn register(&self, account: NewAccount) -> Result<(User, String), ServiceError> {
        let hashed = self.hasher.hash(&account.password)?;
        let user = self
            .users
            .create(&account.username, &account.email, &account.name, &hashed)
            .await?;

        let token = self.tokens.issue(&user.username)?;
        Ok((user, token))
    }

    /// Login by email. Unknown email and wrong password produce the same
    /// undifferentiated error.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), ServiceError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.hashed_password) {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.username)?;
        Ok((user, token))
    }

    /// Update the display name; an absent name is a no-op.
    pub async fn update_profile(
        &self,
        identity: &User,
        name: Option<String>,
    ) -> Result<User, ServiceError> {
        match name {
            Some(name) => self.users.update_name(identity.id, &name).await,
            None => Ok(identity.clone()),
        }
    }

    /// Replace the stored hash after the old password verifies. Outstanding
    /// tokens stay valid until their own expiry.
    pub async fn change_password(
        &self,
        identity: &User,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if !self.hasher.verify(old_password, &identity.hashed_password) {
            return Err(ServiceError::InvalidCredentials);
        }

        let hashed = self.hasher.hash(new_password)?;
        self.users.update_password(identity.id, &hashed).await
    }

    /// Remove the account; its todos and notes cascade away with it. A
    /// still-valid token for the deleted identity stops resolving at the
    /// guard.
    pub async fn delete_account(&self, identity: &User) -> Result<(), ServiceError> {
        self.users.delete(identity.id).await
    }
}
