use database::{DatabaseError, ErrorCategory};
use std::sync::Arc;
use validator::Validate;

use crate::data_access::UserDataAccess;
use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, NewUser, UpdateUser, User, UserId};
use crate::password::PasswordHashing;
use crate::repository::UserStore;

/// Service layer for User business logic.
///
/// Protocol-agnostic: both the HTTP and the gRPC adapters call the same
/// instance. Cloning is cheap and shares the underlying store.
pub struct UserService<S> {
    data: UserDataAccess<S>,
    hasher: Arc<dyn PasswordHashing>,
}

impl<S> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl<S: UserStore> UserService<S> {
    pub fn new(data: UserDataAccess<S>, hasher: Arc<dyn PasswordHashing>) -> Self {
        Self { data, hasher }
    }

    /// Create a new user with password hashing
    #[tracing::instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input.validate()?;

        let password_digest = self.hash_password(input.password.clone()).await?;
        let new_user = NewUser {
            name: input.name,
            email: input.email,
            password_digest,
        };
        let email = new_user.email.clone();

        let created = self
            .data
            .create(new_user)
            .await
            .map_err(|e| on_unique_violation(e, &email))?;

        tracing::info!(user_id = created.id, "User created");
        Ok(created)
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: UserId) -> UserResult<User> {
        self.data
            .find_by_id(id)
            .await
            .map_err(|e| on_not_found(e, || UserError::NotFound(id)))
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> UserResult<User> {
        self.data
            .find_by_email(email)
            .await
            .map_err(|e| on_not_found(e, || UserError::EmailNotFound(email.to_string())))
    }

    /// Partial update: only supplied, non-empty fields overwrite stored values
    #[tracing::instrument(skip(self, input))]
    pub async fn update_user(&self, id: UserId, input: UpdateUser) -> UserResult<User> {
        let changes = input.normalized();
        changes.validate()?;

        let mut user = self.get_user(id).await?;
        user.apply_update(changes);
        let email = user.email.clone();

        let updated = self.data.update(user).await.map_err(|e| match e.category() {
            ErrorCategory::NotFound => UserError::NotFound(id),
            _ => on_unique_violation(e, &email),
        })?;

        tracing::info!(user_id = id, "User updated");
        Ok(updated)
    }

    /// Delete a user. Deleting an unknown id succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> UserResult<()> {
        self.data.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    /// All users in insertion order
    pub async fn list_users(&self) -> UserResult<Vec<User>> {
        Ok(self.data.list_all().await?)
    }

    /// Check `password` against the stored digest of `user`
    pub async fn validate_credentials(&self, user: &User, password: &str) -> UserResult<()> {
        let hasher = Arc::clone(&self.hasher);
        let digest = user.password_digest.clone();
        let password = password.to_string();

        let matches = tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| UserError::PasswordHash(format!("verify task failed: {}", e)))?;

        if matches {
            Ok(())
        } else {
            Err(UserError::InvalidCredentials)
        }
    }

    /// Argon2 is CPU-bound, so it runs on the blocking pool
    async fn hash_password(&self, password: String) -> UserResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| UserError::PasswordHash(format!("hash task failed: {}", e)))?
    }

    /// Login flow: unknown email and wrong password are indistinguishable
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> UserResult<User> {
        let user = self.get_user_by_email(email).await.map_err(|e| match e {
            UserError::EmailNotFound(_) => UserError::InvalidCredentials,
            other => other,
        })?;

        self.validate_credentials(&user, password)
            .await
            .inspect_err(|_| {
                tracing::warn!(user_id = user.id, "Password mismatch");
            })?;

        Ok(user)
    }

    /// Store reachability, reported to the metrics sink
    pub async fn check_health(&self) -> UserResult<()> {
        Ok(self.data.ping().await?)
    }
}

fn on_unique_violation(err: DatabaseError, email: &str) -> UserError {
    match err.category() {
        ErrorCategory::UniqueViolation => UserError::AlreadyExists(email.to_string()),
        _ => UserError::Database(err),
    }
}

fn on_not_found(err: DatabaseError, not_found: impl FnOnce() -> UserError) -> UserError {
    match err.category() {
        ErrorCategory::NotFound => not_found(),
        _ => UserError::Database(err),
    }
}
