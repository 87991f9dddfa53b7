use async_trait::async_trait;
use chrono::Utc;
use database::{DatabaseError, DatabaseResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{NewUser, User, UserId};

/// Predicate for [`UserStore::find_one`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(UserId),
    Email(String),
}

impl std::fmt::Display for UserLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserLookup::Id(id) => write!(f, "id={id}"),
            UserLookup::Email(email) => write!(f, "email={email}"),
        }
    }
}

/// Persistence collaborator for users.
///
/// Implementations report a violated email uniqueness as
/// [`DatabaseError::UniqueViolation`] and a missing row as
/// [`DatabaseError::NotFound`]; everything else is treated as transient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user, assigning id and timestamps
    async fn create(&self, user: NewUser) -> DatabaseResult<User>;

    /// Fetch exactly one user or fail with `NotFound`
    async fn find_one(&self, lookup: UserLookup) -> DatabaseResult<User>;

    /// Persist every mutable field of an existing user and bump `updated_at`
    async fn save(&self, user: User) -> DatabaseResult<User>;

    /// Hard delete; a missing id is not an error
    async fn delete_by_id(&self, id: UserId) -> DatabaseResult<()>;

    /// All users in insertion order
    async fn find_all(&self) -> DatabaseResult<Vec<User>>;

    /// Cheap reachability probe
    async fn ping(&self) -> DatabaseResult<()>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    users: BTreeMap<UserId, User>,
    last_id: UserId,
}

/// In-memory implementation of UserStore (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &BTreeMap<UserId, User>, email: &str, except: Option<UserId>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> DatabaseResult<User> {
        let mut state = self.state.write().await;

        if email_taken(&state.users, &user.email, None) {
            return Err(DatabaseError::UniqueViolation(format!(
                "users.email = {}",
                user.email
            )));
        }

        state.last_id += 1;
        let now = Utc::now();
        let created = User {
            id: state.last_id,
            name: user.name,
            email: user.email,
            password_digest: user.password_digest,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(created.id, created.clone());

        tracing::debug!(user_id = created.id, "Created user");
        Ok(created)
    }

    async fn find_one(&self, lookup: UserLookup) -> DatabaseResult<User> {
        let state = self.state.read().await;

        let found = match &lookup {
            UserLookup::Id(id) => state.users.get(id),
            UserLookup::Email(email) => state.users.values().find(|u| &u.email == email),
        };

        found
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("user {lookup}")))
    }

    async fn save(&self, user: User) -> DatabaseResult<User> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&user.id) {
            return Err(DatabaseError::NotFound(format!("user id={}", user.id)));
        }
        if email_taken(&state.users, &user.email, Some(user.id)) {
            return Err(DatabaseError::UniqueViolation(format!(
                "users.email = {}",
                user.email
            )));
        }

        let Some(stored) = state.users.get_mut(&user.id) else {
            return Err(DatabaseError::NotFound(format!("user id={}", user.id)));
        };

        stored.name = user.name;
        stored.email = user.email;
        stored.password_digest = user.password_digest;
        stored.updated_at = stored.updated_at.max(Utc::now());

        tracing::debug!(user_id = stored.id, "Updated user");
        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: UserId) -> DatabaseResult<()> {
        let mut state = self.state.write().await;

        if state.users.remove(&id).is_some() {
            tracing::debug!(user_id = id, "Deleted user");
        }
        Ok(())
    }

    async fn find_all(&self) -> DatabaseResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn ping(&self) -> DatabaseResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_digest: "digest".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = InMemoryUserStore::new();

        let created = store.create(new_user("Ann", "ann@x.com")).await.unwrap();
        assert_eq!(created.id, 1);

        let by_id = store.find_one(UserLookup::Id(created.id)).await.unwrap();
        assert_eq!(by_id, created);

        let by_email = store
            .find_one(UserLookup::Email("ann@x.com".into()))
            .await
            .unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@x.com")).await.unwrap();

        let result = store.find_one(UserLookup::Email("ANN@X.COM".into())).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@x.com")).await.unwrap();

        let result = store.create(new_user("Ann2", "ann@x.com")).await;
        assert!(matches!(result, Err(DatabaseError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryUserStore::new();
        let first = store.create(new_user("Ann", "ann@x.com")).await.unwrap();
        store.delete_by_id(first.id).await.unwrap();

        let second = store.create(new_user("Bob", "bob@x.com")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_ok() {
        let store = InMemoryUserStore::new();
        assert!(store.delete_by_id(42).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_rejects_email_of_other_user() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@x.com")).await.unwrap();
        let mut bob = store.create(new_user("Bob", "bob@x.com")).await.unwrap();

        bob.email = "ann@x.com".to_string();
        let result = store.save(bob).await;
        assert!(matches!(result, Err(DatabaseError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_save_missing_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let mut ghost = store.create(new_user("Ann", "ann@x.com")).await.unwrap();
        ghost.id = 99;

        let result = store.save(ghost).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_save_never_moves_updated_at_backwards() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("Ann", "ann@x.com")).await.unwrap();

        let mut changed = created.clone();
        changed.name = "Anna".to_string();
        let saved = store.save(changed).await.unwrap();

        assert_eq!(saved.name, "Anna");
        assert!(saved.updated_at >= created.updated_at);
        assert_eq!(saved.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_find_all_in_insertion_order() {
        let store = InMemoryUserStore::new();
        store.create(new_user("Ann", "ann@x.com")).await.unwrap();
        store.create(new_user("Bob", "bob@x.com")).await.unwrap();
        store.create(new_user("Cid", "cid@x.com")).await.unwrap();

        let names: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, ["Ann", "Bob", "Cid"]);
    }
}
