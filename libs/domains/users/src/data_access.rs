//! Retry-governed access to the user store.
//!
//! Every operation is one [`UserStore`] call run through a [`RetryExecutor`]:
//! uniqueness and not-found failures surface on the first attempt, anything
//! else is retried with exponential backoff up to the policy limit.

use database::{DatabaseError, DatabaseResult, RetryExecutor, RetryPolicy};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::models::{NewUser, User, UserId};
use crate::repository::{UserLookup, UserStore};

pub struct UserDataAccess<S> {
    store: Arc<S>,
    executor: RetryExecutor,
    policy: RetryPolicy,
}

impl<S> Clone for UserDataAccess<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            executor: self.executor.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<S: UserStore> UserDataAccess<S> {
    pub fn new(store: S, executor: RetryExecutor, policy: RetryPolicy) -> Self {
        Self {
            store: Arc::new(store),
            executor,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, operation_fn: F) -> DatabaseResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DatabaseResult<T>>,
    {
        let started = Instant::now();
        let result = self
            .executor
            .execute(operation, &self.policy, operation_fn)
            .await;
        self.executor
            .sink()
            .record_latency(operation, started.elapsed());

        result.map_err(DatabaseError::from)
    }

    /// Insert a new user.
    ///
    /// At-least-once under retry: if a transient failure is observed after
    /// the row committed, the retried insert reports `UniqueViolation`.
    pub async fn create(&self, user: NewUser) -> DatabaseResult<User> {
        let store = &self.store;
        self.run("create_user", move || store.create(user.clone()))
            .await
    }

    pub async fn find_by_id(&self, id: UserId) -> DatabaseResult<User> {
        let store = &self.store;
        self.run("find_user_by_id", move || store.find_one(UserLookup::Id(id)))
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<User> {
        let store = &self.store;
        self.run("find_user_by_email", move || {
            store.find_one(UserLookup::Email(email.to_string()))
        })
        .await
    }

    pub async fn update(&self, user: User) -> DatabaseResult<User> {
        let store = &self.store;
        self.run("update_user", move || store.save(user.clone()))
            .await
    }

    pub async fn delete(&self, id: UserId) -> DatabaseResult<()> {
        let store = &self.store;
        self.run("delete_user", move || store.delete_by_id(id))
            .await
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        let store = &self.store;
        self.run("get_all_users", move || store.find_all()).await
    }

    /// Single-attempt reachability probe; the outcome is reported to the
    /// metrics sink as the `database` component
    pub async fn ping(&self) -> DatabaseResult<()> {
        let result = self.store.ping().await;
        self.executor
            .sink()
            .record_health_status("database", result.is_ok());
        result
    }
}
