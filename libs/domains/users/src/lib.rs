//! Users Domain
//!
//! User management behind two network surfaces that share one service.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │ handlers::http │ grpc    │  ← axum router (JWT-gated) / tonic service
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │        UserService       │  ← validation, password digests, domain errors
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │      UserDataAccess      │  ← every call runs through RetryExecutor
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │   UserStore (trait)      │  ← in-memory / PostgreSQL
//! └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{
//!     handlers, Argon2Hasher, InMemoryUserStore, UserDataAccess, UserService,
//! };
//! use database::{RetryExecutor, RetryPolicy};
//!
//! let data = UserDataAccess::new(InMemoryUserStore::new(), RetryExecutor::default(), RetryPolicy::default());
//! let service = UserService::new(data, Arc::new(Argon2Hasher::default()));
//!
//! let router = handlers::router(service.clone(), jwt_auth);
//! let grpc = handlers::UserGrpcService::new(service).into_server();
//! ```

pub mod data_access;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use data_access::UserDataAccess;
pub use error::{UserError, UserResult};
pub use models::{CreateUser, LoginRequest, UpdateUser, User, UserId, UserResponse};
pub use password::{Argon2Hasher, HashingConfig, PasswordHashing};
pub use postgres::PostgresUserStore;
pub use repository::{InMemoryUserStore, UserLookup, UserStore};
pub use service::UserService;
