//! Error taxonomy and retry engine shared by every store implementation

pub mod classify;
pub mod error;
pub mod retry;

pub use classify::{Classification, DatabaseErrorClassifier, ErrorCategory, ErrorClassifier};
pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryError, RetryExecutor, RetryPolicy};
