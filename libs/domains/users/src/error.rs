use axum_helpers::AppError;
use database::DatabaseError;
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::UserId;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("User with email '{0}' not found")]
    EmailNotFound(String),

    #[error("User with email '{0}' already exists")]
    AlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<ValidationErrors> for UserError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid"),
                })
            })
            .collect();
        messages.sort();
        UserError::Validation(messages.join("; "))
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::EmailNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            UserError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            UserError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::PasswordHash(_) | UserError::Token(_) | UserError::Database(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl From<UserError> for tonic::Status {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::EmailNotFound(_) => {
                tonic::Status::not_found(err.to_string())
            }
            UserError::AlreadyExists(_) => tonic::Status::already_exists(err.to_string()),
            UserError::InvalidCredentials => {
                tonic::Status::unauthenticated("Invalid email or password")
            }
            UserError::Validation(msg) => tonic::Status::invalid_argument(msg),
            UserError::PasswordHash(_) | UserError::Token(_) | UserError::Database(_) => {
                tracing::error!(error = %err, "Internal error");
                tonic::Status::internal("An internal error occurred")
            }
        }
    }
}
