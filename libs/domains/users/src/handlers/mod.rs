//! Network adapters over [`crate::UserService`].
//!
//! - [`http`]: axum router; everything under `/users` requires a bearer token
//! - [`grpc`]: tonic `users.v1.UserService`; no token gate

pub mod grpc;
pub mod http;
mod proto_conversions;

pub use grpc::UserGrpcService;
pub use http::router;
