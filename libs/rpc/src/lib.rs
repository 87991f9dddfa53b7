//! Generated gRPC bindings.
//!
//! Sources live in `proto/`; the generated code is checked in under
//! `src/generated` so building does not require `protoc`.

pub mod users {
    include!("generated/users/v1/users.v1.rs");
    include!("generated/users/v1/users.v1.tonic.rs");
}
