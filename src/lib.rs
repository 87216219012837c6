//! usergate: a user-management service gated by short-lived bearer tokens.
//!
//! The service exposes the same operations over two coordinated listeners: a
//! native gRPC transport and an HTTP gateway translating REST+JSON calls
//! onto it. Password hashes and two independently-keyed token kinds (access
//! and refresh) make up the credential lifecycle; a per-call interceptor
//! gates the sensitive subset of operations behind access-token
//! verification.

/// Server lifecycle: startup, coordinated serving, bounded shutdown.
pub mod app;

/// Credential primitives: password hashing and signed bearer tokens.
pub mod auth;

/// Process configuration and startup secrets.
pub mod config;

/// Error types.
pub mod error;

/// HTTP reverse-proxy gateway.
pub mod gateway;

/// User persistence.
pub mod repository;

/// RPC delivery: service handlers and interceptors.
pub mod server;

/// Domain operations over user accounts.
pub mod usecase;

/// The user account record.
pub mod user;

/// Generated protobuf and gRPC types.
pub mod proto {
    tonic::include_proto!("usergate.v1");

    /// Compiled file descriptor set, served over gRPC reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("usergate_descriptor");
}

pub use error::{Error, Result};
