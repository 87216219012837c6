//! The native RPC delivery layer: service handlers and call interceptors.

/// Call interceptors: logging and bearer-token authorization.
pub mod interceptor;

/// gRPC service implementation.
pub mod service;

pub use interceptor::{protected_methods, AuthLayer, LoggingLayer, USER_ID_HEADER};
pub use service::UserServiceImpl;
