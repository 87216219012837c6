//! HTTP reverse-proxy gateway.
//!
//! A thin REST translation of the RPC surface: every route maps onto one
//! RPC method over a shared client channel dialing the in-process RPC
//! listener. Errors come back as gRPC statuses and are mapped onto their
//! HTTP equivalents here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tonic::transport::Channel;
use tonic::{Code, Status};
use tower_http::trace::TraceLayer;

use crate::proto::user_service_client::UserServiceClient;

/// JSON bodies for the REST surface.
pub mod dto;

/// Route handlers.
pub mod handlers;

/// Shared gateway state: the client channel to the RPC listener.
#[derive(Clone)]
pub struct GatewayState {
    /// Client over the lazily-connected channel to the RPC listener.
    pub client: UserServiceClient<Channel>,
}

/// Builds the gateway router over a channel dialing the RPC listener.
pub fn router(channel: Channel) -> Router {
    let state = GatewayState {
        client: UserServiceClient::new(channel),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/v1/users",
            post(handlers::register_user).get(handlers::list_users),
        )
        .route("/v1/users/authenticate", post(handlers::authenticate_user))
        .route("/v1/users/refresh", post(handlers::refresh_user_token))
        .route("/v1/users/validate", post(handlers::validate_user_token))
        .route(
            "/v1/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::remove_user),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A gRPC status on its way back out as an HTTP response.
#[derive(Debug)]
pub struct GatewayError(Status);

impl From<Status> for GatewayError {
    fn from(status: Status) -> Self {
        Self(status)
    }
}

/// Error response JSON.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self.0.code() {
            Code::Unauthenticated => StatusCode::UNAUTHORIZED,
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            Code::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            error: self.0.message().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
