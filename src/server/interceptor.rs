//! Interceptors wrapped around every inbound RPC.
//!
//! Two tower layers compose around the service routes, logging first:
//! [`LoggingLayer`] records every call unconditionally (including ones the
//! security stage rejects), then [`AuthLayer`] demands a verified bearer
//! token for the protected subset of methods and propagates the
//! authenticated subject to the handler through request metadata.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Request, Response};
use tonic::body::BoxBody;
use tonic::Status;
use tower::{Layer, Service};

use crate::auth::AccessVerifier;

/// Metadata key carrying the verified subject id to downstream handlers.
pub const USER_ID_HEADER: &str = "user_id";

const BEARER_SCHEME: &str = "Bearer";
const GRPC_STATUS_HEADER: &str = "grpc-status";
const GRPC_MESSAGE_HEADER: &str = "grpc-message";

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The fully-qualified method paths that require a verified access token.
///
/// Exact matches only. Registration, login, and token exchange stay off this
/// list so unauthenticated callers can reach them.
pub fn protected_methods() -> HashSet<&'static str> {
    [
        "/usergate.v1.UserService/UpdateUser",
        "/usergate.v1.UserService/GetUser",
        "/usergate.v1.UserService/ListUsers",
        "/usergate.v1.UserService/RemoveUser",
    ]
    .into_iter()
    .collect()
}

/// Layer that logs every inbound call before anything else runs.
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware { inner }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Clone, Debug)]
pub struct LoggingMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<BoxBody>> for LoggingMiddleware<S>
where
    S: Service<Request<BoxBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<BoxBody>) -> Self::Future {
        tracing::info!(
            method = %request.uri().path(),
            version = ?request.version(),
            metadata = ?request.headers(),
            "rpc received"
        );
        self.inner.call(request)
    }
}

/// Layer that gates the protected method subset behind access-token
/// verification.
#[derive(Clone)]
pub struct AuthLayer {
    verifier: Arc<dyn AccessVerifier>,
    protected: Arc<HashSet<&'static str>>,
}

impl AuthLayer {
    /// Creates the layer from a verifier and the protected method set.
    pub fn new(verifier: Arc<dyn AccessVerifier>, protected: HashSet<&'static str>) -> Self {
        Self {
            verifier,
            protected: Arc::new(protected),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            verifier: Arc::clone(&self.verifier),
            protected: Arc::clone(&self.protected),
        }
    }
}

/// Service produced by [`AuthLayer`].
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    verifier: Arc<dyn AccessVerifier>,
    protected: Arc<HashSet<&'static str>>,
}

impl<S> AuthMiddleware<S> {
    /// Checks the `authorization` metadata and returns the verified subject
    /// id as a header value ready for propagation.
    fn authorize(&self, headers: &HeaderMap) -> Result<HeaderValue, Status> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| Status::unauthenticated("missing authorization metadata"))?;

        let header = header
            .to_str()
            .map_err(|_| Status::unauthenticated("malformed authorization metadata"))?;

        let token = parse_bearer(header)?;

        let subject = self.verifier.verify_access(token).map_err(|err| {
            // The caller learns nothing about why verification failed.
            tracing::debug!(error = %err, "access token rejected");
            Status::unauthenticated("invalid auth token")
        })?;

        Ok(HeaderValue::from(subject))
    }
}

impl<S> Service<Request<BoxBody>> for AuthMiddleware<S>
where
    S: Service<Request<BoxBody>, Response = Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<BoxBody>) -> Self::Future {
        // Take the ready inner service and leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        if !self.protected.contains(request.uri().path()) {
            return Box::pin(inner.call(request));
        }

        match self.authorize(request.headers()) {
            Ok(subject) => {
                request.headers_mut().insert(USER_ID_HEADER, subject);
                Box::pin(inner.call(request))
            }
            Err(status) => Box::pin(std::future::ready(Ok(deny(status)))),
        }
    }
}

/// Builds a trailers-only gRPC response: the status travels in the headers
/// frame and no message body follows.
fn deny(status: Status) -> Response<BoxBody> {
    let mut response = Response::new(tonic::codegen::empty_body());
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
    response
        .headers_mut()
        .insert(GRPC_STATUS_HEADER, HeaderValue::from(status.code() as i32));
    if let Ok(message) = HeaderValue::from_str(status.message()) {
        response.headers_mut().insert(GRPC_MESSAGE_HEADER, message);
    }
    response
}

fn parse_bearer(header: &str) -> Result<&str, Status> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme == BEARER_SCHEME && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(Status::unauthenticated("invalid authorization header")),
    }
}
