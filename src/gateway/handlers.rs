//! REST handlers translating HTTP+JSON calls into RPC calls.
//!
//! The gateway takes no authorization decisions of its own: the inbound
//! `Authorization` header is forwarded verbatim as RPC metadata and the
//! authorization interceptor on the RPC side accepts or rejects the call.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use tonic::metadata::MetadataValue;
use tonic::Status;

use super::dto::{
    AccessTokenBody, AuthenticateUserBody, RefreshUserTokenBody, RegisterUserBody, RemovedBody,
    SubjectBody, TokenPairBody, UpdateUserBody, UpdatedBody, UserListBody, UserViewBody,
    ValidateUserTokenBody,
};
use super::{GatewayError, GatewayState};
use crate::proto;

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// `POST /v1/users`
pub async fn register_user(
    State(state): State<GatewayState>,
    Json(body): Json<RegisterUserBody>,
) -> Result<Json<UserViewBody>, GatewayError> {
    let response = state
        .client
        .clone()
        .register_user(proto::User {
            id: 0,
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok(Json(response.into_inner().into()))
}

/// `POST /v1/users/authenticate`
pub async fn authenticate_user(
    State(state): State<GatewayState>,
    Json(body): Json<AuthenticateUserBody>,
) -> Result<Json<TokenPairBody>, GatewayError> {
    let response = state
        .client
        .clone()
        .authenticate_user(proto::AuthenticateUserRequest {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?
        .into_inner();

    Ok(Json(TokenPairBody {
        token: response.token,
        refresh_token: response.refresh_token,
    }))
}

/// `POST /v1/users/refresh`
pub async fn refresh_user_token(
    State(state): State<GatewayState>,
    Json(body): Json<RefreshUserTokenBody>,
) -> Result<Json<AccessTokenBody>, GatewayError> {
    let response = state
        .client
        .clone()
        .refresh_user_token(proto::RefreshUserTokenRequest {
            refresh_token: body.refresh_token,
        })
        .await?;

    Ok(Json(AccessTokenBody {
        access_token: response.into_inner().access_token,
    }))
}

/// `POST /v1/users/validate`
pub async fn validate_user_token(
    State(state): State<GatewayState>,
    Json(body): Json<ValidateUserTokenBody>,
) -> Result<Json<SubjectBody>, GatewayError> {
    let response = state
        .client
        .clone()
        .validate_user_token(proto::ValidateUserTokenRequest { token: body.token })
        .await?;

    Ok(Json(SubjectBody {
        user_id: response.into_inner().user_id,
    }))
}

/// `GET /v1/users/{id}`
pub async fn get_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<UserViewBody>, GatewayError> {
    let mut request = tonic::Request::new(proto::GetUserRequest { user_id: id });
    forward_authorization(&headers, &mut request)?;

    let response = state.client.clone().get_user(request).await?;
    Ok(Json(response.into_inner().into()))
}

/// `GET /v1/users`
pub async fn list_users(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<Json<UserListBody>, GatewayError> {
    let mut request = tonic::Request::new(proto::ListUsersRequest {});
    forward_authorization(&headers, &mut request)?;

    let response = state.client.clone().list_users(request).await?;
    Ok(Json(UserListBody {
        users: response
            .into_inner()
            .users
            .into_iter()
            .map(UserViewBody::from)
            .collect(),
    }))
}

/// `PUT /v1/users/{id}`
pub async fn update_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<UpdatedBody>, GatewayError> {
    let mut request = tonic::Request::new(proto::User {
        id,
        name: body.name,
        email: body.email,
        password: body.password,
    });
    forward_authorization(&headers, &mut request)?;

    let response = state.client.clone().update_user(request).await?;
    Ok(Json(UpdatedBody {
        updated_count: response.into_inner().updated_count,
    }))
}

/// `DELETE /v1/users/{id}`
pub async fn remove_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<RemovedBody>, GatewayError> {
    let mut request = tonic::Request::new(proto::RemoveUserRequest { user_id: id });
    forward_authorization(&headers, &mut request)?;

    let response = state.client.clone().remove_user(request).await?;
    Ok(Json(RemovedBody {
        removed_count: response.into_inner().removed_count,
    }))
}

/// Copies the inbound `Authorization` header into the RPC metadata. A
/// missing header is not an error here; the interceptor decides whether the
/// target method requires one.
fn forward_authorization<T>(
    headers: &HeaderMap,
    request: &mut tonic::Request<T>,
) -> Result<(), GatewayError> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| Status::unauthenticated("malformed authorization header"))?;
        let value: MetadataValue<_> = value
            .parse()
            .map_err(|_| Status::unauthenticated("malformed authorization header"))?;
        request.metadata_mut().insert("authorization", value);
    }
    Ok(())
}
