//! gRPC service implementation for user management.

use std::sync::Arc;

use metrics::counter;
use tonic::{Request, Response, Status};

use super::interceptor::USER_ID_HEADER;
use crate::proto::user_service_server::UserService;
use crate::proto::{
    AuthenticateUserRequest, AuthenticateUserResponse, GetUserRequest, ListUsersRequest,
    ListUsersResponse, RefreshUserTokenRequest, RefreshUserTokenResponse, RemoveUserRequest,
    RemoveUserResponse, UpdateUserResponse, User, UserView, ValidateUserTokenRequest,
    ValidateUserTokenResponse,
};
use crate::usecase::UserUsecase;
use crate::user;

/// gRPC service handlers delegating to the domain layer.
///
/// Handlers never verify credentials themselves; for protected methods the
/// authorization interceptor has already checked the token and attached the
/// caller's subject id to the request metadata.
pub struct UserServiceImpl {
    usecase: Arc<UserUsecase>,
}

impl UserServiceImpl {
    /// Creates the service over a shared domain layer.
    pub fn new(usecase: Arc<UserUsecase>) -> Self {
        Self { usecase }
    }
}

#[tonic::async_trait]
impl UserService for UserServiceImpl {
    async fn register_user(&self, request: Request<User>) -> Result<Response<UserView>, Status> {
        counter!("usergate.rpc.register_user.requests").increment(1);

        let registered = self
            .usecase
            .register(domain_user(request.into_inner()))
            .await?;

        Ok(Response::new(user_view(registered)))
    }

    async fn authenticate_user(
        &self,
        request: Request<AuthenticateUserRequest>,
    ) -> Result<Response<AuthenticateUserResponse>, Status> {
        counter!("usergate.rpc.authenticate_user.requests").increment(1);

        let req = request.into_inner();
        let (token, refresh_token) = self
            .usecase
            .authenticate(user::User {
                name: req.name,
                email: req.email,
                password: req.password,
                ..user::User::default()
            })
            .await?;

        Ok(Response::new(AuthenticateUserResponse {
            token,
            refresh_token,
        }))
    }

    async fn refresh_user_token(
        &self,
        request: Request<RefreshUserTokenRequest>,
    ) -> Result<Response<RefreshUserTokenResponse>, Status> {
        counter!("usergate.rpc.refresh_user_token.requests").increment(1);

        let access_token = self
            .usecase
            .refresh_token(&request.into_inner().refresh_token)
            .await?;

        Ok(Response::new(RefreshUserTokenResponse { access_token }))
    }

    async fn validate_user_token(
        &self,
        request: Request<ValidateUserTokenRequest>,
    ) -> Result<Response<ValidateUserTokenResponse>, Status> {
        counter!("usergate.rpc.validate_user_token.requests").increment(1);

        let user_id = self
            .usecase
            .validate_token(&request.into_inner().token)
            .await?;

        Ok(Response::new(ValidateUserTokenResponse { user_id }))
    }

    async fn update_user(
        &self,
        request: Request<User>,
    ) -> Result<Response<UpdateUserResponse>, Status> {
        counter!("usergate.rpc.update_user.requests").increment(1);

        if let Some(subject) = authenticated_subject(&request) {
            tracing::debug!(user_id = %subject, "update requested");
        }

        let updated_count = self
            .usecase
            .update(domain_user(request.into_inner()))
            .await?;

        Ok(Response::new(UpdateUserResponse { updated_count }))
    }

    async fn remove_user(
        &self,
        request: Request<RemoveUserRequest>,
    ) -> Result<Response<RemoveUserResponse>, Status> {
        counter!("usergate.rpc.remove_user.requests").increment(1);

        if let Some(subject) = authenticated_subject(&request) {
            tracing::debug!(user_id = %subject, "removal requested");
        }

        let removed_count = self
            .usecase
            .remove(request.into_inner().user_id)
            .await?;

        Ok(Response::new(RemoveUserResponse { removed_count }))
    }

    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<UserView>, Status> {
        counter!("usergate.rpc.get_user.requests").increment(1);

        if let Some(subject) = authenticated_subject(&request) {
            tracing::debug!(user_id = %subject, "lookup requested");
        }

        let found = self
            .usecase
            .get(user::User {
                id: request.into_inner().user_id,
                ..user::User::default()
            })
            .await?;

        Ok(Response::new(user_view(found)))
    }

    async fn list_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<Response<ListUsersResponse>, Status> {
        counter!("usergate.rpc.list_users.requests").increment(1);

        if let Some(subject) = authenticated_subject(&request) {
            tracing::debug!(user_id = %subject, "listing requested");
        }

        let users = self.usecase.list().await?;

        Ok(Response::new(ListUsersResponse {
            users: users.into_iter().map(user_view).collect(),
        }))
    }
}

/// Reads the subject id the authorization interceptor attached to the call.
fn authenticated_subject<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn domain_user(user: User) -> user::User {
    user::User {
        id: user.id,
        name: user.name,
        email: user.email,
        password: user.password,
    }
}

fn user_view(user: user::User) -> UserView {
    UserView {
        id: user.id,
        name: user.name,
        email: user.email,
    }
}
