use observability::GrpcMetrics;
use rpc::users::{
    CreateUserRequest, DeleteUserRequest, DeleteUserResponse, GetUserRequest, ListUsersRequest,
    ListUsersResponse, UpdateUserRequest, UserResponse, user_service_server,
};
use std::future::Future;
use std::time::Instant;
use tonic::{Request, Response, Status};

use super::proto_conversions::{update_request_to_domain, user_to_proto};
use crate::error::UserResult;
use crate::models::CreateUser;
use crate::repository::UserStore;
use crate::service::UserService;

/// gRPC adapter for `users.v1.UserService`.
///
/// Unlike the HTTP router this adapter performs no bearer-token check:
/// every method, including the mutating ones, is callable without
/// credentials. Deploy it on a trusted network only.
pub struct UserGrpcService<S> {
    service: UserService<S>,
}

impl<S: UserStore + 'static> UserGrpcService<S> {
    pub fn new(service: UserService<S>) -> Self {
        Self { service }
    }

    /// Wrap into the tonic server type
    pub fn into_server(self) -> user_service_server::UserServiceServer<Self> {
        user_service_server::UserServiceServer::new(self)
    }
}

/// Run one call, map domain errors to `Status` and record per-method metrics
async fn observe<T>(
    method: &'static str,
    call: impl Future<Output = UserResult<T>>,
) -> Result<Response<T>, Status> {
    let started = Instant::now();
    let result = call.await.map_err(Status::from);

    let code = match &result {
        Ok(_) => tonic::Code::Ok,
        Err(status) => status.code(),
    };
    GrpcMetrics::record_request(method, code_name(code), started.elapsed());

    result.map(Response::new)
}

/// Upper-snake gRPC status name used as the `code` metrics label
fn code_name(code: tonic::Code) -> &'static str {
    use tonic::Code;
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "CANCELLED",
        Code::Unknown => "UNKNOWN",
        Code::InvalidArgument => "INVALID_ARGUMENT",
        Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
        Code::NotFound => "NOT_FOUND",
        Code::AlreadyExists => "ALREADY_EXISTS",
        Code::PermissionDenied => "PERMISSION_DENIED",
        Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
        Code::FailedPrecondition => "FAILED_PRECONDITION",
        Code::Aborted => "ABORTED",
        Code::OutOfRange => "OUT_OF_RANGE",
        Code::Unimplemented => "UNIMPLEMENTED",
        Code::Internal => "INTERNAL",
        Code::Unavailable => "UNAVAILABLE",
        Code::DataLoss => "DATA_LOSS",
        Code::Unauthenticated => "UNAUTHENTICATED",
    }
}

#[tonic::async_trait]
impl<S: UserStore + 'static> user_service_server::UserService for UserGrpcService<S> {
    #[tracing::instrument(skip_all)]
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let req = request.into_inner();
        let input = CreateUser {
            name: req.name,
            email: req.email,
            password: req.password,
        };

        observe("CreateUser", async {
            let user = self.service.create_user(input).await?;
            Ok(UserResponse {
                user: Some(user_to_proto(user)),
                message: "User created successfully".to_string(),
            })
        })
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let id = request.into_inner().id;

        observe("GetUser", async {
            let user = self.service.get_user(id).await?;
            Ok(UserResponse {
                user: Some(user_to_proto(user)),
                message: String::new(),
            })
        })
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let req = request.into_inner();
        let changes = update_request_to_domain(&req);

        observe("UpdateUser", async {
            let user = self.service.update_user(req.id, changes).await?;
            Ok(UserResponse {
                user: Some(user_to_proto(user)),
                message: "User updated successfully".to_string(),
            })
        })
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn delete_user(
        &self,
        request: Request<DeleteUserRequest>,
    ) -> Result<Response<DeleteUserResponse>, Status> {
        let id = request.into_inner().id;

        observe("DeleteUser", async {
            self.service.delete_user(id).await?;
            Ok(DeleteUserResponse {
                message: "User deleted successfully".to_string(),
            })
        })
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn list_users(
        &self,
        _request: Request<ListUsersRequest>,
    ) -> Result<Response<ListUsersResponse>, Status> {
        observe("ListUsers", async {
            let users = self.service.list_users().await?;
            Ok(ListUsersResponse {
                users: users.into_iter().map(user_to_proto).collect(),
            })
        })
        .await
    }
}
