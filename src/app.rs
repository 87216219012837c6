//! Server lifecycle: coordinated startup and bounded graceful shutdown of
//! the RPC listener and the HTTP gateway.
//!
//! The two listeners run as independent tasks sharing the authenticator and
//! the domain service. A serve-loop failure while running is fatal: there is
//! no in-process supervisor, restarts belong to the external process
//! manager. On interruption both graceful stops are driven concurrently
//! under one shared deadline; whatever has not drained by then is abandoned.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinError;
use tokio::{signal, time};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Channel, Server};
use tower::ServiceBuilder;
use tracing::{info, warn};

use crate::auth::{Authenticator, TokenConfig};
use crate::config::{AppConfig, Secrets};
use crate::error::{Error, Result};
use crate::gateway;
use crate::proto;
use crate::proto::user_service_server::UserServiceServer;
use crate::repository::{PgUserRepository, UserRepository};
use crate::server::{protected_methods, AuthLayer, LoggingLayer, UserServiceImpl};
use crate::usecase::UserUsecase;

/// Shared deadline for draining both listeners once shutdown begins.
pub const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// The service with both listeners bound but not yet serving.
///
/// Splitting bind from serve keeps bind failures fatal at startup and lets
/// tests bind to port 0 and read back the assigned addresses.
pub struct Application {
    rpc_listener: TcpListener,
    rest_listener: TcpListener,
    rpc_addr: SocketAddr,
    rest_addr: SocketAddr,
    authenticator: Authenticator,
    usecase: Arc<UserUsecase>,
}

impl Application {
    /// Constructs the authenticator and domain service and binds both
    /// listeners.
    ///
    /// # Errors
    /// Returns [`Error::Bind`] if either listener cannot be bound; callers
    /// treat that as fatal.
    pub async fn bind(
        config: &AppConfig,
        secrets: Secrets,
        repo: Arc<dyn UserRepository>,
    ) -> Result<Self> {
        let authenticator = Authenticator::new(TokenConfig {
            access_secret: secrets.access_token_secret,
            refresh_secret: secrets.refresh_token_secret,
            access_ttl: config.access_token_ttl(),
            refresh_ttl: config.refresh_token_ttl(),
        });
        let usecase = Arc::new(UserUsecase::new(repo, authenticator.clone()));

        let rpc_listener = TcpListener::bind(config.rpc_addr())
            .await
            .map_err(|source| Error::Bind {
                listener: "rpc",
                source,
            })?;
        let rpc_addr = rpc_listener.local_addr().map_err(|source| Error::Bind {
            listener: "rpc",
            source,
        })?;

        let rest_listener =
            TcpListener::bind(config.rest_addr())
                .await
                .map_err(|source| Error::Bind {
                    listener: "gateway",
                    source,
                })?;
        let rest_addr = rest_listener.local_addr().map_err(|source| Error::Bind {
            listener: "gateway",
            source,
        })?;

        Ok(Self {
            rpc_listener,
            rest_listener,
            rpc_addr,
            rest_addr,
            authenticator,
            usecase,
        })
    }

    /// Address the RPC listener is bound to.
    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    /// Address the gateway listener is bound to.
    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    /// Serves both listeners until the shutdown future resolves, then
    /// drives both graceful stops under the shared deadline.
    ///
    /// # Errors
    /// Returns an error if either serve loop fails while running, if the
    /// gateway reports a shutdown error, or if the deadline elapses before
    /// both listeners drain.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let Application {
            rpc_listener,
            rest_listener,
            rpc_addr,
            rest_addr,
            authenticator,
            usecase,
        } = self;

        let (rpc_shutdown_tx, rpc_shutdown_rx) = oneshot::channel::<()>();
        let (gateway_shutdown_tx, gateway_shutdown_rx) = oneshot::channel::<()>();

        let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<UserServiceServer<UserServiceImpl>>()
            .await;

        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
            .build_v1()?;

        let layers = ServiceBuilder::new()
            .layer(LoggingLayer)
            .layer(AuthLayer::new(
                Arc::new(authenticator),
                protected_methods(),
            ))
            .into_inner();

        let rpc_server = Server::builder()
            .layer(layers)
            .add_service(health_service)
            .add_service(reflection_service)
            .add_service(UserServiceServer::new(UserServiceImpl::new(Arc::clone(
                &usecase,
            ))))
            .serve_with_incoming_shutdown(TcpListenerStream::new(rpc_listener), async {
                let _ = rpc_shutdown_rx.await;
            });
        let mut rpc_task =
            tokio::spawn(async move { rpc_server.await.map_err(Error::RpcTransport) });
        info!(addr = %rpc_addr, "rpc listener serving");

        // The gateway dials the RPC listener it was started alongside.
        let channel = Channel::from_shared(format!("http://{rpc_addr}"))?.connect_lazy();
        let gateway_server = axum::serve(rest_listener, gateway::router(channel))
            .with_graceful_shutdown(async {
                let _ = gateway_shutdown_rx.await;
            });
        let mut gateway_task =
            tokio::spawn(async move { gateway_server.await.map_err(Error::GatewayServe) });
        info!(addr = %rest_addr, "gateway listener serving");

        tokio::select! {
            () = shutdown => {
                info!("shutting down gracefully (interrupt again to force)");
            }
            result = &mut rpc_task => {
                return Err(listener_exit(result, "rpc"));
            }
            result = &mut gateway_task => {
                return Err(listener_exit(result, "gateway"));
            }
        }

        // A second interrupt skips the graceful drain entirely.
        tokio::spawn(async {
            if signal::ctrl_c().await.is_ok() {
                warn!("second interrupt received, terminating immediately");
                std::process::exit(130);
            }
        });

        health_reporter
            .set_not_serving::<UserServiceServer<UserServiceImpl>>()
            .await;

        let _ = rpc_shutdown_tx.send(());
        let _ = gateway_shutdown_tx.send(());

        let drain = async {
            let rpc_result = (&mut rpc_task).await;
            let gateway_result = (&mut gateway_task).await;
            (rpc_result, gateway_result)
        };
        let drained = time::timeout(SHUTDOWN_DEADLINE, drain).await;

        match drained {
            Ok((rpc_result, gateway_result)) => {
                // The rpc graceful stop has no error path of its own and is
                // awaited unconditionally; a gateway shutdown error is fatal.
                task_result(rpc_result, "rpc")?;
                task_result(gateway_result, "gateway")?;
                info!("shutdown complete");
                Ok(())
            }
            Err(_) => {
                warn!(
                    deadline = ?SHUTDOWN_DEADLINE,
                    "shutdown deadline elapsed, abandoning in-flight calls"
                );
                rpc_task.abort();
                gateway_task.abort();
                Err(Error::ShutdownDeadline)
            }
        }
    }
}

/// Production entry point: connects the database, binds both listeners, and
/// serves until the process is interrupted.
///
/// # Errors
/// Returns an error on missing secrets, database connection failure, bind
/// failure, serve-loop failure, or a breached shutdown deadline. All of them
/// terminate the process.
pub async fn run(config: AppConfig) -> Result<()> {
    let secrets = Secrets::from_env()?;

    if config.database_url.is_empty() {
        return Err(Error::Config("database_url must be configured".to_string()));
    }

    let pool = PgPool::connect(&config.database_url).await?;
    info!("database connection established");
    let repo: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool));

    let app = Application::bind(&config, secrets, repo).await?;
    app.serve(shutdown_signal()).await
}

/// Resolves when the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received interrupt signal");
        },
        _ = terminate => {
            info!("received terminate signal");
        },
    }
}

fn task_result(
    result: std::result::Result<Result<()>, JoinError>,
    listener: &'static str,
) -> Result<()> {
    match result {
        Ok(result) => result,
        Err(err) => Err(Error::Fatal(format!(
            "{listener} listener task failed: {err}"
        ))),
    }
}

fn listener_exit(
    result: std::result::Result<Result<()>, JoinError>,
    listener: &'static str,
) -> Error {
    match task_result(result, listener) {
        Ok(()) => Error::Fatal(format!("{listener} listener stopped unexpectedly")),
        Err(err) => err,
    }
}
