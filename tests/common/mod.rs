//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use usergate::app::Application;
use usergate::config::{AppConfig, Environment, Secrets};
use usergate::repository::{MemoryUserRepository, UserRepository};

/// A running service instance bound to ephemeral ports.
pub struct TestServer {
    /// Address of the RPC listener.
    pub rpc_addr: SocketAddr,
    /// Address of the gateway listener.
    pub rest_addr: SocketAddr,
    /// Triggers graceful shutdown when sent (or dropped).
    pub shutdown: oneshot::Sender<()>,
    /// Resolves with the serve result once shutdown completes.
    pub handle: JoinHandle<usergate::Result<()>>,
}

impl TestServer {
    /// Base URL of the RPC listener for tonic clients.
    pub fn rpc_url(&self) -> String {
        format!("http://{}", self.rpc_addr)
    }

    /// Base URL of the gateway listener for HTTP clients.
    pub fn rest_url(&self) -> String {
        format!("http://{}", self.rest_addr)
    }
}

/// Configuration binding both listeners to ephemeral ports.
pub fn test_config() -> AppConfig {
    AppConfig {
        environment: Environment::Test,
        rpc_port: 0,
        rest_port: 0,
        ..AppConfig::default()
    }
}

/// Fixed signing secrets for tests.
pub fn test_secrets() -> Secrets {
    Secrets::new("integration-access-secret", "integration-refresh-secret")
}

/// Starts the service over the given repository.
pub async fn start_server_with(repo: Arc<dyn UserRepository>) -> TestServer {
    let app = Application::bind(&test_config(), test_secrets(), repo)
        .await
        .expect("Failed to bind test listeners");

    let rpc_addr = app.rpc_addr();
    let rest_addr = app.rest_addr();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let handle = tokio::spawn(app.serve(async move {
        let _ = shutdown_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        rpc_addr,
        rest_addr,
        shutdown: shutdown_tx,
        handle,
    }
}

/// Starts the service over an empty in-memory registry.
pub async fn start_server() -> TestServer {
    start_server_with(Arc::new(MemoryUserRepository::new())).await
}
