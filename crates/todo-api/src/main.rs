//! todo-api バイナリのエントリポイント
//! 設定を読み込み、選択されたストアで HTTP サーバを起動します。

use std::sync::Arc;

use anyhow::Context;
use infrastructure::{DynamoDbClient, DynamoDbTodoRepository, InMemoryTodoRepository, TodoRepository};
use shared::{init_tracing, Config, StorageBackend};
use todo_api::{app, AppState};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env があれば読み込む（無くてもよい）
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.environment).map_err(|e| anyhow::anyhow!(e))?;

    let repository = build_repository(&config).await;
    let state = AppState::new(repository, config.environment);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        environment = %config.environment,
        storage = ?config.storage,
        "Server running"
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn build_repository(config: &Config) -> Arc<dyn TodoRepository> {
    match config.storage {
        StorageBackend::InMemory => Arc::new(InMemoryTodoRepository::new()),
        StorageBackend::DynamoDb => {
            let client = DynamoDbClient::new(config).await;
            tracing::info!(table = %client.table_name(), "Using DynamoDB store");
            Arc::new(DynamoDbTodoRepository::new(client))
        }
    }
}

/// SIGINT / SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
