use std::future::Future;

use axum::Router;
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::state::{SeaOrmStateStore, StateService};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the database and assemble the router around it.
///
/// The returned connection is owned by the caller, who closes it after the
/// server has stopped.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<(Router, DatabaseConnection)> {
    // 打开数据库并执行迁移（幂等）
    let db = models::db::init(&cfg.database).await?;
    let store = SeaOrmStateStore::new(db.clone(), cfg.database.op_timeout());
    let state = ServerState::new(StateService::new(std::sync::Arc::new(store)));
    let app = routes::build_router(state, &cfg.static_files, build_cors(), cfg.server.body_limit_bytes);
    Ok((app, db))
}

/// Run the HTTP server until `shutdown` resolves, then close the database.
pub async fn serve<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let db_file = cfg.database.sqlite_file();
    common::env::ensure_env(&cfg.static_files.dir, db_file.as_deref()).await?;

    let (app, db) = build_app(&cfg).await?;

    // 按 (host, port) 绑定，host 可以是主机名（如 localhost）
    let listener = tokio::net::TcpListener::bind((cfg.server.host.as_str(), cfg.server.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, static_dir = %cfg.static_files.dir, "state server running on http://localhost:{}", addr.port());

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    // 停机后关闭连接池
    models::db::close(db).await?;
    info!("database closed");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
