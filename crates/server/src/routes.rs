pub mod state;

use std::path::Path;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use configs::StaticConfig;
use service::state::{StateService, StateStore};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::errors::ApiError;

/// Shared handler state.
pub struct ServerState<S: StateStore> {
    pub states: Arc<StateService<S>>,
}

impl<S: StateStore> ServerState<S> {
    pub fn new(states: StateService<S>) -> Self {
        Self { states: Arc::new(states) }
    }
}

impl<S: StateStore> Clone for ServerState<S> {
    fn clone(&self) -> Self {
        Self { states: Arc::clone(&self.states) }
    }
}

async fn api_not_found() -> ApiError {
    ApiError::not_found()
}

fn api_routes<S: StateStore + 'static>(body_limit: usize) -> Router<ServerState<S>> {
    Router::new()
        .route("/state", get(state::missing_user_id).post(state::missing_user_id))
        .route("/state/", get(state::missing_user_id).post(state::missing_user_id))
        .route("/state/:user_id", get(state::get_state::<S>).post(state::save_state::<S>))
        // unknown API paths never fall through to static files
        .fallback(api_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Build the full application router: state API, static assets, CORS and tracing.
pub fn build_router<S: StateStore + 'static>(
    state: ServerState<S>,
    static_cfg: &StaticConfig,
    cors: CorsLayer,
    body_limit: usize,
) -> Router {
    // API 路由统一挂在 /api 下
    let app = Router::new().nest("/api", api_routes::<S>(body_limit));

    // 静态资源；开启 spa_fallback 时未匹配路径返回 index.html
    let app = if static_cfg.spa_fallback {
        let index = Path::new(&static_cfg.dir).join("index.html");
        app.fallback_service(ServeDir::new(&static_cfg.dir).fallback(ServeFile::new(index)))
    } else {
        app.fallback_service(ServeDir::new(&static_cfg.dir))
    };

    app.with_state(state)
        .layer(cors)
        .layer(
            // 每次请求创建 span，响应时记录状态码与耗时，5xx 以 ERROR 记录
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
