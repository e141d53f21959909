use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::error::{method_not_allowed, panic_response, render_unhandled, route_not_found};
use crate::handlers::{create_todo, delete_todo, health, list_todos, update_todo};
use crate::state::AppState;

/// `/api` 配下のルート
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/todos",
            get(list_todos)
                .post(create_todo)
                .fallback(method_not_allowed),
        )
        .route(
            "/todos/:id",
            put(update_todo)
                .delete(delete_todo)
                .fallback(method_not_allowed),
        )
}

/// アプリケーション全体のルータを構築
///
/// リクエストは CORS → トレース → 想定外エラー変換 → panic 捕捉 の順にレイヤーを通過する。
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state.clone(), render_unhandled))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
