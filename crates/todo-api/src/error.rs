//! エラー変換レイヤー
//!
//! 各操作が返す `ApiError` を HTTP レスポンスへ変換します。
//! 構造化済みのエラー（400/404/500）はその場で `{success:false, message}` を返し、
//! それ以外の想定外の失敗は `render_unhandled` ミドルウェアが
//! `{success:false, error[, stack]}` にまとめて変換します。

use std::any::Any;

use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use infrastructure::RepositoryError;
use serde::Serialize;
use thiserror::Error;

use crate::state::AppState;

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// 必須項目の欠落（400）
    #[error("{0}")]
    Validation(String),

    /// 存在しない識別子、または空の一覧（404）
    #[error("{0}")]
    NotFound(String),

    /// ストア層の失敗（500）
    #[error("Store error: {0}")]
    Store(#[source] RepositoryError),

    /// 上記以外の失敗。ステータスはエラー側が宣言したもの
    #[error("{cause}")]
    Unexpected {
        status: StatusCode,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn unexpected(status: StatusCode, cause: impl Into<anyhow::Error>) -> Self {
        ApiError::Unexpected {
            status,
            cause: cause.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unexpected { status, .. } => *status,
        }
    }
}

/// 構造化済みエラーの本文
#[derive(Debug, Serialize)]
struct FailureBody {
    success: bool,
    message: String,
}

/// 想定外エラーの本文
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// `render_unhandled` に引き渡すための情報（レスポンス拡張に格納）
#[derive(Debug, Clone)]
pub struct UnhandledError {
    pub message: String,
    pub trace: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Validation(message) | ApiError::NotFound(message) => {
                tracing::warn!(status = status.as_u16(), %message, "Request rejected");
                let body = FailureBody {
                    success: false,
                    message,
                };
                (status, Json(body)).into_response()
            }
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                let body = FailureBody {
                    success: false,
                    message: INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
                };
                (status, Json(body)).into_response()
            }
            ApiError::Unexpected { status, cause } => {
                let mut response = status.into_response();
                response.extensions_mut().insert(UnhandledError {
                    message: cause.to_string(),
                    trace: format!("{cause:?}"),
                });
                response
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        ApiError::Store(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::unexpected(rejection.status(), rejection)
    }
}

/// 想定外エラーをまとめて `{success:false, error[, stack]}` に変換するミドルウェア
/// 本番環境では `stack` を出力しない
pub async fn render_unhandled(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let mut response = next.run(req).await;

    let Some(failure) = response.extensions_mut().remove::<UnhandledError>() else {
        return response;
    };

    let status = response.status();
    tracing::error!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        error = %failure.message,
        trace = %failure.trace,
        "Unhandled error"
    );

    let body = ErrorEnvelope {
        success: false,
        error: failure.message,
        stack: (!state.environment.is_production()).then_some(failure.trace),
    };
    (status, Json(body)).into_response()
}

/// 未定義ルート
pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::unexpected(
        StatusCode::NOT_FOUND,
        anyhow::anyhow!("Not Found - {}", uri.path()),
    )
}

/// 定義済みルートへの未対応メソッド
pub async fn method_not_allowed(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::unexpected(
        StatusCode::METHOD_NOT_ALLOWED,
        anyhow::anyhow!("Method Not Allowed - {}", uri.path()),
    )
}

/// ハンドラー内の panic を 500 の想定外エラーへ変換（CatchPanicLayer 用）
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    ApiError::unexpected(
        StatusCode::INTERNAL_SERVER_ERROR,
        anyhow::anyhow!("panic in request handler: {detail}"),
    )
    .into_response()
}
