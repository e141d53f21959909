//! Todo REST API
//!
//! `/api/todos` 配下の CRUD と、エラー変換レイヤーを提供します。
//! バイナリ (`main.rs`) からも結合テストからも `app()` を使ってルータを構築します。

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::app;
pub use state::AppState;
