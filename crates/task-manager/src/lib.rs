//! 端末版 Task Manager
//!
//! todo-api の一覧を表示し、追加・編集・完了切り替え・削除を行います。

pub mod api;
pub mod app;
pub mod ui;

pub use api::{ClientError, TodoClient, TodoGateway, TodoUpdate};
pub use app::{Action, App};
