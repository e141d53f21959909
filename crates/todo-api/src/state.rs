use std::sync::Arc;

use infrastructure::{InMemoryTodoRepository, TodoRepository};
use shared::Environment;

/// アプリケーションの共有状態
///
/// ストアは起動時に明示的に構築して注入する（グローバルなシングルトンは持たない）。
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TodoRepository>,
    pub environment: Environment,
}

impl AppState {
    pub fn new(repository: Arc<dyn TodoRepository>, environment: Environment) -> Self {
        Self {
            repository,
            environment,
        }
    }

    /// InMemory ストアを使う開発/テスト用の状態
    pub fn in_memory(environment: Environment) -> Self {
        Self::new(Arc::new(InMemoryTodoRepository::new()), environment)
    }
}
