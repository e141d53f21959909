use async_trait::async_trait;
use domain::{Todo, TodoId};
use thiserror::Error;

/// ストア層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Todo の永続化境界
///
/// `insert` / `update` / `delete` はそれぞれ 1 回の書き込みで完結する。
/// 複数レコードにまたがるトランザクションや楽観的ロックは持たない。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// 全件を作成順で取得
    async fn list(&self) -> Result<Vec<Todo>, RepositoryError>;

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError>;

    async fn insert(&self, todo: &Todo) -> Result<(), RepositoryError>;

    /// 既存レコードを置き換える。存在しなければ `NotFound`
    async fn update(&self, todo: &Todo) -> Result<(), RepositoryError>;

    /// 物理削除。存在しなければ `NotFound`
    async fn delete(&self, id: &TodoId) -> Result<(), RepositoryError>;
}
