use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    /// 作成時にタイトルが無い場合のエラー
    pub fn title_required() -> Self {
        DomainError::Validation("Title is required".to_string())
    }
}
