use crate::repositories::{RepositoryError, TodoRepository};
use async_trait::async_trait;
use domain::{Todo, TodoId};
use std::sync::{Mutex, MutexGuard};

/// 簡易な InMemory 実装（開発/テスト用）
#[derive(Debug, Default)]
pub struct InMemoryTodoRepository {
    todos: Mutex<Vec<Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos: Mutex::new(todos),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Todo>>, RepositoryError> {
        self.todos
            .lock()
            .map_err(|e| RepositoryError::Storage(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list(&self) -> Result<Vec<Todo>, RepositoryError> {
        Ok(self.lock()?.clone())
    }

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError> {
        Ok(self.lock()?.iter().find(|t| &t.id == id).cloned())
    }

    async fn insert(&self, todo: &Todo) -> Result<(), RepositoryError> {
        let mut todos = self.lock()?;
        if todos.iter().any(|t| t.id == todo.id) {
            return Err(RepositoryError::Storage(format!(
                "duplicate todo id: {}",
                todo.id
            )));
        }
        todos.push(todo.clone());
        Ok(())
    }

    async fn update(&self, todo: &Todo) -> Result<(), RepositoryError> {
        let mut todos = self.lock()?;
        let slot = todos
            .iter_mut()
            .find(|t| t.id == todo.id)
            .ok_or_else(|| RepositoryError::NotFound(todo.id.to_string()))?;
        *slot = todo.clone();
        Ok(())
    }

    async fn delete(&self, id: &TodoId) -> Result<(), RepositoryError> {
        let mut todos = self.lock()?;
        let index = todos
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        todos.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::NewTodo;

    fn todo(title: &str) -> Todo {
        Todo::create(
            NewTodo {
                title: Some(title.to_string()),
                description: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let repo = InMemoryTodoRepository::new();
        for title in ["A", "B", "C"] {
            repo.insert(&todo(title)).await.unwrap();
        }

        let titles: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_id() {
        let repo = InMemoryTodoRepository::new();
        let t = todo("A");
        repo.insert(&t).await.unwrap();

        assert!(matches!(
            repo.insert(&t).await,
            Err(RepositoryError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_existing_record() {
        let repo = InMemoryTodoRepository::new();
        let mut t = todo("A");
        repo.insert(&t).await.unwrap();

        t.completed = true;
        repo.update(&t).await.unwrap();

        let stored = repo.find(&t.id).await.unwrap().unwrap();
        assert!(stored.completed);
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let repo = InMemoryTodoRepository::new();
        let t = todo("A");

        assert_eq!(
            repo.update(&t).await,
            Err(RepositoryError::NotFound(t.id.to_string()))
        );
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let t = todo("A");
        let repo = InMemoryTodoRepository::with_todos(vec![t.clone()]);

        repo.delete(&t.id).await.unwrap();
        assert!(repo.find(&t.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&t.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
