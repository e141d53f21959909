//! todo-api との HTTP 通信
//!
//! 失敗は `ClientError` の 3 種類（応答なし / サーバーからのエラー応答 / クライアント側の想定外）に分類します。

use async_trait::async_trait;
use domain::{NewTodo, Todo, TodoId, TodoPatch};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use shared::ClientConfig;
use thiserror::Error;

/// 一覧が 0 件のときにサーバーが返すメッセージ
pub const NO_TODOS_MESSAGE: &str = "No todos found";

#[derive(Debug, Error)]
pub enum ClientError {
    /// リクエストは送れたが応答が得られなかった（接続失敗・タイムアウト）
    #[error("No response from server: {0}")]
    Connectivity(String),

    /// サーバーがエラー応答を返した
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() || e.is_decode() {
            ClientError::Unexpected(e.to_string())
        } else if e.is_connect() || e.is_timeout() || e.is_request() || e.is_body() {
            ClientError::Connectivity(e.to_string())
        } else {
            ClientError::Unexpected(e.to_string())
        }
    }
}

/// PUT /todos/:id の本文
///
/// 完了切り替えではレコード全体を、編集では変更するフィールドだけを送る。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TodoUpdate {
    Record(Todo),
    Fields(TodoPatch),
}

/// UI から見た Todo API の境界
#[async_trait]
pub trait TodoGateway: Send + Sync {
    async fn list(&self) -> Result<Vec<Todo>, ClientError>;

    async fn create(&self, input: &NewTodo) -> Result<Todo, ClientError>;

    async fn update(&self, id: &TodoId, body: &TodoUpdate) -> Result<Todo, ClientError>;

    async fn delete(&self, id: &TodoId) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct FailureEnvelope {
    message: Option<String>,
    error: Option<String>,
}

/// reqwest による `TodoGateway` 実装
#[derive(Debug, Clone)]
pub struct TodoClient {
    http: Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn todos_url(&self) -> String {
        format!("{}/todos", self.base_url)
    }

    fn todo_url(&self, id: &TodoId) -> String {
        format!("{}/todos/{}", self.base_url, id)
    }

    /// 送信して 2xx 以外を `ClientError::Server` に変換
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(server_error(response).await)
        }
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let envelope: DataEnvelope<T> = self.send(request).await?.json().await?;
        Ok(envelope.data)
    }
}

/// エラー応答から表示用メッセージを取り出す
/// `message` → `error` → 本文 → ステータスの説明 の順で採用する
async fn server_error(response: Response) -> ClientError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<FailureEnvelope>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .or_else(|| (!text.trim().is_empty()).then(|| text.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown status").to_string());

    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl TodoGateway for TodoClient {
    /// 0 件を示す 404 だけを空の一覧として扱う
    /// ルート不一致などその他の 404 はエラーのまま返す
    async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        match self.data(self.http.get(self.todos_url())).await {
            Err(ClientError::Server { status, message })
                if status == StatusCode::NOT_FOUND.as_u16() && message == NO_TODOS_MESSAGE =>
            {
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn create(&self, input: &NewTodo) -> Result<Todo, ClientError> {
        self.data(self.http.post(self.todos_url()).json(input)).await
    }

    async fn update(&self, id: &TodoId, body: &TodoUpdate) -> Result<Todo, ClientError> {
        self.data(self.http.put(self.todo_url(id)).json(body)).await
    }

    async fn delete(&self, id: &TodoId) -> Result<(), ClientError> {
        self.send(self.http.delete(self.todo_url(id))).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_urls_are_built_from_base() {
        let client = TodoClient::new(&ClientConfig {
            api_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        assert_eq!(client.todos_url(), "http://localhost:3000/api/todos");
        assert_eq!(
            client.todo_url(&TodoId::from_string("abc")),
            "http://localhost:3000/api/todos/abc"
        );
    }

    #[test]
    fn test_update_body_serializes_untagged() {
        let body = TodoUpdate::Fields(TodoPatch {
            title: Some("t".into()),
            description: Some("d".into()),
            completed: None,
        });

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "title": "t", "description": "d" })
        );
    }

    #[test]
    fn test_error_messages_are_readable() {
        let err = ClientError::Server {
            status: 400,
            message: "Title is required".into(),
        };
        assert_eq!(err.to_string(), "Server error (400): Title is required");
        assert!(ClientError::Connectivity("refused".into())
            .to_string()
            .starts_with("No response from server"));
    }
}
