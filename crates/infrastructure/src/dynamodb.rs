use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use domain::{Todo, TodoId};
use shared::Config;
use tracing::{error, info};

use crate::models::{item_to_todo, todo_to_item, DynamoDbKeys, TODO_PARTITION};
use crate::repositories::{RepositoryError, TodoRepository};

#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    /// 既定の認証情報チェーンからクライアントを作成
    /// `dynamodb_endpoint` が設定されていれば DynamoDB Local などに向ける
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
            table_name: config.dynamodb_table.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// DynamoDB を使った Todo ストア
#[derive(Clone)]
pub struct DynamoDbTodoRepository {
    db: DynamoDbClient,
}

impl DynamoDbTodoRepository {
    pub fn new(db: DynamoDbClient) -> Self {
        Self { db }
    }
}

fn storage_error(operation: &str, e: impl std::fmt::Display) -> RepositoryError {
    error!(operation = operation, error = %e, "DynamoDB operation failed");
    RepositoryError::Storage(format!("{operation}: {e}"))
}

#[async_trait]
impl TodoRepository for DynamoDbTodoRepository {
    async fn list(&self) -> Result<Vec<Todo>, RepositoryError> {
        let mut todos = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .db
                .client()
                .query()
                .table_name(self.db.table_name())
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(":pk", AttributeValue::S(TODO_PARTITION.to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| storage_error("query", DisplayErrorContext(&e)))?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(todos)
    }

    async fn find(&self, id: &TodoId) -> Result<Option<Todo>, RepositoryError> {
        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .send()
            .await
            .map_err(|e| storage_error("get_item", DisplayErrorContext(&e)))?;

        output.item().map(item_to_todo).transpose()
    }

    async fn insert(&self, todo: &Todo) -> Result<(), RepositoryError> {
        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(|e| storage_error("put_item", DisplayErrorContext(&e)))?;

        info!(todo_id = %todo.id, "Todo item stored");
        Ok(())
    }

    async fn update(&self, todo: &Todo) -> Result<(), RepositoryError> {
        let result = self
            .db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(RepositoryError::NotFound(todo.id.to_string()))
            }
            Err(e) => Err(storage_error("put_item", DisplayErrorContext(&e))),
        }
    }

    async fn delete(&self, id: &TodoId) -> Result<(), RepositoryError> {
        let result = self
            .db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(DynamoDbKeys::for_todo(id).to_key_map()))
            .condition_expression("attribute_exists(PK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(RepositoryError::NotFound(id.to_string()))
            }
            Err(e) => Err(storage_error("delete_item", DisplayErrorContext(&e))),
        }
    }
}
