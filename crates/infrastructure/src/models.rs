use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use domain::{Todo, TodoId};
use std::collections::HashMap;

use crate::repositories::RepositoryError;

/// 全 Todo を格納する単一パーティション
pub const TODO_PARTITION: &str = "TODOS";
pub const TODO_SORT_KEY_PREFIX: &str = "TODO#";
pub const TODO_ENTITY_TYPE: &str = "Todo";

/// DynamoDB Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoDbKeys {
    pub pk: String,
    pub sk: String,
}

impl DynamoDbKeys {
    /// Todo 用のキーを生成（SK は ULID のため作成順に並ぶ）
    pub fn for_todo(todo_id: &TodoId) -> Self {
        Self {
            pk: TODO_PARTITION.to_string(),
            sk: format!("{TODO_SORT_KEY_PREFIX}{}", todo_id.as_str()),
        }
    }

    pub fn to_key_map(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("PK".to_string(), AttributeValue::S(self.pk.clone())),
            ("SK".to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }
}

/// Todo を DynamoDB AttributeValue マップに変換
pub fn todo_to_item(todo: &Todo) -> HashMap<String, AttributeValue> {
    let mut map = DynamoDbKeys::for_todo(&todo.id).to_key_map();

    map.insert(
        "EntityType".to_string(),
        AttributeValue::S(TODO_ENTITY_TYPE.to_string()),
    );
    map.insert("id".to_string(), AttributeValue::S(todo.id.to_string()));
    map.insert("title".to_string(), AttributeValue::S(todo.title.clone()));
    if let Some(description) = &todo.description {
        map.insert(
            "description".to_string(),
            AttributeValue::S(description.clone()),
        );
    }
    map.insert("completed".to_string(), AttributeValue::Bool(todo.completed));
    map.insert(
        "created_at".to_string(),
        AttributeValue::S(todo.created_at.to_rfc3339()),
    );
    map.insert(
        "updated_at".to_string(),
        AttributeValue::S(todo.updated_at.to_rfc3339()),
    );

    map
}

/// DynamoDB AttributeValue マップから Todo を復元
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<Todo, RepositoryError> {
    Ok(Todo {
        id: TodoId::from_string(string_attr(item, "id")?),
        title: string_attr(item, "title")?,
        description: item
            .get("description")
            .and_then(|v| v.as_s().ok())
            .cloned(),
        completed: item
            .get("completed")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .ok_or_else(|| missing("completed"))?,
        created_at: time_attr(item, "created_at")?,
        updated_at: time_attr(item, "updated_at")?,
    })
}

fn string_attr(
    item: &HashMap<String, AttributeValue>,
    name: &'static str,
) -> Result<String, RepositoryError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| missing(name))
}

fn time_attr(
    item: &HashMap<String, AttributeValue>,
    name: &'static str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let raw = string_attr(item, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Serialization(format!("invalid {name}: {e}")))
}

fn missing(name: &str) -> RepositoryError {
    RepositoryError::Serialization(format!("missing or invalid attribute: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::NewTodo;

    fn sample(description: Option<&str>) -> Todo {
        Todo::create(
            NewTodo {
                title: Some("Buy milk".to_string()),
                description: description.map(str::to_string),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_keys_for_todo() {
        let id = TodoId::from_string("01ARZ3NDEKTSV4RRFFQ69G5FAV");
        let keys = DynamoDbKeys::for_todo(&id);

        assert_eq!(keys.pk, "TODOS");
        assert_eq!(keys.sk, "TODO#01ARZ3NDEKTSV4RRFFQ69G5FAV");
    }

    #[test]
    fn test_sort_keys_follow_creation_order() {
        let sort_keys: Vec<String> = (0..100)
            .map(|_| DynamoDbKeys::for_todo(&sample(None).id).sk)
            .collect();

        let mut sorted = sort_keys.clone();
        sorted.sort();
        assert_eq!(sorted, sort_keys);
    }

    #[test]
    fn test_item_mapping_keeps_fields() {
        let todo = sample(Some("2%"));
        let item = todo_to_item(&todo);

        assert_eq!(item.get("EntityType").unwrap().as_s().unwrap(), "Todo");
        assert_eq!(item.get("completed").unwrap().as_bool().unwrap(), &false);

        let restored = item_to_todo(&item).unwrap();
        assert_eq!(restored.id, todo.id);
        assert_eq!(restored.title, todo.title);
        assert_eq!(restored.description, todo.description);
        assert_eq!(restored.created_at.timestamp_micros(), todo.created_at.timestamp_micros());
    }

    #[test]
    fn test_absent_description_is_omitted() {
        let item = todo_to_item(&sample(None));

        assert!(!item.contains_key("description"));
        assert_eq!(item_to_todo(&item).unwrap().description, None);
    }

    #[test]
    fn test_missing_attribute_is_serialization_error() {
        let mut item = todo_to_item(&sample(None));
        item.remove("completed");

        assert!(matches!(
            item_to_todo(&item),
            Err(RepositoryError::Serialization(_))
        ));
    }
}
