use crate::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// プロセス内で単調増加する ULID を払い出す
/// 同一ミリ秒内でも作成順にソートできるようにする
fn next_ulid() -> ulid::Ulid {
    static GENERATOR: OnceLock<Mutex<ulid::Generator>> = OnceLock::new();

    GENERATOR
        .get_or_init(|| Mutex::new(ulid::Generator::new()))
        .lock()
        .ok()
        .and_then(|mut generator| generator.generate().ok())
        // 乱数部の桁あふれ（同一ミリ秒で 2^80 件）やロック異常時は通常生成に戻す
        .unwrap_or_else(ulid::Ulid::new)
}

/// Todo の識別子（ULID 文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(next_ulid().to_string())
    }

    /// URL などから受け取った識別子をそのまま包む（存在確認はストア側で行う）
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn timestamp_ms(&self) -> Option<u64> {
        ulid::Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST /todos の入力
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// PUT /todos/:id の入力（部分更新）
///
/// 未知のフィールドは無視されるため、クライアントはレコード全体を送ってもよい。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

impl Todo {
    /// 新しい Todo を作成します。
    /// タイトルが無い、または空文字の場合は `DomainError::Validation` を返します。
    pub fn create(input: NewTodo, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let title = match input.title {
            Some(title) if !title.is_empty() => title,
            _ => return Err(DomainError::title_required()),
        };

        Ok(Self {
            id: TodoId::new(),
            title,
            description: input.description,
            completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// 部分更新を適用します。
    ///
    /// - `title` / `description`: 空でない値が指定された場合のみ置き換える
    ///   （空文字は指定なしと同じ扱いで、既存の値を維持する）
    /// - `completed`: 指定されていれば `false` でも置き換える
    pub fn apply_patch(&mut self, patch: TodoPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title.filter(|t| !t.is_empty()) {
            self.title = title;
        }
        if let Some(description) = patch.description.filter(|d| !d.is_empty()) {
            self.description = Some(description);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(now: DateTime<Utc>) -> Todo {
        Todo::create(
            NewTodo {
                title: Some("Buy milk".into()),
                description: Some("2%".into()),
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_todo_id_new_generates_26_char_ulid() {
        // Act: 新しいTodoIdを生成
        let id = TodoId::new();

        // Assert: 26文字のBase32形式であることを確認
        assert_eq!(id.as_str().len(), 26);
        let valid_chars = "0123456789ABCDEFGHJKMNPQRSTVWXYZ";
        for c in id.as_str().chars() {
            assert!(valid_chars.contains(c), "Invalid character: {c}");
        }
        assert!(id.timestamp_ms().is_some());
    }

    #[test]
    fn test_todo_ids_sort_in_creation_order() {
        // Act: 同一ミリ秒内に連続して生成
        let ids: Vec<TodoId> = (0..1000).map(|_| TodoId::new()).collect();

        // Assert: 文字列順が生成順と一致する
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(sorted, ids);
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }

    #[test]
    fn test_todo_id_serializes_transparently() {
        let id = TodoId::from_string("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_eq!(id.timestamp_ms(), None);
    }

    #[test]
    fn create_sets_defaults() {
        let now = Utc::now();
        let todo = sample(now);

        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description.as_deref(), Some("2%"));
        assert!(!todo.completed);
        assert_eq!(todo.created_at, now);
        assert_eq!(todo.updated_at, now);
    }

    #[test]
    fn create_assigns_distinct_ids() {
        let now = Utc::now();
        let a = sample(now);
        let b = sample(now);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn create_without_title_is_validation_error() {
        let now = Utc::now();
        let missing = Todo::create(NewTodo::default(), now).unwrap_err();
        let empty = Todo::create(
            NewTodo {
                title: Some(String::new()),
                description: Some("x".into()),
            },
            now,
        )
        .unwrap_err();

        assert_eq!(missing, DomainError::title_required());
        assert_eq!(empty, DomainError::title_required());
        assert_eq!(missing.to_string(), "Title is required");
    }

    #[test]
    fn apply_patch_with_only_completed_keeps_text_fields() {
        let now = Utc::now();
        let mut todo = sample(now);
        let later = now + Duration::seconds(5);

        todo.apply_patch(TodoPatch::completed(true), later);

        assert!(todo.completed);
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description.as_deref(), Some("2%"));
        assert_eq!(todo.created_at, now);
        assert_eq!(todo.updated_at, later);
    }

    #[test]
    fn apply_patch_honors_explicit_false() {
        let now = Utc::now();
        let mut todo = sample(now);
        todo.completed = true;

        todo.apply_patch(TodoPatch::completed(false), now);

        assert!(!todo.completed);
    }

    #[test]
    fn apply_patch_ignores_empty_strings() {
        let now = Utc::now();
        let mut todo = sample(now);

        todo.apply_patch(
            TodoPatch {
                title: Some(String::new()),
                description: Some(String::new()),
                completed: None,
            },
            now,
        );

        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.description.as_deref(), Some("2%"));
    }

    #[test]
    fn patch_deserializes_null_completed_as_absent() {
        let patch: TodoPatch =
            serde_json::from_str(r#"{"completed":null,"id":"x","created_at":"y"}"#).unwrap();
        assert_eq!(patch, TodoPatch::default());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn any_patch() -> impl Strategy<Value = TodoPatch> {
            (
                proptest::option::of(".{0,16}"),
                proptest::option::of(".{0,16}"),
                proptest::option::of(any::<bool>()),
            )
                .prop_map(|(title, description, completed)| TodoPatch {
                    title,
                    description,
                    completed,
                })
        }

        proptest! {
            #[test]
            fn title_is_never_empty_after_patches(patches in proptest::collection::vec(any_patch(), 0..20)) {
                let now = Utc::now();
                let mut todo = sample(now);
                for patch in patches {
                    todo.apply_patch(patch, now);
                    prop_assert!(!todo.title.is_empty());
                }
            }

            #[test]
            fn unsupplied_fields_are_unchanged(patch in any_patch()) {
                let now = Utc::now();
                let before = sample(now);
                let mut after = before.clone();
                after.apply_patch(patch.clone(), now);

                if patch.title.as_deref().map_or(true, str::is_empty) {
                    prop_assert_eq!(&after.title, &before.title);
                }
                if patch.description.as_deref().map_or(true, str::is_empty) {
                    prop_assert_eq!(&after.description, &before.description);
                }
                match patch.completed {
                    Some(c) => prop_assert_eq!(after.completed, c),
                    None => prop_assert_eq!(after.completed, before.completed),
                }
                prop_assert_eq!(&after.id, &before.id);
            }
        }
    }
}
