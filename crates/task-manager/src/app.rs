use domain::{NewTodo, Todo, TodoId, TodoPatch};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::ListState;
use tracing::{info, warn};

use crate::api::{ClientError, TodoGateway, TodoUpdate};

pub const DRAFT_REQUIRED_MESSAGE: &str = "Title and description are required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveInput {
    Title,
    Description,
}

/// キー入力から生じる、通信を伴う操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Refresh,
    Add(NewTodo),
    Update(TodoId, TodoPatch),
    Toggle(Todo),
    Delete(TodoId),
    Quit,
}

/// Task Manager の画面状態
///
/// 入力やカーソル移動は `handle_key` で同期的に処理し、
/// 通信が必要なものは `Action` として返して `perform` で実行する。
pub struct App<G> {
    gateway: G,
    pub todos: Vec<Todo>,
    pub title: String,
    pub description: String,
    pub editing: Option<TodoId>,
    pub loading: bool,
    pub error: Option<String>,
    pub state: ListState,
    pub input_mode: InputMode,
    pub active_input: ActiveInput,
}

impl<G: TodoGateway> App<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            todos: Vec::new(),
            title: String::new(),
            description: String::new(),
            editing: None,
            loading: false,
            error: None,
            state: ListState::default(),
            input_mode: InputMode::Normal,
            active_input: ActiveInput::Title,
        }
    }

    /// 起動時に一度だけ一覧を取得
    pub async fn init(&mut self) {
        self.loading = true;
        self.perform(Action::Refresh).await;
    }

    pub fn selected(&self) -> Option<&Todo> {
        self.state.selected().and_then(|i| self.todos.get(i))
    }

    pub fn next(&mut self) {
        if self.todos.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.todos.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.todos.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.todos.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match self.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('j') | KeyCode::Down => {
                    self.next();
                    None
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    self.previous();
                    None
                }
                KeyCode::Char('a') | KeyCode::Char('i') => {
                    self.input_mode = InputMode::Insert;
                    None
                }
                KeyCode::Tab => {
                    self.switch_input();
                    None
                }
                KeyCode::Enter => self.submit(),
                KeyCode::Char(' ') => {
                    let todo = self.selected()?.clone();
                    self.request(Action::Toggle(todo))
                }
                KeyCode::Char('e') => {
                    self.start_edit();
                    None
                }
                KeyCode::Char('d') => {
                    let id = self.selected()?.id.clone();
                    self.request(Action::Delete(id))
                }
                KeyCode::Char('r') => self.request(Action::Refresh),
                KeyCode::Esc => {
                    self.cancel_edit();
                    None
                }
                _ => None,
            },
            InputMode::Insert => match key.code {
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    None
                }
                KeyCode::Tab => {
                    self.switch_input();
                    None
                }
                KeyCode::Enter => {
                    self.input_mode = InputMode::Normal;
                    self.submit()
                }
                KeyCode::Backspace => {
                    self.active_draft().pop();
                    None
                }
                KeyCode::Char(c) => {
                    self.active_draft().push(c);
                    None
                }
                _ => None,
            },
        }
    }

    /// 通信を伴う操作を実行し、`loading` と `error` を更新する
    pub async fn perform(&mut self, action: Action) {
        if action == Action::Quit {
            return;
        }

        self.loading = true;
        let result = match action {
            Action::Refresh => self.refresh().await,
            Action::Add(input) => self.add(input).await,
            Action::Update(id, patch) => self.update(id, patch).await,
            Action::Toggle(todo) => self.toggle(todo).await,
            Action::Delete(id) => self.delete(id).await,
            Action::Quit => Ok(()),
        };
        self.loading = false;

        match result {
            Ok(()) => self.error = None,
            Err(e) => {
                warn!(error = %e, "Request failed");
                self.error = Some(e.to_string());
            }
        }
    }

    fn request(&mut self, action: Action) -> Option<Action> {
        self.loading = true;
        Some(action)
    }

    /// Enter: 編集中なら Update、そうでなければ Add
    fn submit(&mut self) -> Option<Action> {
        if let Some(id) = self.editing.clone() {
            let patch = TodoPatch {
                title: Some(self.title.clone()),
                description: Some(self.description.clone()),
                completed: None,
            };
            return self.request(Action::Update(id, patch));
        }

        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            self.error = Some(DRAFT_REQUIRED_MESSAGE.to_string());
            return None;
        }

        let input = NewTodo {
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
        };
        self.request(Action::Add(input))
    }

    fn start_edit(&mut self) {
        let Some(todo) = self.selected().cloned() else {
            return;
        };
        self.title = todo.title;
        self.description = todo.description.unwrap_or_default();
        self.editing = Some(todo.id);
        self.input_mode = InputMode::Insert;
        self.active_input = ActiveInput::Title;
    }

    fn cancel_edit(&mut self) {
        self.editing = None;
        self.clear_drafts();
    }

    fn clear_drafts(&mut self) {
        self.title.clear();
        self.description.clear();
    }

    fn switch_input(&mut self) {
        self.active_input = match self.active_input {
            ActiveInput::Title => ActiveInput::Description,
            ActiveInput::Description => ActiveInput::Title,
        };
    }

    fn active_draft(&mut self) -> &mut String {
        match self.active_input {
            ActiveInput::Title => &mut self.title,
            ActiveInput::Description => &mut self.description,
        }
    }

    async fn refresh(&mut self) -> Result<(), ClientError> {
        self.todos = self.gateway.list().await?;
        let selected = match self.state.selected() {
            _ if self.todos.is_empty() => None,
            Some(i) => Some(i.min(self.todos.len() - 1)),
            None => Some(0),
        };
        self.state.select(selected);
        Ok(())
    }

    async fn add(&mut self, input: NewTodo) -> Result<(), ClientError> {
        let created = self.gateway.create(&input).await?;
        info!(todo_id = %created.id, "Todo added");
        self.clear_drafts();
        self.refresh().await
    }

    async fn update(&mut self, id: TodoId, patch: TodoPatch) -> Result<(), ClientError> {
        self.gateway.update(&id, &TodoUpdate::Fields(patch)).await?;
        info!(todo_id = %id, "Todo updated");
        self.cancel_edit();
        self.refresh().await
    }

    /// 直前のレコード全体を completed 反転で送り、応答でローカルの 1 件を置き換える
    async fn toggle(&mut self, todo: Todo) -> Result<(), ClientError> {
        let id = todo.id.clone();
        let toggled = Todo {
            completed: !todo.completed,
            ..todo
        };
        let updated = self.gateway.update(&id, &TodoUpdate::Record(toggled)).await?;

        if let Some(slot) = self.todos.iter_mut().find(|t| t.id == id) {
            *slot = updated;
        }
        Ok(())
    }

    async fn delete(&mut self, id: TodoId) -> Result<(), ClientError> {
        self.gateway.delete(&id).await?;
        info!(todo_id = %id, "Todo deleted");
        if self.editing.as_ref() == Some(&id) {
            self.cancel_edit();
        }
        self.refresh().await
    }
}
