use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::api::TodoGateway;
use crate::app::{ActiveInput, App, InputMode};

fn key_hint(key: &'static str, label: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(format!(" {key} "), Style::default().fg(Color::Red)),
        Span::raw(format!(": {label} ")),
    ]
}

fn get_legend(input_mode: InputMode, editing: bool) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match input_mode {
        InputMode::Normal => vec![
            key_hint("q", "Quit"),
            key_hint("j/k", "Move"),
            key_hint("a", "Edit Fields"),
            key_hint("Enter", if editing { "Update Task" } else { "Add Task" }),
            key_hint("Space", "Toggle"),
            key_hint("e", "Edit"),
            key_hint("d", "Delete"),
            key_hint("r", "Refresh"),
            key_hint("Esc", "Cancel Edit"),
        ],
        InputMode::Insert => vec![
            key_hint("Tab", "Switch Field"),
            key_hint("Enter", if editing { "Update Task" } else { "Add Task" }),
            key_hint("Esc", "Done"),
        ],
    };

    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn input_block(title: &'static str, focused: bool) -> Block<'static> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default().borders(Borders::ALL).title(title).border_style(style)
}

fn status_line<G>(app: &App<G>) -> Line<'static> {
    if app.loading {
        Line::from(Span::styled("Loading...", Style::default().fg(Color::Cyan)))
    } else if let Some(error) = &app.error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else {
        Line::from("")
    }
}

pub fn draw<G: TodoGateway>(f: &mut Frame, app: &mut App<G>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(f.area());

    let editing = app.editing.is_some();
    let inserting = app.input_mode == InputMode::Insert;
    let title_focused = inserting && app.active_input == ActiveInput::Title;
    let description_focused = inserting && app.active_input == ActiveInput::Description;

    let title_label = if editing { "Task Title (editing)" } else { "Task Title" };
    f.render_widget(
        Paragraph::new(app.title.as_str()).block(input_block(title_label, title_focused)),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(app.description.as_str())
            .block(input_block("Task Description", description_focused)),
        chunks[1],
    );

    if inserting {
        let (area, draft) = match app.active_input {
            ActiveInput::Title => (chunks[0], &app.title),
            ActiveInput::Description => (chunks[1], &app.description),
        };
        f.set_cursor_position(cursor_in(area, draft));
    }

    let list_block = Block::default().borders(Borders::ALL).title("Task Manager");
    if app.todos.is_empty() {
        f.render_widget(
            List::new(vec![ListItem::new("No tasks yet")]).block(list_block),
            chunks[2],
        );
    } else {
        let items: Vec<ListItem> = app
            .todos
            .iter()
            .map(|todo| {
                let style = if todo.completed {
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default()
                };
                let mut spans = vec![Span::styled(
                    todo.title.clone(),
                    style.add_modifier(Modifier::BOLD),
                )];
                if let Some(description) = &todo.description {
                    spans.push(Span::styled(format!(": {description}"), style));
                }
                if app.editing.as_ref() == Some(&todo.id) {
                    spans.push(Span::styled(" (editing)", Style::default().fg(Color::Yellow)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(list_block)
            .highlight_style(Style::default().fg(Color::Green))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[2], &mut app.state);
    }

    f.render_widget(Paragraph::new(status_line(app)), chunks[3]);
    f.render_widget(Paragraph::new(get_legend(app.input_mode, editing)), chunks[4]);
}

/// 枠線の内側、入力済み文字列の末尾
fn cursor_in(area: Rect, draft: &str) -> Position {
    let max_x = area.x + area.width.saturating_sub(2);
    let typed = u16::try_from(draft.chars().count()).unwrap_or(u16::MAX);
    let x = area.x.saturating_add(1).saturating_add(typed);
    Position::new(x.min(max_x), area.y + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legend_text(input_mode: InputMode, editing: bool) -> String {
        get_legend(input_mode, editing).lines[0]
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect()
    }

    #[test]
    fn test_cursor_stays_inside_input_box() {
        let area = Rect::new(0, 0, 10, 3);

        assert_eq!(cursor_in(area, ""), Position::new(1, 1));
        assert_eq!(cursor_in(area, "abc"), Position::new(4, 1));
        assert_eq!(cursor_in(area, "a very long title"), Position::new(8, 1));
    }

    #[test]
    fn test_legend_reflects_edit_state() {
        let legend = legend_text(InputMode::Normal, true);
        assert!(legend.contains("Update Task"));

        let legend = legend_text(InputMode::Insert, false);
        assert!(legend.contains("Add Task"));
        assert!(!legend.contains("Quit"));
    }
}
