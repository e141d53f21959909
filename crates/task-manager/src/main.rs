use std::io;
use std::time::Duration;

use ratatui::{
    backend::{Backend, CrosstermBackend},
    crossterm::{
        event::{self, Event},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    },
    Terminal,
};
use shared::{init_client_tracing, ClientConfig};
use task_manager::{ui, Action, App, TodoClient, TodoGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_client_tracing().map_err(|e| anyhow::anyhow!(e))?;

    let config = ClientConfig::from_env()?;
    let client = TodoClient::new(&config)?;
    tracing::info!(api_url = %client.base_url(), "Starting task manager");

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, App::new(client)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend, G: TodoGateway>(
    terminal: &mut Terminal<B>,
    mut app: App<G>,
) -> anyhow::Result<()> {
    app.loading = true;
    terminal.draw(|f| ui::draw(f, &mut app))?;
    app.init().await;

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        match app.handle_key(key) {
            Some(Action::Quit) => return Ok(()),
            Some(action) => {
                // 通信中の表示を出してから実行
                terminal.draw(|f| ui::draw(f, &mut app))?;
                app.perform(action).await;
            }
            None => {}
        }
    }
}
