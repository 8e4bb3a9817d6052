use anyhow::Result;

use tutor_chat::app::App;
use tutor_chat::config::Config;
use tutor_chat::{handler, tui, ui};

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_panic_hook();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let mut app = App::new(&config);

    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }

        // Ticks arrive every 300ms, so a finished request is collected
        // promptly even with no keyboard activity
        app.poll_submit().await;
    }

    Ok(())
}
