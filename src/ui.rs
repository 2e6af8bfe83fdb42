//! Terminal front end
//!
//! One task drives everything: it waits on either a terminal event or a
//! completion from the runtime, applies it, and redraws.

mod app;
mod render;

pub use app::App;

use crate::runtime::{AssistantClient, CatalogClient, SessionRuntime};
use crossterm::cursor::Show;
use crossterm::event::{Event as TermEvent, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;

/// Raw mode and the alternate screen, undone on drop even when the loop
/// bails out with an error
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
    }
}

/// Run the chat client until the user quits
pub async fn run<A, C>(runtime: SessionRuntime<A, C>) -> io::Result<()>
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut app = App::new(runtime);
    app.load_catalog();
    let mut events = EventStream::new();

    while !app.should_quit() {
        terminal.draw(|frame| render::draw(frame, &app))?;

        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(TermEvent::Key(key))) => app.handle_key(key),
                // Resizes and the rest only need the redraw
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },

            Some(event) = app.runtime_mut().recv_completion() => {
                app.on_completion(event);
            }
        }
    }

    tracing::info!(
        session_id = %app.runtime().context().session_id,
        messages = app.runtime().state().history().messages().len(),
        "Session ended"
    );
    Ok(())
}
