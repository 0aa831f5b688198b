mod analysis;
mod api;
mod app;
mod components;
mod config;
mod export;
mod logging;
mod models;
mod poller;
mod roster;
mod tui;

use anyhow::Result;
use app::{App, Backend};
use config::Config;
use crossterm::terminal::{self, LeaveAlternateScreen};
use logging::LoggingConfig;
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io;
use tracing::error;
use tui::Tui;

fn main() -> Result<()> {
    let config = Config::from_env()?;
    let _log_guard = logging::init(&LoggingConfig::new(&config.log_dir))?;
    let backend = Backend::new(config)?;

    let _guard = CleanupGuard;

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut tui = Tui::new(terminal);
    tui.init()?;

    let mut app = App::new(backend);
    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        error!(error = format!("{e:#}"), "console stopped");
        eprintln!("Application Error: {e:#}");
    }
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
    }
}
