//! Terminal setup and the input/tick event source.

use anyhow::Result;
use crossterm::{
    event,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, time::Duration};

/// An event delivered to the application loop.
#[derive(Debug, Clone)]
pub enum Event {
    Input(event::Event),
    /// No input arrived within one tick; used for timers and polling.
    Tick,
}

pub type Frame<'a> = ratatui::Frame<'a>;

/// Smallest terminal the schedule screen lays out cleanly in.
pub const MIN_WIDTH: u16 = 110;
pub const MIN_HEIGHT: u16 = 32;

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    tick_rate: Duration,
}

impl Tui {
    pub fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Self {
        Self {
            terminal,
            tick_rate: Duration::from_millis(100),
        }
    }

    pub fn init(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.terminal.show_cursor()?;
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stdout(), LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Waits up to one tick for input.
    pub fn next_event(&self) -> Result<Event> {
        if event::poll(self.tick_rate)? {
            return Ok(Event::Input(event::read()?));
        }
        Ok(Event::Tick)
    }
}
