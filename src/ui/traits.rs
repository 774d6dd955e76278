//! Core traits shared by the UI panels.

use crate::core::session::Session;
use crate::workers::app::{App, Mode};
use crossterm::event::KeyCode;
use ratatui::{layout::Rect, Frame};

/// A renderable region of the interface.
pub trait Component {
    fn render(&mut self, f: &mut Frame, app: &App, area: Rect);
}

/// A region that consumes keyboard input while its mode is active.
pub trait Handler {
    fn handle_key(&mut self, app: &mut App, session: &Session, key: KeyCode) -> Action;
}

/// What a key press asked the executer to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SwitchMode(Mode),
    None,
}
