//! Popup rendering: the line-input prompt and the yes/no confirmation.
//!
//! Key handling for popups lives in the executer, before any panel sees the
//! key — a visible popup owns the keyboard.

use crate::ui::helpers::centered_rect;
use crate::workers::app::{Confirm, Prompt};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render_prompt(f: &mut Frame, prompt: &Prompt, area: Rect) {
    let rect = centered_rect(50, 5, area);
    f.render_widget(Clear, rect);

    let input_line = Line::from(vec![
        Span::raw(" "),
        Span::styled(&prompt.value, Style::default().add_modifier(Modifier::BOLD)),
        Span::styled("▏", Style::default().fg(Color::Cyan)),
    ]);
    let hint = Line::from(Span::styled(
        " Enter: confirm   Esc: cancel",
        Style::default().fg(Color::DarkGray),
    ));

    let widget = Paragraph::new(vec![input_line, Line::default(), hint]).block(
        Block::default()
            .title(format!(" {} ", prompt.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(widget, rect);
}

pub fn render_confirm(f: &mut Frame, confirm: &Confirm, area: Rect) {
    let rect = centered_rect(54, 5, area);
    f.render_widget(Clear, rect);

    let question = Line::from(Span::raw(format!(" {}", confirm.question)));
    let hint = Line::from(Span::styled(
        " y: yes   n/Esc: no",
        Style::default().fg(Color::DarkGray),
    ));

    let widget = Paragraph::new(vec![question, Line::default(), hint]).block(
        Block::default()
            .title(" Confirm ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(widget, rect);
}
