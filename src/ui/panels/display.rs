//! Display panel: renders the server-driven page shell — menu bar, pushed
//! body, message banner — and turns key presses into the protocol's
//! `menuClick` / `inputChange` messages.

use crate::core::page::SlotKind;
use crate::core::protocol::ClientMessage;
use crate::core::session::Session;
use crate::ui::traits::{Action, Component, Handler};
use crate::workers::app::{App, DisplayFocus, Mode};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tracing::info;

/// Where a redirect or a menu link points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RedirectTarget {
    /// The device's file-manager page: handled locally by the Files panel.
    FileManager,
    /// Anything else: surfaced, not followed.
    Other,
}

/// The terminal client cannot load arbitrary device pages; the only link it
/// follows itself is the file manager.
pub fn redirect_target(url: &str) -> RedirectTarget {
    let lower = url.to_ascii_lowercase();
    if lower.contains("fsm") || lower.contains("filemanager") {
        RedirectTarget::FileManager
    } else {
        RedirectTarget::Other
    }
}

pub struct DisplayPanel;

impl Default for DisplayPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPanel {
    pub fn new() -> Self {
        Self
    }

    fn render_menus(&self, f: &mut Frame, app: &App, area: Rect) {
        let menus = app.view.menus();
        let focused = app.focus == DisplayFocus::Menus;
        let (sel_menu, sel_item) = app.menu_cursor;

        let mut name_spans: Vec<Span> = Vec::new();
        for (m, menu) in menus.iter().enumerate() {
            if m > 0 {
                name_spans.push(Span::raw("  "));
            }
            let style = if m == sel_menu {
                Style::default()
                    .fg(Color::Black)
                    .bg(if focused { Color::Cyan } else { Color::DarkGray })
            } else {
                Style::default()
            };
            name_spans.push(Span::styled(format!(" {} ", menu.name), style));
        }
        if menus.is_empty() {
            name_spans.push(Span::styled(
                " (no menus pushed yet) ",
                Style::default().fg(Color::DarkGray),
            ));
        }

        let mut item_spans: Vec<Span> = Vec::new();
        if let Some(menu) = menus.get(sel_menu) {
            for (i, item) in menu.items.iter().enumerate() {
                if i > 0 {
                    item_spans.push(Span::raw("  "));
                }
                let mut style = if item.disabled {
                    Style::default().fg(Color::DarkGray)
                } else if item.url.is_some() {
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED)
                } else {
                    Style::default()
                };
                if focused && i == sel_item {
                    style = style.bg(Color::White).fg(Color::Black);
                }
                let marker = if item.disabled { "✗ " } else { "" };
                item_spans.push(Span::styled(format!("{marker}{}", item.name), style));
            }
        }

        let widget = Paragraph::new(vec![Line::from(name_spans), Line::from(item_spans)]).block(
            Block::default()
                .title(" Menus ")
                .borders(Borders::ALL)
                .border_style(if focused {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                }),
        );
        f.render_widget(widget, area);
    }

    fn render_body(&self, f: &mut Frame, app: &App, area: Rect) {
        let focused = app.focus == DisplayFocus::Body;
        let title = match &app.active_page {
            Some(name) => format!(" {name} "),
            None => " Page ".to_string(),
        };

        let mut lines: Vec<Line> = Vec::new();
        if !app.view.is_visible() {
            lines.push(Line::from(Span::styled(
                "(page hidden)",
                Style::default().fg(Color::DarkGray),
            )));
        } else {
            let input_indices = app.view.body().input_indices();
            let mut current: Vec<Span> = Vec::new();
            for (idx, slot) in app.view.body().slots().iter().enumerate() {
                if slot.line_break && !current.is_empty() {
                    lines.push(Line::from(std::mem::take(&mut current)));
                }
                match &slot.kind {
                    SlotKind::Text { content } => {
                        let style = if slot.id.is_some() {
                            Style::default().fg(Color::Cyan)
                        } else {
                            Style::default()
                        };
                        current.push(Span::styled(content.clone(), style));
                        current.push(Span::raw(" "));
                    }
                    SlotKind::Input { value, .. } => {
                        let on_cursor =
                            focused && input_indices.get(app.slot_cursor) == Some(&idx);
                        let mut style = Style::default().fg(Color::Yellow);
                        if on_cursor {
                            style = style.bg(Color::White).fg(Color::Black);
                        }
                        let caret = if on_cursor && app.editing { "▏" } else { "" };
                        current.push(Span::styled(format!("[{value}{caret}]"), style));
                        current.push(Span::raw(" "));
                    }
                }
            }
            if !current.is_empty() {
                lines.push(Line::from(current));
            }
            if lines.is_empty() {
                lines.push(Line::from(Span::styled(
                    "(nothing pushed yet)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }

        let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(if focused {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                }),
        );
        f.render_widget(widget, area);
    }

    fn render_banner(&self, f: &mut Frame, app: &App, area: Rect) {
        let line = match app.view.banner() {
            Some(banner) => Line::from(Span::styled(
                format!(" {} ", banner.text),
                Style::default().fg(if banner.is_error {
                    Color::Red
                } else {
                    Color::Green
                }),
            )),
            None => Line::default(),
        };
        f.render_widget(Paragraph::new(line), area);
    }

    /// Activate the previous/next cached page relative to the one shown.
    fn cycle_page(&self, app: &mut App, step: isize) {
        let names: Vec<String> = app
            .view
            .page_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return;
        }
        let current = app
            .active_page
            .as_ref()
            .and_then(|name| names.iter().position(|n| n == name))
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(names.len() as isize) as usize;
        let name = &names[next];
        if app.view.activate_page(name) {
            app.active_page = Some(name.clone());
            app.clamp_slot_cursor();
        }
    }

    /// The id of the input slot under the cursor.
    fn focused_input_id(&self, app: &App) -> Option<String> {
        let indices = app.view.body().input_indices();
        let idx = *indices.get(app.slot_cursor)?;
        app.view.body().slots().get(idx)?.id.clone()
    }

    fn focused_input_value(&self, app: &App) -> String {
        self.focused_input_id(app)
            .and_then(|id| {
                app.view.body().find(&id).map(|slot| match &slot.kind {
                    SlotKind::Input { value, .. } => value.clone(),
                    SlotKind::Text { content } => content.clone(),
                })
            })
            .unwrap_or_default()
    }

    /// Store an edited value and forward whatever the bindings produce.
    fn push_edit(&self, app: &mut App, session: &Session, value: String) {
        if let Some(id) = self.focused_input_id(app) {
            for msg in app.view.input_event(&id, &value) {
                session.send(msg);
            }
        }
    }

    fn activate_menu_item(&self, app: &mut App, session: &Session) -> Action {
        let (m, i) = app.menu_cursor;
        let Some(item) = app
            .view
            .menus()
            .get(m)
            .and_then(|menu| menu.items.get(i))
            .cloned()
        else {
            return Action::None;
        };
        // Disabled items are inert, link or not.
        if item.disabled {
            return Action::None;
        }
        match item.url {
            Some(url) => match redirect_target(&url) {
                RedirectTarget::FileManager => Action::SwitchMode(Mode::Files),
                RedirectTarget::Other => {
                    info!(%url, "menu link outside the client");
                    app.status.info(format!("link: {url}"));
                    Action::None
                }
            },
            None => {
                let menu_name = app.view.menus()[m].name.clone();
                session.send(ClientMessage::MenuClick {
                    menu: menu_name,
                    item: item.name,
                });
                Action::None
            }
        }
    }
}

impl Component for DisplayPanel {
    fn render(&mut self, f: &mut Frame, app: &App, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // menus
                Constraint::Min(1),    // body
                Constraint::Length(1), // banner
            ])
            .split(area);
        self.render_menus(f, app, chunks[0]);
        self.render_body(f, app, chunks[1]);
        self.render_banner(f, app, chunks[2]);
    }
}

impl Handler for DisplayPanel {
    fn handle_key(&mut self, app: &mut App, session: &Session, key: KeyCode) -> Action {
        // Editing an input slot swallows everything except its own exits.
        if app.editing {
            match key {
                KeyCode::Esc | KeyCode::Enter => app.editing = false,
                KeyCode::Backspace => {
                    let mut value = self.focused_input_value(app);
                    value.pop();
                    self.push_edit(app, session, value);
                }
                KeyCode::Char(c) => {
                    let mut value = self.focused_input_value(app);
                    value.push(c);
                    self.push_edit(app, session, value);
                }
                _ => {}
            }
            return Action::None;
        }

        match key {
            KeyCode::Tab => {
                app.focus = match app.focus {
                    DisplayFocus::Menus if !app.view.body().input_indices().is_empty() => {
                        DisplayFocus::Body
                    }
                    _ => DisplayFocus::Menus,
                };
                Action::None
            }
            KeyCode::Left if app.focus == DisplayFocus::Menus => {
                if app.menu_cursor.0 > 0 {
                    app.menu_cursor = (app.menu_cursor.0 - 1, 0);
                }
                Action::None
            }
            KeyCode::Right if app.focus == DisplayFocus::Menus => {
                let menus = app.view.menus().len();
                if menus > 0 && app.menu_cursor.0 + 1 < menus {
                    app.menu_cursor = (app.menu_cursor.0 + 1, 0);
                }
                Action::None
            }
            KeyCode::Up => {
                match app.focus {
                    DisplayFocus::Menus => {
                        if app.menu_cursor.1 > 0 {
                            app.menu_cursor.1 -= 1;
                        }
                    }
                    DisplayFocus::Body => {
                        app.slot_cursor = app.slot_cursor.saturating_sub(1);
                    }
                }
                Action::None
            }
            KeyCode::Down => {
                match app.focus {
                    DisplayFocus::Menus => {
                        let items = app
                            .view
                            .menus()
                            .get(app.menu_cursor.0)
                            .map(|m| m.items.len())
                            .unwrap_or(0);
                        if items > 0 && app.menu_cursor.1 + 1 < items {
                            app.menu_cursor.1 += 1;
                        }
                    }
                    DisplayFocus::Body => {
                        let inputs = app.view.body().input_indices().len();
                        if inputs > 0 && app.slot_cursor + 1 < inputs {
                            app.slot_cursor += 1;
                        }
                    }
                }
                Action::None
            }
            KeyCode::Enter => match app.focus {
                DisplayFocus::Menus => self.activate_menu_item(app, session),
                DisplayFocus::Body => {
                    if !app.view.body().input_indices().is_empty() {
                        app.editing = true;
                    }
                    Action::None
                }
            },
            KeyCode::Char('[') => {
                self.cycle_page(app, -1);
                Action::None
            }
            KeyCode::Char(']') => {
                self.cycle_page(app, 1);
                Action::None
            }
            _ => Action::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_manager_links_are_followed_locally() {
        assert_eq!(redirect_target("/fsm"), RedirectTarget::FileManager);
        assert_eq!(redirect_target("/FSmanager"), RedirectTarget::FileManager);
        assert_eq!(
            redirect_target("http://dev/filemanager.html"),
            RedirectTarget::FileManager
        );
    }

    #[test]
    fn other_links_are_only_surfaced() {
        assert_eq!(redirect_target("/settings"), RedirectTarget::Other);
        assert_eq!(redirect_target("http://dev/"), RedirectTarget::Other);
    }
}
