//! Files panel: renders the current folder listing and drives the
//! file-manager operations.
//!
//! Rendering rules carried over from the device's own pages: folders before
//! files, a ".." row outside the root, the folder-creation affordance at
//! the root only, and a read-only entry always shows `Locked` in place of
//! its delete action — no state overrides that.

use crate::core::listing::FileEntry;
use crate::core::nav;
use crate::core::session::Session;
use crate::ui::helpers::{format_size, truncate_name};
use crate::ui::traits::{Action, Component, Handler};
use crate::workers::app::{App, Confirm, Mode, PendingAction, Prompt, PromptKind, SelectedRow};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Owned description of a listing row, detached from the listing borrow.
enum RowSummary {
    Parent,
    Folder { name: String, read_only: bool },
    File { name: String, read_only: bool },
}

pub struct FilesPanel;

impl Default for FilesPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl FilesPanel {
    pub fn new() -> Self {
        Self
    }

    fn entry_row(entry: &FileEntry, selected: bool) -> ListItem<'static> {
        let style = if selected {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let icon = if entry.is_dir { "📁" } else { "📄" };
        let size = if entry.is_dir {
            format!("{} items", entry.size)
        } else {
            format_size(entry.size)
        };
        let action = if entry.is_read_only() {
            Span::styled(" Locked ", Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(" Delete ", Style::default().fg(Color::Red))
        };

        ListItem::new(Line::from(vec![
            Span::styled(format!("{icon} "), style),
            Span::styled(format!("{:<32}", truncate_name(&entry.name, 32)), style),
            Span::styled(format!("{size:>12}  "), Style::default().fg(Color::DarkGray)),
            action,
        ]))
    }

    fn render_header(&self, f: &mut Frame, app: &App, area: Rect) {
        let space = match app.space {
            Some(info) => format!(
                "{} used of {} ({} available)",
                format_size(info.used),
                format_size(info.total),
                format_size(info.available())
            ),
            None => String::new(),
        };
        let widget = Paragraph::new(vec![
            Line::from(Span::styled(
                app.nav.current().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(space, Style::default().fg(Color::DarkGray))),
        ])
        .block(Block::default().title(" Folder ").borders(Borders::ALL));
        f.render_widget(widget, area);
    }

    fn render_list(&self, f: &mut Frame, app: &App, area: Rect) {
        let mut items: Vec<ListItem> = Vec::new();

        match &app.listing {
            None => {
                let text = if app.listing_pending {
                    "loading…"
                } else {
                    "no listing yet"
                };
                items.push(ListItem::new(Span::styled(
                    text,
                    Style::default().fg(Color::DarkGray),
                )));
            }
            Some(listing) => {
                let mut row = 0usize;
                if !app.nav.at_root() {
                    let style = if app.selected == row {
                        Style::default().fg(Color::Black).bg(Color::White)
                    } else {
                        Style::default()
                    };
                    items.push(ListItem::new(Span::styled("↩ ..", style)));
                    row += 1;
                }
                for entry in listing.folders.iter().chain(listing.files.iter()) {
                    items.push(Self::entry_row(entry, app.selected == row));
                    row += 1;
                }
                if listing.is_empty() {
                    items.push(ListItem::new(Span::styled(
                        "(empty folder)",
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }
        }

        let widget = List::new(items).block(
            Block::default()
                .title(" Files ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        f.render_widget(widget, area);
    }

    fn render_footer(&self, f: &mut Frame, app: &App, area: Rect) {
        // Folder creation is a root-only affordance.
        let hint = if app.nav.at_root() {
            " enter: open  bksp: up  d: download  x: delete  n: new folder  u: upload  r: refresh  R: reboot"
        } else {
            " enter: open  bksp: up  d: download  x: delete  u: upload  r: refresh  R: reboot"
        };
        f.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
            area,
        );
    }

    /// Client-initiated navigation: arm the stale-echo suppression, then
    /// re-read.
    fn navigate(&self, app: &mut App, session: &Session) {
        app.selected = 0;
        app.listing_pending = true;
        app.nav.arm_ignore();
        session.fetch_listing(app.nav.current());
    }

    fn open_selected(&self, app: &mut App, session: &Session) {
        match Self::selected_summary(app) {
            Some(RowSummary::Parent) => {
                app.nav.up();
                self.navigate(app, session);
            }
            Some(RowSummary::Folder { name, .. }) => {
                app.nav.enter(&name);
                self.navigate(app, session);
            }
            Some(RowSummary::File { name, .. }) => {
                self.download_entry(app, session, &name);
            }
            None => {}
        }
    }

    /// Owned snapshot of the row under the cursor, so handlers can mutate
    /// `app` afterwards.
    fn selected_summary(app: &App) -> Option<RowSummary> {
        match app.selected_row()? {
            SelectedRow::Parent => Some(RowSummary::Parent),
            SelectedRow::Entry(entry) if entry.is_dir => Some(RowSummary::Folder {
                name: entry.name.clone(),
                read_only: entry.is_read_only(),
            }),
            SelectedRow::Entry(entry) => Some(RowSummary::File {
                name: entry.name.clone(),
                read_only: entry.is_read_only(),
            }),
        }
    }

    fn download_entry(&self, app: &mut App, session: &Session, name: &str) {
        let path = nav::join(app.nav.current(), name);
        app.status.info(format!("downloading {name}…"));
        session.download(path, name.to_string());
    }

    fn delete_selected(&self, app: &mut App) {
        let (name, is_dir, read_only) = match Self::selected_summary(app) {
            Some(RowSummary::Folder { name, read_only }) => (name, true, read_only),
            Some(RowSummary::File { name, read_only }) => (name, false, read_only),
            _ => return,
        };
        // A locked entry has no delete action to invoke.
        if read_only {
            app.status.error(format!("{name} is locked"));
            return;
        }
        let path = nav::join(app.nav.current(), &name);
        let (question, action) = if is_dir {
            (
                format!("Delete folder \"{name}\"?"),
                PendingAction::DeleteFolder(path),
            )
        } else {
            (format!("Delete \"{name}\"?"), PendingAction::DeleteFile(path))
        };
        app.confirm = Some(Confirm { question, action });
    }
}

impl Component for FilesPanel {
    fn render(&mut self, f: &mut Frame, app: &App, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // folder + space info
                Constraint::Min(1),    // listing
                Constraint::Length(1), // key hints
            ])
            .split(area);
        self.render_header(f, app, chunks[0]);
        self.render_list(f, app, chunks[1]);
        self.render_footer(f, app, chunks[2]);
    }
}

impl Handler for FilesPanel {
    fn handle_key(&mut self, app: &mut App, session: &Session, key: KeyCode) -> Action {
        match key {
            KeyCode::Esc => Action::SwitchMode(Mode::Display),
            KeyCode::Up => {
                app.selected = app.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Down => {
                if app.selected + 1 < app.row_count() {
                    app.selected += 1;
                }
                Action::None
            }
            KeyCode::Enter => {
                self.open_selected(app, session);
                Action::None
            }
            KeyCode::Backspace => {
                if !app.nav.at_root() {
                    app.nav.up();
                    self.navigate(app, session);
                }
                Action::None
            }
            KeyCode::Char('d') => {
                if let Some(RowSummary::File { name, .. }) = Self::selected_summary(app) {
                    self.download_entry(app, session, &name);
                }
                Action::None
            }
            KeyCode::Char('x') => {
                self.delete_selected(app);
                Action::None
            }
            KeyCode::Char('n') => {
                if app.nav.at_root() {
                    app.prompt = Some(Prompt {
                        title: "New folder name".to_string(),
                        value: String::new(),
                        kind: PromptKind::CreateFolder,
                    });
                } else {
                    app.status.error("folder creation is root-only");
                }
                Action::None
            }
            KeyCode::Char('u') => {
                app.prompt = Some(Prompt {
                    title: format!("Upload file to {}", app.nav.current()),
                    value: String::new(),
                    kind: PromptKind::UploadPath,
                });
                Action::None
            }
            KeyCode::Char('r') => {
                // Plain re-read: not client-initiated navigation, so the
                // server echo stays welcome.
                app.listing_pending = true;
                session.fetch_listing(app.nav.current());
                Action::None
            }
            KeyCode::Char('R') => {
                app.confirm = Some(Confirm {
                    question: "Reboot the device?".to_string(),
                    action: PendingAction::Reboot,
                });
                Action::None
            }
            _ => Action::None,
        }
    }
}
