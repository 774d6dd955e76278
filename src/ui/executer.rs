//! UI executer: the single sequential control flow of the client.
//!
//! Everything asynchronous — socket messages, HTTP outcomes, timers, key
//! presses — funnels into this loop and is applied one at a time, in
//! arrival order. Panels render from [`App`] and translate keys; spawned
//! operations report back through the event channel; nothing else ever
//! mutates the state.

use crate::core::channel::{self, ChannelEvent, LinkState};
use crate::core::fsm::{decide_after_list_error, FsmClient, ListError, ListFallback};
use crate::core::listing::Listing;
use crate::core::protocol::{FeatureTrigger, ServerMessage, Verdict};
use crate::core::session::{AppEvent, MutationKind, Session};
use crate::ui::panels::{DisplayPanel, FilesPanel, LogsPanel};
use crate::ui::popups::{render_confirm, render_prompt};
use crate::ui::traits::{Action, Component, Handler};
use crate::utils::log_buffer::LogBuffer;
use crate::utils::sos::SignalOfStop;
use crate::workers::app::{App, Mode, PendingAction, PromptKind, SpaceInfo};
use crate::workers::args::Args;
use crate::core::config::KEY_POLL_INTERVAL;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::io::stdout;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct UiExecuter {
    app: App,
    display_panel: DisplayPanel,
    files_panel: FilesPanel,
    logs_panel: LogsPanel,
}

pub async fn run(args: Args, sos: SignalOfStop, log_buffer: LogBuffer) -> anyhow::Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let channel = channel::spawn(args.ws_url(), event_tx.clone(), sos.clone());
    let fsm = FsmClient::new(&args.http_base());
    let session = Session::new(channel, fsm, event_tx, args.download_dir());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Drain any queued terminal events
    while event::poll(std::time::Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    let mut executer = UiExecuter::new();
    // Initial listing of the root, before the first push arrives.
    executer.app.listing_pending = true;
    session.fetch_listing(executer.app.nav.current());

    let result = executer
        .main_loop(&mut terminal, &session, &mut event_rx, &sos, &log_buffer)
        .await;

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    sos.cancel();
    result
}

impl UiExecuter {
    fn new() -> Self {
        Self {
            app: App::new(),
            display_panel: DisplayPanel::new(),
            files_panel: FilesPanel::new(),
            logs_panel: LogsPanel::new(),
        }
    }

    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
        session: &Session,
        event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
        sos: &SignalOfStop,
        log_buffer: &LogBuffer,
    ) -> anyhow::Result<()> {
        loop {
            terminal.draw(|f| self.render(f, log_buffer))?;

            if event::poll(KEY_POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(session, key.code) {
                        break;
                    }
                }
            }

            // Apply completions in arrival order, one at a time.
            while let Ok(ev) = event_rx.try_recv() {
                self.handle_event(session, ev);
            }

            if sos.cancelled() {
                break;
            }
        }
        Ok(())
    }

    // ── Rendering ────────────────────────────────────────────────────────

    fn render(&mut self, f: &mut Frame, log_buffer: &LogBuffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(1),    // panel
                Constraint::Length(1), // status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);

        match self.app.mode {
            Mode::Display => self.display_panel.render(f, &self.app, chunks[1]),
            Mode::Files => self.files_panel.render(f, &self.app, chunks[1]),
            Mode::Logs => self
                .logs_panel
                .render_with_buffer(f, &self.app, log_buffer, chunks[1]),
        }

        self.render_status_bar(f, chunks[2]);

        let area = f.area();
        if let Some(prompt) = &self.app.prompt {
            render_prompt(f, prompt, area);
        } else if let Some(confirm) = &self.app.confirm {
            render_confirm(f, confirm, area);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let link_color = match self.app.link {
            LinkState::Open => Color::Green,
            LinkState::Connecting => Color::Yellow,
            LinkState::Closed => Color::Red,
        };
        let mut spans = vec![
            Span::styled(" fsman ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(format!(" {} | ", self.app.mode.label())),
            Span::styled(self.app.link.label(), Style::default().fg(link_color)),
        ];
        if let Some(datetime) = self.app.view.shell_text("datetime") {
            if !datetime.is_empty() {
                spans.push(Span::raw(" | "));
                spans.push(Span::styled(
                    datetime.to_string(),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let line = match self.app.status.current() {
            Some(msg) => Line::from(Span::styled(
                format!(" {} ", msg.text),
                Style::default().fg(msg.level.color()),
            )),
            None => Line::from(Span::styled(
                " F1 display  F2 files  F3 logs  q quit",
                Style::default().fg(Color::DarkGray),
            )),
        };
        f.render_widget(Paragraph::new(line), area);
    }

    // ── Keyboard ─────────────────────────────────────────────────────────

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, session: &Session, key: KeyCode) -> bool {
        // A visible popup owns the keyboard.
        if self.app.prompt.is_some() {
            self.handle_prompt_key(session, key);
            return false;
        }
        if self.app.confirm.is_some() {
            self.handle_confirm_key(session, key);
            return false;
        }

        if !self.app.editing {
            match key {
                KeyCode::Char('q') => return true,
                KeyCode::F(1) => {
                    self.switch_mode(session, Mode::Display);
                    return false;
                }
                KeyCode::F(2) => {
                    self.switch_mode(session, Mode::Files);
                    return false;
                }
                KeyCode::F(3) => {
                    self.switch_mode(session, Mode::Logs);
                    return false;
                }
                _ => {}
            }
        }

        let action = match self.app.mode {
            Mode::Display => self.display_panel.handle_key(&mut self.app, session, key),
            Mode::Files => self.files_panel.handle_key(&mut self.app, session, key),
            Mode::Logs => self.logs_panel.handle_key(&mut self.app, session, key),
        };
        if let Action::SwitchMode(mode) = action {
            self.switch_mode(session, mode);
        }
        false
    }

    fn switch_mode(&mut self, session: &Session, mode: Mode) {
        self.app.mode = mode;
        if mode == Mode::Files && self.app.listing.is_none() && !self.app.listing_pending {
            self.app.listing_pending = true;
            session.fetch_listing(self.app.nav.current());
        }
    }

    fn handle_prompt_key(&mut self, session: &Session, key: KeyCode) {
        match key {
            KeyCode::Esc => self.app.prompt = None,
            KeyCode::Backspace => {
                if let Some(prompt) = &mut self.app.prompt {
                    prompt.value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(prompt) = &mut self.app.prompt {
                    prompt.value.push(c);
                }
            }
            KeyCode::Enter => {
                let Some(prompt) = self.app.prompt.take() else {
                    return;
                };
                match prompt.kind {
                    PromptKind::CreateFolder => session.create_folder(&prompt.value),
                    PromptKind::UploadPath => {
                        let path = prompt.value.trim().to_string();
                        if path.is_empty() {
                            // Caught before any request goes out.
                            self.app.status.error("please select a file");
                        } else {
                            self.app.status.info("uploading…");
                            session
                                .upload(self.app.nav.current().to_string(), PathBuf::from(path));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, session: &Session, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let Some(confirm) = self.app.confirm.take() else {
                    return;
                };
                match confirm.action {
                    PendingAction::DeleteFile(path) => session.delete_file(path),
                    PendingAction::DeleteFolder(path) => session.delete_folder_guarded(path),
                    PendingAction::Reboot => session.reboot(),
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.app.confirm = None;
            }
            _ => {}
        }
    }

    // ── Events ───────────────────────────────────────────────────────────

    fn handle_event(&mut self, session: &Session, event: AppEvent) {
        match event {
            AppEvent::Link(link) => self.handle_link_event(session, link),
            AppEvent::Listing { folder, outcome } => {
                self.handle_listing(session, &folder, outcome)
            }
            AppEvent::Mutation { kind, outcome } => self.handle_mutation(session, kind, outcome),
            AppEvent::Downloaded { name, outcome } => match outcome {
                Ok(dest) => self
                    .app
                    .status
                    .success(format!("saved {name} to {}", dest.display())),
                Err(err) => self.app.status.error(err),
            },
        }
    }

    fn handle_link_event(&mut self, session: &Session, link: ChannelEvent) {
        match link {
            ChannelEvent::Connecting => self.app.link = LinkState::Connecting,
            ChannelEvent::Opened => self.app.link = LinkState::Open,
            ChannelEvent::Closed => self.app.link = LinkState::Closed,
            ChannelEvent::Inbound(msg) => self.route_message(session, msg),
        }
    }

    /// Route one inbound message: the generic view verdict first, then the
    /// file-manager trigger. Both layers observe every message; only a
    /// redirect terminates processing early.
    fn route_message(&mut self, session: &Session, msg: ServerMessage) {
        match msg.verdict() {
            Verdict::Redirect(url) => {
                self.handle_redirect(session, url);
                return;
            }
            Verdict::Partial { target, content } => {
                self.app.view.apply_partial(target, content);
            }
            Verdict::Full => {
                self.app.view.apply_full(&msg);
                if msg.page_name.is_some() {
                    self.app.active_page = msg.page_name.clone();
                }
                self.app.clamp_menu_cursor();
                self.app.clamp_slot_cursor();
            }
        }

        match msg.feature_trigger() {
            Some(FeatureTrigger::FileUpload) => {
                self.app.mode = Mode::Files;
                self.app.prompt = Some(crate::workers::app::Prompt {
                    title: format!("Upload file to {}", self.app.nav.current()),
                    value: String::new(),
                    kind: PromptKind::UploadPath,
                });
            }
            Some(FeatureTrigger::CreateFolder) => {
                if self.app.nav.at_root() {
                    self.app.mode = Mode::Files;
                    self.app.prompt = Some(crate::workers::app::Prompt {
                        title: "New folder name".to_string(),
                        value: String::new(),
                        kind: PromptKind::CreateFolder,
                    });
                } else {
                    self.app.status.error("folder creation is root-only");
                }
            }
            Some(FeatureTrigger::Reboot) => {
                self.app.confirm = Some(crate::workers::app::Confirm {
                    question: "Reboot the device?".to_string(),
                    action: PendingAction::Reboot,
                });
            }
            Some(FeatureTrigger::FileList) => {
                self.app.listing_pending = true;
                session.fetch_listing(self.app.nav.current());
            }
            None => {}
        }
    }

    fn handle_redirect(&mut self, session: &Session, url: &str) {
        use crate::ui::panels::display::{redirect_target, RedirectTarget};
        info!(%url, "server redirect");
        match redirect_target(url) {
            RedirectTarget::FileManager => {
                self.switch_mode(session, Mode::Files);
            }
            RedirectTarget::Other => {
                self.app.status.info(format!("device redirect: {url}"));
            }
        }
    }

    fn handle_listing(
        &mut self,
        session: &Session,
        folder: &str,
        outcome: Result<crate::core::listing::FileListing, ListError>,
    ) {
        match outcome {
            Ok(resp) => {
                // The echoed folder is adopted only when no client-initiated
                // navigation armed the suppression flag in the meantime.
                self.app.nav.adopt_server_folder(resp.current_folder.as_deref());
                let space = SpaceInfo {
                    used: resp.used_space,
                    total: resp.total_space,
                };
                self.app.set_listing(Listing::build(&resp.files), space);
            }
            Err(err) => {
                debug!(folder, %err, "listing failed");
                // The flag is cleared by the very next listing response,
                // error or not.
                self.app.nav.adopt_server_folder(None);
                self.app.listing_pending = false;

                if err == ListError::EmptyFolder {
                    // Empty is not missing: stay put, show the empty folder.
                    self.app.listing = Some(Listing::default());
                    self.app.clamp_selection();
                    return;
                }

                self.app.status.error(format!("cannot list {folder}: {err}"));
                match decide_after_list_error(&err, self.app.nav.current()) {
                    ListFallback::NavigateTo(parent) => {
                        self.app.nav.set(&parent);
                        self.app.selected = 0;
                        self.app.listing_pending = true;
                        self.app.nav.arm_ignore();
                        session.fetch_listing(self.app.nav.current());
                    }
                    // Generic failure: the displayed listing stays as it was.
                    ListFallback::Stay => {}
                }
            }
        }
    }

    fn handle_mutation(
        &mut self,
        session: &Session,
        kind: MutationKind,
        outcome: Result<String, String>,
    ) {
        match outcome {
            Ok(text) => {
                let note = text.trim();
                if kind == MutationKind::Reboot {
                    self.app.status.info("device is rebooting…");
                } else if note.is_empty() {
                    self.app.status.success(format!("{} done", kind.label()));
                } else {
                    self.app.status.success(note.to_string());
                }
                // Exactly one refresh per successful mutation, armed so the
                // response of the request that just completed cannot drag
                // the folder back.
                self.app.listing_pending = true;
                self.app.nav.arm_ignore();
                session.fetch_listing(self.app.nav.current());
            }
            Err(err) => {
                // Surface and refresh nothing.
                self.app.status.error(format!("{}: {err}", kind.label()));
            }
        }
    }
}
