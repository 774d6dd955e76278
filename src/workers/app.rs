//! Application state: everything the panels render and the handlers mutate.
//!
//! One instance lives on the UI loop; spawned operations never touch it
//! directly — their outcomes come back as events and are applied here, one
//! at a time.

use crate::core::channel::LinkState;
use crate::core::listing::{FileEntry, Listing};
use crate::core::nav::NavState;
use crate::core::view::ViewModel;
use crate::ui::status::StatusLine;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Mode {
    Display,
    Files,
    Logs,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Display => "Display",
            Mode::Files => "Files",
            Mode::Logs => "Logs",
        }
    }
}

/// Which half of the Display panel has the cursor.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DisplayFocus {
    Menus,
    Body,
}

/// Line-input popup (folder name, upload path).
#[derive(Debug, Clone)]
pub struct Prompt {
    pub title: String,
    pub value: String,
    pub kind: PromptKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptKind {
    CreateFolder,
    UploadPath,
}

/// Yes/no popup guarding destructive operations.
#[derive(Debug, Clone)]
pub struct Confirm {
    pub question: String,
    pub action: PendingAction,
}

/// What a confirmed popup executes.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Full path of the file to delete.
    DeleteFile(String),
    /// Full path of the folder to delete (guarded flow).
    DeleteFolder(String),
    Reboot,
}

/// Space usage reported alongside a listing.
#[derive(Debug, Clone, Copy)]
pub struct SpaceInfo {
    pub used: u64,
    pub total: u64,
}

impl SpaceInfo {
    pub fn available(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }
}

/// A row of the Files panel under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedRow<'a> {
    /// The ".." navigate-up row shown outside the root.
    Parent,
    Entry(&'a FileEntry),
}

pub struct App {
    pub mode: Mode,
    pub link: LinkState,
    pub status: StatusLine,

    // Display
    pub view: ViewModel,
    pub focus: DisplayFocus,
    /// (menu, item) cursor inside the menu bar.
    pub menu_cursor: (usize, usize),
    /// Cursor over the body's input slots.
    pub slot_cursor: usize,
    /// Whether the focused input slot is being edited.
    pub editing: bool,
    /// Name of the page currently in the body, when known. Drives the
    /// cached-page switcher.
    pub active_page: Option<String>,

    // Files
    pub nav: NavState,
    pub listing: Option<Listing>,
    pub space: Option<SpaceInfo>,
    pub selected: usize,
    pub listing_pending: bool,

    // Popups
    pub prompt: Option<Prompt>,
    pub confirm: Option<Confirm>,

    // Logs
    pub log_scroll: usize,
}

impl App {
    pub fn new() -> Self {
        Self {
            mode: Mode::Display,
            link: LinkState::Connecting,
            status: StatusLine::new(),
            view: ViewModel::new(),
            focus: DisplayFocus::Menus,
            menu_cursor: (0, 0),
            slot_cursor: 0,
            editing: false,
            active_page: None,
            nav: NavState::new(),
            listing: None,
            space: None,
            selected: 0,
            listing_pending: false,
            prompt: None,
            confirm: None,
            log_scroll: 0,
        }
    }

    /// Number of selectable rows in the Files panel (".." included outside
    /// the root).
    pub fn row_count(&self) -> usize {
        let entries = self.listing.as_ref().map(Listing::len).unwrap_or(0);
        if self.nav.at_root() {
            entries
        } else {
            entries + 1
        }
    }

    /// Row currently under the cursor.
    pub fn selected_row(&self) -> Option<SelectedRow<'_>> {
        let listing = self.listing.as_ref()?;
        if self.nav.at_root() {
            listing.get(self.selected).map(SelectedRow::Entry)
        } else if self.selected == 0 {
            Some(SelectedRow::Parent)
        } else {
            listing.get(self.selected - 1).map(SelectedRow::Entry)
        }
    }

    /// Install a freshly fetched listing and keep the cursor in range.
    pub fn set_listing(&mut self, listing: Listing, space: SpaceInfo) {
        self.listing = Some(listing);
        self.space = Some(space);
        self.listing_pending = false;
        self.clamp_selection();
    }

    pub fn clamp_selection(&mut self) {
        let rows = self.row_count();
        if rows == 0 {
            self.selected = 0;
        } else if self.selected >= rows {
            self.selected = rows - 1;
        }
    }

    /// Keep the Display cursor on valid menu coordinates after a re-render.
    pub fn clamp_menu_cursor(&mut self) {
        let menus = self.view.menus();
        if menus.is_empty() {
            self.menu_cursor = (0, 0);
            return;
        }
        let m = self.menu_cursor.0.min(menus.len() - 1);
        let items = menus[m].items.len();
        let i = if items == 0 {
            0
        } else {
            self.menu_cursor.1.min(items - 1)
        };
        self.menu_cursor = (m, i);
    }

    /// Keep the body cursor on a valid input slot after a re-render.
    pub fn clamp_slot_cursor(&mut self) {
        let inputs = self.view.body().input_indices().len();
        if inputs == 0 {
            self.slot_cursor = 0;
            self.editing = false;
            self.focus = DisplayFocus::Menus;
        } else if self.slot_cursor >= inputs {
            self.slot_cursor = inputs - 1;
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::listing::FileEntry;

    fn entry(name: &str, is_dir: bool) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            is_dir,
            size: 0,
            access: "w".to_string(),
        }
    }

    #[test]
    fn root_rows_have_no_parent_entry() {
        let mut app = App::new();
        app.set_listing(
            Listing::build(&[entry("a", true), entry("b.txt", false)]),
            SpaceInfo { used: 0, total: 0 },
        );
        assert_eq!(app.row_count(), 2);
        assert_eq!(app.selected_row(), Some(SelectedRow::Entry(&entry("a", true))));
    }

    #[test]
    fn non_root_prepends_parent_row() {
        let mut app = App::new();
        app.nav.set("/sub");
        app.set_listing(
            Listing::build(&[entry("b.txt", false)]),
            SpaceInfo { used: 0, total: 0 },
        );
        assert_eq!(app.row_count(), 2);
        assert_eq!(app.selected_row(), Some(SelectedRow::Parent));
        app.selected = 1;
        assert!(matches!(app.selected_row(), Some(SelectedRow::Entry(e)) if e.name == "b.txt"));
    }

    #[test]
    fn selection_is_clamped_after_shrink() {
        let mut app = App::new();
        app.set_listing(
            Listing::build(&[entry("a", false), entry("b", false)]),
            SpaceInfo { used: 0, total: 0 },
        );
        app.selected = 1;
        app.set_listing(
            Listing::build(&[entry("a", false)]),
            SpaceInfo { used: 0, total: 0 },
        );
        assert_eq!(app.selected, 0);
    }
}
