//! View reconciler: applies pushed view state to the client-side page model.
//!
//! Owns everything the display shell shows — the parsed page body, its
//! visibility, the menu set, the message banner, the page cache and the
//! shell slots that live outside any page (the datetime header). All
//! mutation funnels through this type so the invariants hold in one place:
//!
//! - a partial update touches exactly one slot and never menus or banner;
//! - each physical input slot carries at most one change-forwarding binding;
//! - at most one banner dismissal deadline is pending, replacement cancels;
//! - the page cache only grows, same-name pushes overwrite.

use crate::core::config::{BODY_TARGET_ID, SHELL_SLOT_IDS};
use crate::core::page::{PageBody, Slot, SlotKind};
use crate::core::protocol::{ClientMessage, Menu, ServerMessage};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Message banner pushed by the device.
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub is_error: bool,
    /// `None` = persistent until replaced or cleared.
    pub expires_at: Option<Instant>,
}

/// Where `(menu name, item name)` is currently rendered. Multiple slots per
/// key are legal — the same logical item can appear in several menus.
type MenuRegistry = HashMap<(String, String), Vec<(usize, usize)>>;

pub struct ViewModel {
    pages: HashMap<String, String>,
    body: PageBody,
    visible: bool,
    menus: Vec<Menu>,
    registry: MenuRegistry,
    banner: Option<Banner>,
    shell: Vec<Slot>,
}

impl ViewModel {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            body: PageBody::empty(),
            visible: true,
            menus: Vec::new(),
            registry: MenuRegistry::new(),
            banner: None,
            shell: SHELL_SLOT_IDS
                .iter()
                .map(|id| Slot::text(Some(id.to_string()), ""))
                .collect(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn body(&self) -> &PageBody {
        &self.body
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn menus(&self) -> &[Menu] {
        &self.menus
    }

    /// Active banner, or `None` once its deadline passed.
    pub fn banner(&self) -> Option<&Banner> {
        self.banner
            .as_ref()
            .filter(|b| b.expires_at.is_none_or(|at| Instant::now() < at))
    }

    /// Value of a shell slot (e.g. the datetime header field).
    pub fn shell_text(&self, id: &str) -> Option<&str> {
        self.shell.iter().find(|s| s.id.as_deref() == Some(id)).map(
            |s| match &s.kind {
                SlotKind::Text { content } => content.as_str(),
                SlotKind::Input { value, .. } => value.as_str(),
            },
        )
    }

    /// Cached page names, sorted for a stable page-switcher order.
    pub fn page_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // ── Full reconciliation ──────────────────────────────────────────────

    /// Apply a message as a full view state.
    ///
    /// Caches the body when both `pageName` and `body` are present, then
    /// replaces body, visibility, menus and banner from the message. Absent
    /// fields take their empty defaults, exactly like the original shell
    /// (a push without `body` blanks the page).
    pub fn apply_full(&mut self, msg: &ServerMessage) {
        if let Some((name, body)) = msg.cacheable_page() {
            self.pages.insert(name.to_string(), body.to_string());
        }

        self.body = PageBody::parse(msg.body.as_deref().unwrap_or(""));
        self.visible = msg.is_visible.unwrap_or(false);
        self.bind_inputs();

        self.menus = msg.menus.clone().unwrap_or_default();
        self.rebuild_registry();

        match msg.message.as_deref() {
            Some(text) if !text.is_empty() => self.set_message(
                text,
                msg.is_error.unwrap_or(false),
                msg.message_duration.unwrap_or(0.0),
            ),
            _ => self.clear_message(),
        }
    }

    /// Apply a targeted partial update to exactly one slot.
    ///
    /// The reserved body target replaces the whole body (without rebinding —
    /// fresh inputs stay unbound until the next full apply, as in the
    /// original). An unknown target is a logged no-op. Menus and banner are
    /// never touched on this path.
    pub fn apply_partial(&mut self, target: &str, content: &str) {
        if target == BODY_TARGET_ID {
            self.body = PageBody::parse(content);
            return;
        }
        if let Some(slot) = self.body.find_mut(target) {
            set_slot(slot, content);
            return;
        }
        if let Some(slot) = self.shell.iter_mut().find(|s| s.id.as_deref() == Some(target)) {
            set_slot(slot, content);
            return;
        }
        debug!(target, "partial update for unknown slot ignored");
    }

    /// Reactivate a cached page without a round trip.
    ///
    /// Synchronous cache hit only: a never-pushed page is a silent no-op and
    /// returns `false`.
    pub fn activate_page(&mut self, name: &str) -> bool {
        let Some(cached) = self.pages.get(name) else {
            debug!(page = name, "activate for page never pushed");
            return false;
        };
        self.body = PageBody::parse(cached);
        self.visible = true;
        self.bind_inputs();
        true
    }

    /// Set one placeholder by id: value for inputs (binding it if it was
    /// still unbound), text otherwise. Unknown ids are ignored.
    pub fn set_placeholder(&mut self, id: &str, value: &str) {
        if let Some(slot) = self.body.find_mut(id) {
            match &mut slot.kind {
                SlotKind::Input { value: v, bound } => {
                    *v = value.to_string();
                    *bound = true;
                }
                SlotKind::Text { content } => *content = value.to_string(),
            }
        } else {
            self.apply_partial(id, value);
        }
    }

    // ── Input bindings ───────────────────────────────────────────────────

    /// Attach the change-forwarding binding to every input slot that does
    /// not have one yet. Running this pass any number of times over the
    /// same body binds each physical slot exactly once.
    fn bind_inputs(&mut self) {
        for slot in self.body.slots_mut() {
            if let SlotKind::Input { bound, .. } = &mut slot.kind {
                *bound = true;
            }
        }
    }

    /// A local edit of the input slot `id`: store the new value and return
    /// the forwarded messages — one per attached binding, so exactly one
    /// for a bound slot and none for an unbound one.
    pub fn input_event(&mut self, id: &str, value: &str) -> Vec<ClientMessage> {
        let Some(slot) = self.body.find_mut(id) else {
            return Vec::new();
        };
        match &mut slot.kind {
            SlotKind::Input { value: v, bound } => {
                *v = value.to_string();
                if *bound {
                    vec![ClientMessage::InputChange {
                        placeholder: id.to_string(),
                        value: value.to_string(),
                    }]
                } else {
                    Vec::new()
                }
            }
            SlotKind::Text { .. } => Vec::new(),
        }
    }

    // ── Menus ────────────────────────────────────────────────────────────

    fn rebuild_registry(&mut self) {
        self.registry.clear();
        for (m, menu) in self.menus.iter().enumerate() {
            for (i, item) in menu.items.iter().enumerate() {
                self.registry
                    .entry((menu.name.clone(), item.name.clone()))
                    .or_default()
                    .push((m, i));
            }
        }
    }

    /// Re-enable every rendering of `(menu, item)`.
    pub fn enable_menu_item(&mut self, menu: &str, item: &str) {
        self.set_item_disabled(menu, item, false);
    }

    /// Disable every rendering of `(menu, item)`.
    pub fn disable_menu_item(&mut self, menu: &str, item: &str) {
        self.set_item_disabled(menu, item, true);
    }

    fn set_item_disabled(&mut self, menu: &str, item: &str, disabled: bool) {
        let Some(slots) = self
            .registry
            .get(&(menu.to_string(), item.to_string()))
        else {
            return;
        };
        for &(m, i) in slots {
            if let Some(entry) = self.menus.get_mut(m).and_then(|mn| mn.items.get_mut(i)) {
                entry.disabled = disabled;
            }
        }
    }

    // ── Banner ───────────────────────────────────────────────────────────

    /// Replace the banner. Replacement cancels any pending dismissal
    /// deadline; `duration_secs <= 0` keeps the message until it is
    /// replaced or cleared.
    pub fn set_message(&mut self, text: &str, is_error: bool, duration_secs: f64) {
        let expires_at = if duration_secs > 0.0 {
            Some(Instant::now() + Duration::from_secs_f64(duration_secs))
        } else {
            None
        };
        self.banner = Some(Banner {
            text: text.to_string(),
            is_error,
            expires_at,
        });
    }

    pub fn clear_message(&mut self) {
        self.banner = None;
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}

fn set_slot(slot: &mut Slot, content: &str) {
    match &mut slot.kind {
        SlotKind::Input { value, .. } => *value = content.to_string(),
        SlotKind::Text { content: c } => *c = content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_push(page: &str, body: &str) -> ServerMessage {
        ServerMessage {
            page_name: Some(page.to_string()),
            body: Some(body.to_string()),
            is_visible: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn full_apply_caches_and_renders() {
        let mut view = ViewModel::new();
        view.apply_full(&full_push("Main", "hello"));
        assert!(view.is_visible());
        assert_eq!(view.page_names(), vec!["Main"]);
    }

    #[test]
    fn same_page_push_overwrites_cache() {
        let mut view = ViewModel::new();
        view.apply_full(&full_push("Main", "one"));
        view.apply_full(&full_push("Main", "two"));
        assert!(view.activate_page("Main"));
        match &view.body().slots()[0].kind {
            SlotKind::Text { content } => assert_eq!(content, "two"),
            other => panic!("unexpected slot {other:?}"),
        }
    }

    #[test]
    fn body_without_page_name_is_not_cached() {
        let mut view = ViewModel::new();
        let msg = ServerMessage {
            body: Some("transient".to_string()),
            is_visible: Some(true),
            ..Default::default()
        };
        view.apply_full(&msg);
        assert!(view.page_names().is_empty());
    }

    #[test]
    fn activate_page_miss_is_silent_noop() {
        let mut view = ViewModel::new();
        view.apply_full(&full_push("Main", "kept"));
        assert!(!view.activate_page("Missing"));
        // Body untouched by the miss.
        assert_eq!(view.body().slots().len(), 1);
    }

    #[test]
    fn partial_update_touches_only_its_target() {
        let mut view = ViewModel::new();
        let mut msg = full_push("Main", r#"<span id="counter">1</span>"#);
        msg.menus = Some(vec![Menu {
            name: "M".to_string(),
            items: vec![MenuItemFixture::action("Go")],
        }]);
        msg.message = Some("hello".to_string());
        view.apply_full(&msg);

        view.apply_partial("datetime", "12:00");
        assert_eq!(view.shell_text("datetime"), Some("12:00"));
        // Menus and banner untouched.
        assert_eq!(view.menus().len(), 1);
        assert_eq!(view.banner().unwrap().text, "hello");
        // Body slot untouched.
        match &view.body().find("counter").unwrap().kind {
            SlotKind::Text { content } => assert_eq!(content, "1"),
            other => panic!("unexpected slot {other:?}"),
        }
    }

    #[test]
    fn partial_update_unknown_target_is_noop() {
        let mut view = ViewModel::new();
        view.apply_full(&full_push("Main", "text"));
        view.apply_partial("nope", "x");
        assert_eq!(view.body().slots().len(), 1);
    }

    #[test]
    fn partial_body_target_replaces_whole_body_unbound() {
        let mut view = ViewModel::new();
        view.apply_full(&full_push("Main", "old"));
        view.apply_partial(BODY_TARGET_ID, r#"<input id="fresh" value="">"#);
        // New inputs are not rebound on the partial path.
        assert!(view.input_event("fresh", "x").is_empty());
    }

    #[test]
    fn double_render_binds_exactly_once() {
        let mut view = ViewModel::new();
        let msg = full_push("Main", r#"<input id="input1" value="a">"#);
        view.apply_full(&msg);
        view.apply_full(&msg);
        // One physical edit forwards exactly one change.
        let forwarded = view.input_event("input1", "ab");
        assert_eq!(
            forwarded,
            vec![ClientMessage::InputChange {
                placeholder: "input1".to_string(),
                value: "ab".to_string(),
            }]
        );
    }

    #[test]
    fn set_placeholder_binds_and_sets() {
        let mut view = ViewModel::new();
        view.apply_partial(BODY_TARGET_ID, r#"<input id="rate" value="">"#);
        // Unbound after a partial body swap...
        assert!(view.input_event("rate", "1").is_empty());
        // ...but setPlaceholder binds on the way.
        view.set_placeholder("rate", "5");
        assert_eq!(view.input_event("rate", "6").len(), 1);
    }

    #[test]
    fn banner_replacement_cancels_deadline() {
        let mut view = ViewModel::new();
        view.set_message("short lived", false, 5.0);
        assert!(view.banner().unwrap().expires_at.is_some());
        view.set_message("stays", true, 0.0);
        let banner = view.banner().unwrap();
        assert_eq!(banner.text, "stays");
        assert!(banner.is_error);
        assert!(banner.expires_at.is_none());
    }

    #[test]
    fn full_push_without_message_clears_banner() {
        let mut view = ViewModel::new();
        view.set_message("old", false, 0.0);
        view.apply_full(&full_push("Main", "body"));
        assert!(view.banner().is_none());
    }

    #[test]
    fn menu_toggle_hits_every_rendering() {
        let mut view = ViewModel::new();
        let mut msg = full_push("Main", "");
        // The same logical item rendered in two menus of the same name set.
        msg.menus = Some(vec![
            Menu {
                name: "StopWatch".to_string(),
                items: vec![MenuItemFixture::action("Start"), MenuItemFixture::action("Stop")],
            },
            Menu {
                name: "StopWatch".to_string(),
                items: vec![MenuItemFixture::action("Start")],
            },
        ]);
        view.apply_full(&msg);

        view.disable_menu_item("StopWatch", "Start");
        assert!(view.menus()[0].items[0].disabled);
        assert!(view.menus()[1].items[0].disabled);
        assert!(!view.menus()[0].items[1].disabled);

        view.enable_menu_item("StopWatch", "Start");
        assert!(!view.menus()[0].items[0].disabled);
        assert!(!view.menus()[1].items[0].disabled);
    }

    #[test]
    fn menu_toggle_unknown_pair_is_noop() {
        let mut view = ViewModel::new();
        view.disable_menu_item("No", "Such");
        assert!(view.menus().is_empty());
    }

    /// Helper for building menu items in tests.
    struct MenuItemFixture;

    impl MenuItemFixture {
        fn action(name: &str) -> crate::core::protocol::MenuItem {
            crate::core::protocol::MenuItem {
                name: name.to_string(),
                url: None,
                disabled: false,
            }
        }
    }
}
