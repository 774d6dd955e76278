//! Page body model: the client-side stand-in for the browser DOM.
//!
//! The device pushes page bodies as small HTML fragments. The terminal
//! client flattens such a fragment into an ordered list of [`Slot`]s:
//! `<input id=..>` elements become editable input slots, any other element
//! carrying an `id` becomes an addressable text slot, and everything else
//! degrades to plain text. That is exactly the surface the reconciler
//! needs — partial updates address slots by id, the bind pass walks input
//! slots, and the renderer walks the whole list.
//!
//! The scanner is deliberately forgiving: unknown tags vanish, unclosed
//! markup never errors, entities beyond the common named ones pass through
//! untouched. Device pages are tiny and hand-written; strictness would only
//! turn cosmetic markup typos into blank screens.

/// What a slot holds.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotKind {
    /// Editable value, mirrors an `<input id=..>` element. `bound` tracks
    /// whether a change-forwarding binding was attached to this physical
    /// slot; re-parsing the body resets it, a bind pass never sets it twice.
    Input { value: String, bound: bool },
    /// Static or server-updatable text.
    Text { content: String },
}

/// One addressable unit of the page body.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Element id, when the fragment provided one. Anonymous text has none.
    pub id: Option<String>,
    pub kind: SlotKind,
    /// Starts a new output line when rendered.
    pub line_break: bool,
}

impl Slot {
    pub fn text(id: Option<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            kind: SlotKind::Text {
                content: content.into(),
            },
            line_break: false,
        }
    }

    pub fn input(id: String, value: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            kind: SlotKind::Input {
                value: value.into(),
                bound: false,
            },
            line_break: false,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, SlotKind::Input { .. })
    }
}

/// Parsed page body: an ordered, flat list of slots.
#[derive(Debug, Clone, Default)]
pub struct PageBody {
    slots: Vec<Slot>,
}

impl PageBody {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Flatten an HTML fragment into slots.
    pub fn parse(fragment: &str) -> Self {
        Parser::new(fragment).run()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    pub fn find(&self, id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id.as_deref() == Some(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| s.id.as_deref() == Some(id))
    }

    /// Positions of input slots, in render order.
    pub fn input_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_input())
            .map(|(i, _)| i)
            .collect()
    }
}

// ── Fragment scanner ─────────────────────────────────────────────────────────

struct Parser<'a> {
    rest: &'a str,
    slots: Vec<Slot>,
    text_run: String,
    /// Open element with an id: (id, captured text).
    open_id: Option<(String, String)>,
    at_line_start: bool,
}

impl<'a> Parser<'a> {
    fn new(fragment: &'a str) -> Self {
        Self {
            rest: fragment,
            slots: Vec::new(),
            text_run: String::new(),
            open_id: None,
            at_line_start: true,
        }
    }

    fn run(mut self) -> PageBody {
        while let Some(lt) = self.rest.find('<') {
            let (text, tail) = self.rest.split_at(lt);
            self.take_text(text);
            match tail[1..].find('>') {
                Some(gt) => {
                    let tag = &tail[1..1 + gt];
                    self.rest = &tail[gt + 2..];
                    self.take_tag(tag);
                }
                None => {
                    // Unterminated tag: treat the remainder as text.
                    self.take_text(&tail[1..]);
                    self.rest = "";
                }
            }
        }
        let remaining = std::mem::take(&mut self.rest);
        self.take_text(remaining);
        self.flush_text();
        self.close_open_id();
        PageBody { slots: self.slots }
    }

    fn take_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let decoded = decode_entities(raw);
        let collapsed: String = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return;
        }
        match &mut self.open_id {
            Some((_, captured)) => {
                if !captured.is_empty() {
                    captured.push(' ');
                }
                captured.push_str(&collapsed);
            }
            None => {
                if !self.text_run.is_empty() {
                    self.text_run.push(' ');
                }
                self.text_run.push_str(&collapsed);
            }
        }
    }

    fn take_tag(&mut self, tag: &str) {
        let name = tag_name(tag);
        match name.as_str() {
            "br" => self.break_line(),
            "input" => {
                self.flush_text();
                if let Some(id) = attr(tag, "id") {
                    let value = attr(tag, "value").unwrap_or_default();
                    self.push(Slot::input(id, decode_entities(&value)));
                }
                // Inputs without an id cannot be addressed or forwarded;
                // they are dropped like the original client ignores them.
            }
            _ if name.starts_with('/') => {
                // Any close tag ends the innermost id capture.
                self.close_open_id();
                if is_block(&name[1..]) {
                    self.break_line();
                }
            }
            _ => {
                if is_block(&name) {
                    self.break_line();
                }
                if let Some(id) = attr(tag, "id") {
                    self.flush_text();
                    self.close_open_id();
                    self.open_id = Some((id, String::new()));
                }
            }
        }
    }

    fn break_line(&mut self) {
        self.flush_text();
        self.close_open_id();
        self.at_line_start = true;
    }

    fn flush_text(&mut self) {
        if self.text_run.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.text_run);
        self.push(Slot::text(None, content));
    }

    fn close_open_id(&mut self) {
        if let Some((id, captured)) = self.open_id.take() {
            self.push(Slot::text(Some(id), captured));
        }
    }

    fn push(&mut self, mut slot: Slot) {
        slot.line_break = std::mem::replace(&mut self.at_line_start, false);
        self.slots.push(slot);
    }
}

fn tag_name(tag: &str) -> String {
    tag.trim()
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "div" | "p" | "li" | "ul" | "ol" | "table" | "tr" | "h1" | "h2" | "h3" | "h4" | "hr"
    )
}

/// Pull a `key="value"` or `key='value'` or bare `key=value` attribute out of
/// a tag body.
fn attr(tag: &str, key: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let mut search = 0;
    while let Some(pos) = lower[search..].find(key) {
        let start = search + pos;
        let before_ok = start == 0
            || lower[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_whitespace());
        let after = &tag[start + key.len()..];
        let after_trim = after.trim_start();
        if before_ok && after_trim.starts_with('=') {
            let value = after_trim[1..].trim_start();
            return Some(match value.chars().next() {
                Some(q @ ('"' | '\'')) => value[1..].split(q).next().unwrap_or("").to_string(),
                _ => value
                    .split(|c: char| c.is_whitespace() || c == '>')
                    .next()
                    .unwrap_or("")
                    .to_string(),
            });
        }
        search = start + key.len();
    }
    None
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_becomes_one_slot() {
        let body = PageBody::parse("hello   world");
        assert_eq!(body.slots().len(), 1);
        assert_eq!(
            body.slots()[0].kind,
            SlotKind::Text {
                content: "hello world".to_string()
            }
        );
    }

    #[test]
    fn input_with_id_and_value() {
        let body = PageBody::parse(r#"<input type="text" id="input1" value="42">"#);
        let slot = body.find("input1").unwrap();
        assert_eq!(
            slot.kind,
            SlotKind::Input {
                value: "42".to_string(),
                bound: false
            }
        );
    }

    #[test]
    fn input_without_id_is_dropped() {
        let body = PageBody::parse(r#"before <input type="text"> after"#);
        assert!(body.slots().iter().all(|s| !s.is_input()));
    }

    #[test]
    fn id_element_captures_inner_text() {
        let body = PageBody::parse(r#"<span id="counterState">Stopped</span>"#);
        assert_eq!(
            body.find("counterState").unwrap().kind,
            SlotKind::Text {
                content: "Stopped".to_string()
            }
        );
    }

    #[test]
    fn mixed_fragment_keeps_order() {
        let body =
            PageBody::parse(r#"Counter: <span id="counter">7</span><br><input id="rate" value="">"#);
        let kinds: Vec<Option<&str>> = body.slots().iter().map(|s| s.id.as_deref()).collect();
        assert_eq!(kinds, vec![None, Some("counter"), Some("rate")]);
        assert!(body.slots()[2].line_break);
    }

    #[test]
    fn entities_are_decoded() {
        let body = PageBody::parse("a&nbsp;&amp;&nbsp;b");
        assert_eq!(
            body.slots()[0].kind,
            SlotKind::Text {
                content: "a & b".to_string()
            }
        );
    }

    #[test]
    fn unterminated_tag_degrades_to_text() {
        let body = PageBody::parse("ok <span id=broken");
        assert_eq!(body.slots().len(), 1);
        assert!(body.slots()[0].id.is_none());
    }

    #[test]
    fn attr_forms() {
        assert_eq!(attr(r#"input id="a""#, "id").as_deref(), Some("a"));
        assert_eq!(attr("input id='b'", "id").as_deref(), Some("b"));
        assert_eq!(attr("input id=c value=d", "id").as_deref(), Some("c"));
        assert_eq!(attr("input hidden", "id"), None);
        // `id` inside another attribute's name must not match.
        assert_eq!(attr(r#"input data-id="x""#, "id"), None);
    }
}
