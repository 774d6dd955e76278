//! Wire protocol of the display WebSocket.
//!
//! Inbound messages are weakly tagged: some carry a `type` field, full state
//! pushes carry none at all, and the cache-as-page rule is inferred from
//! field presence (`pageName` and `body` both set) rather than an explicit
//! discriminator. The device depends on that inference, so [`ServerMessage`]
//! keeps every field optional and routing happens on the decoded struct —
//! tightening it into tagged enum variants would silently stop caching pages
//! the device expects to be cached.
//!
//! Routing runs two passes over every message: the generic view verdict
//! ([`ServerMessage::verdict`]) and the file-manager trigger
//! ([`ServerMessage::feature_trigger`]). Both layers observe every message;
//! a trigger never replaces the view pass.

use serde::{Deserialize, Serialize};

/// Menu entry as pushed by the device. An item with a `url` is a navigable
/// link, one without is an action that round-trips through the server;
/// disabled items are inert in both cases.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

/// Named menu with its ordered items.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Menu {
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// Any inbound message, decoded field-by-field.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    // redirect
    pub url: Option<String>,
    // partial update
    pub target: Option<String>,
    pub content: Option<String>,
    // full state push
    pub page_name: Option<String>,
    pub body: Option<String>,
    pub is_visible: Option<bool>,
    pub menus: Option<Vec<Menu>>,
    pub message: Option<String>,
    pub is_error: Option<bool>,
    /// Banner lifetime in seconds; 0 or absent means persistent.
    pub message_duration: Option<f64>,
}

/// Generic view-layer verdict for one message, in priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<'a> {
    /// Leave the current page entirely; terminates processing.
    Redirect(&'a str),
    /// Mutate exactly one slot.
    Partial { target: &'a str, content: &'a str },
    /// Treat the message as a full view state (caching happens inside the
    /// reconciler when both `pageName` and `body` are present).
    Full,
}

/// File-manager trigger piggybacked on the same channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureTrigger {
    FileUpload,
    CreateFolder,
    Reboot,
    FileList,
}

impl ServerMessage {
    /// Classify for the generic view layer.
    pub fn verdict(&self) -> Verdict<'_> {
        match self.kind.as_deref() {
            Some("redirect") => {
                if let Some(url) = self.url.as_deref() {
                    return Verdict::Redirect(url);
                }
                Verdict::Full
            }
            Some("update") => {
                if let Some(target) = self.target.as_deref() {
                    return Verdict::Partial {
                        target,
                        content: self.content.as_deref().unwrap_or(""),
                    };
                }
                Verdict::Full
            }
            _ => Verdict::Full,
        }
    }

    /// Classify for the file-manager layer. Dispatched after the view
    /// verdict, never instead of it — except for `redirect`, which
    /// terminates all processing of the message.
    pub fn feature_trigger(&self) -> Option<FeatureTrigger> {
        match self.kind.as_deref() {
            Some("fileUpload") => Some(FeatureTrigger::FileUpload),
            Some("createFolder") => Some(FeatureTrigger::CreateFolder),
            Some("reboot") => Some(FeatureTrigger::Reboot),
            Some("fileList") => Some(FeatureTrigger::FileList),
            _ => None,
        }
    }

    /// Whether this push should overwrite the page cache entry.
    pub fn cacheable_page(&self) -> Option<(&str, &str)> {
        match (self.page_name.as_deref(), self.body.as_deref()) {
            (Some(name), Some(body)) => Some((name, body)),
            _ => None,
        }
    }
}

/// Outbound messages; always explicitly tagged.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// User activated a non-link menu item.
    MenuClick { menu: String, item: String },
    /// A bound input slot changed.
    InputChange { placeholder: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_wins_over_everything() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"type": "redirect", "url": "/other", "target": "x", "body": "b", "pageName": "p"}"#,
        )
        .unwrap();
        assert_eq!(msg.verdict(), Verdict::Redirect("/other"));
    }

    #[test]
    fn update_routes_partial() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type": "update", "target": "datetime", "content": "12:00"}"#)
                .unwrap();
        assert_eq!(
            msg.verdict(),
            Verdict::Partial {
                target: "datetime",
                content: "12:00"
            }
        );
    }

    #[test]
    fn untagged_push_is_full() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"pageName": "Main", "body": "<p>hi</p>", "isVisible": true, "menus": []}"#,
        )
        .unwrap();
        assert_eq!(msg.verdict(), Verdict::Full);
        assert_eq!(msg.cacheable_page(), Some(("Main", "<p>hi</p>")));
    }

    #[test]
    fn body_without_page_name_applies_but_never_caches() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"body": "<p>transient</p>", "isVisible": true}"#).unwrap();
        assert_eq!(msg.verdict(), Verdict::Full);
        assert_eq!(msg.cacheable_page(), None);
    }

    #[test]
    fn feature_triggers_are_a_second_pass() {
        let msg: ServerMessage = serde_json::from_str(r#"{"type": "fileList"}"#).unwrap();
        // The view layer still sees a full push...
        assert_eq!(msg.verdict(), Verdict::Full);
        // ...and the file-manager layer sees its trigger.
        assert_eq!(msg.feature_trigger(), Some(FeatureTrigger::FileList));
    }

    #[test]
    fn unknown_type_falls_through_to_full() {
        let msg: ServerMessage = serde_json::from_str(r#"{"type": "telemetry"}"#).unwrap();
        assert_eq!(msg.verdict(), Verdict::Full);
        assert_eq!(msg.feature_trigger(), None);
    }

    #[test]
    fn menus_decode_with_defaults() {
        let menu: Menu = serde_json::from_str(
            r#"{"name": "StopWatch", "items": [
                {"name": "Start"},
                {"name": "Docs", "url": "/docs", "disabled": true}
            ]}"#,
        )
        .unwrap();
        assert!(!menu.items[0].disabled);
        assert!(menu.items[0].url.is_none());
        assert!(menu.items[1].disabled);
    }

    #[test]
    fn outbound_wire_shape() {
        let click = ClientMessage::MenuClick {
            menu: "StopWatch".to_string(),
            item: "Start".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&click).unwrap(),
            r#"{"type":"menuClick","menu":"StopWatch","item":"Start"}"#
        );
        let change = ClientMessage::InputChange {
            placeholder: "input1".to_string(),
            value: "42".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&change).unwrap(),
            r#"{"type":"inputChange","placeholder":"input1","value":"42"}"#
        );
    }
}
