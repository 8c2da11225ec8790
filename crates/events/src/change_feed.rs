//! Realtime change-feed messages.
//!
//! A change feed is keyed by a stable channel name and carries one message per
//! committed row change, shaped `{ table, event, record }` where `record` is the
//! row as written. Each message is tagged with the channel it was published on,
//! so several feeds can share one bus. Beyond the channel, the only filtering the
//! core performs is dropping messages the current session caused itself.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use stockroom_core::UserId;

/// Row-level change kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "INSERT",
            ChangeKind::Update => "UPDATE",
            ChangeKind::Delete => "DELETE",
        }
    }
}

/// One message on the change feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Empty until a publisher tags it.
    #[serde(default)]
    pub channel: String,
    pub table: String,
    pub event: ChangeKind,
    pub record: JsonValue,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, event: ChangeKind, record: JsonValue) -> Self {
        Self {
            channel: String::new(),
            table: table.into(),
            event,
            record,
        }
    }

    pub fn on_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn is_on_channel(&self, channel: &str) -> bool {
        self.channel == channel
    }
}

/// Messages that carry the identity of the user whose action produced them.
///
/// `None` means the change was system-originated (or the payload carried no
/// usable user id).
pub trait Originated {
    fn originating_user(&self) -> Option<UserId>;
}

impl Originated for ChangeEvent {
    fn originating_user(&self) -> Option<UserId> {
        self.record
            .get("user_id")
            .and_then(JsonValue::as_str)
            .and_then(|raw| raw.parse().ok())
    }
}

/// True when `message` was caused by `current_user` and should not notify them again.
///
/// Pure predicate on the payload; it is not a locking mechanism. A session without a
/// user never treats anything as its own, and system-originated changes always pass.
pub fn is_self_originated<M: Originated + ?Sized>(message: &M, current_user: Option<UserId>) -> bool {
    match (current_user, message.originating_user()) {
        (Some(me), Some(author)) => me == author,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn own_changes_are_filtered() {
        let me = UserId::new();
        let ev = ChangeEvent::new(
            "activity_logs",
            ChangeKind::Insert,
            json!({ "user_id": me.to_string() }),
        );
        assert!(is_self_originated(&ev, Some(me)));
    }

    #[test]
    fn foreign_and_system_changes_pass() {
        let me = UserId::new();
        let other = ChangeEvent::new(
            "inventory",
            ChangeKind::Update,
            json!({ "user_id": UserId::new().to_string() }),
        );
        let system = ChangeEvent::new("inventory", ChangeKind::Update, json!({ "user_id": null }));
        let garbled = ChangeEvent::new("inventory", ChangeKind::Update, json!({ "user_id": 42 }));

        assert!(!is_self_originated(&other, Some(me)));
        assert!(!is_self_originated(&system, Some(me)));
        assert!(!is_self_originated(&garbled, Some(me)));
    }

    #[test]
    fn anonymous_session_sees_everything() {
        let ev = ChangeEvent::new(
            "inventory",
            ChangeKind::Delete,
            json!({ "user_id": UserId::new().to_string() }),
        );
        assert!(!is_self_originated(&ev, None));
    }

    #[test]
    fn wire_shape_uses_uppercase_event_names() {
        let ev = ChangeEvent::new("inventory", ChangeKind::Update, json!({})).on_channel("inventory-changes");
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["event"], "UPDATE");
        assert_eq!(v["table"], "inventory");
        assert_eq!(v["channel"], "inventory-changes");
    }

    #[test]
    fn untagged_payloads_decode_without_a_channel() {
        let ev: ChangeEvent = serde_json::from_value(json!({
            "table": "activity_logs",
            "event": "INSERT",
            "record": {}
        }))
        .unwrap();
        assert!(ev.is_on_channel(""));
        assert!(!ev.is_on_channel("inventory-changes"));
        assert!(ev.on_channel("inventory-changes").is_on_channel("inventory-changes"));
    }
}
