//! Notification payload parsing and the in-memory notification list behind
//! the bell view.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;

const MAX_NOTIFICATIONS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Normal,
}

impl Priority {
    pub fn from_level(level: Option<i64>) -> Self {
        match level {
            Some(1) => Priority::Critical,
            Some(2) => Priority::High,
            Some(3) => Priority::Medium,
            Some(4) => Priority::Low,
            _ => Priority::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: Option<String>,
    pub message: String,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Deserialize)]
struct NotificationPayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    priority: Option<serde_json::Value>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Parse one socket frame. Returns `None` (after logging) for malformed
/// JSON and for frames with neither a title nor a message.
pub fn parse_notification(text: &str, received_at: DateTime<Utc>) -> Option<Notification> {
    let payload: NotificationPayload = match serde_json::from_str(text) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed notification");
            return None;
        }
    };

    let title = payload.title.filter(|t| !t.is_empty());
    let message = payload.message.map(message_text).filter(|m| !m.is_empty());
    if title.is_none() && message.is_none() {
        tracing::warn!("discarding empty notification");
        return None;
    }

    let timestamp = match payload.timestamp.as_deref().map(DateTime::parse_from_rfc3339) {
        Some(Ok(ts)) => ts.with_timezone(&Utc),
        Some(Err(_)) => {
            tracing::warn!("invalid notification timestamp, using receive time");
            received_at
        }
        None => received_at,
    };

    let level = payload.priority.as_ref().and_then(|p| {
        p.as_i64().or_else(|| p.as_str().and_then(|s| s.trim().parse().ok()))
    });

    Some(Notification {
        id: new_id(),
        title,
        message: message.unwrap_or_default(),
        priority: Priority::from_level(level),
        timestamp,
        read: false,
    })
}

/// A string that is itself JSON carrying `message` is unwrapped; other
/// non-string values are shown as JSON text.
fn message_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            match serde_json::from_str::<serde_json::Value>(&s) {
                Ok(serde_json::Value::Object(obj)) => match obj.get("message") {
                    Some(serde_json::Value::String(inner)) if !inner.is_empty() => inner.clone(),
                    _ => s,
                },
                _ => s,
            }
        }
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn new_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    messages: VecDeque<Notification>,
    connected: bool,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification) {
        if self.messages.len() >= MAX_NOTIFICATIONS {
            self.messages.pop_front();
        }
        self.messages.push_back(notification);
    }

    /// Newest first.
    pub fn iter_recent(&self) -> impl Iterator<Item = &Notification> {
        self.messages.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(m) => {
                m.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for m in &mut self.messages {
            m.read = true;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.read).count()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_full_payload() {
        let n = parse_notification(
            r#"{"title":"Meta batida","message":"LeBron passou de 25 pontos","priority":1,"timestamp":"2024-03-01T10:00:00Z"}"#,
            now(),
        )
        .unwrap();
        assert_eq!(n.title.as_deref(), Some("Meta batida"));
        assert_eq!(n.message, "LeBron passou de 25 pontos");
        assert_eq!(n.priority, Priority::Critical);
        assert_eq!(n.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(!n.read);
        assert_eq!(n.id.len(), 16);
    }

    #[test]
    fn test_malformed_and_empty_payloads_are_discarded() {
        assert!(parse_notification("not json", now()).is_none());
        assert!(parse_notification("{}", now()).is_none());
        assert!(parse_notification(r#"{"title":"","message":""}"#, now()).is_none());
    }

    #[test]
    fn test_title_only_is_kept() {
        let n = parse_notification(r#"{"title":"Atualização"}"#, now()).unwrap();
        assert_eq!(n.message, "");
        assert_eq!(n.priority, Priority::Normal);
    }

    #[test]
    fn test_nested_json_message_is_unwrapped() {
        let n = parse_notification(
            r#"{"message":"{\"message\":\"Aposta liquidada\",\"code\":7}","priority":"2"}"#,
            now(),
        )
        .unwrap();
        assert_eq!(n.message, "Aposta liquidada");
        assert_eq!(n.priority, Priority::High);
    }

    #[test]
    fn test_object_message_rendered_as_json() {
        let n = parse_notification(r#"{"message":{"a":1}}"#, now()).unwrap();
        assert_eq!(n.message, r#"{"a":1}"#);
    }

    #[test]
    fn test_invalid_timestamp_falls_back_to_receive_time() {
        let n = parse_notification(r#"{"message":"x","timestamp":"ontem"}"#, now()).unwrap();
        assert_eq!(n.timestamp, now());
    }

    #[test]
    fn test_center_read_flags() {
        let mut center = NotificationCenter::new();
        let a = parse_notification(r#"{"message":"a"}"#, now()).unwrap();
        let b = parse_notification(r#"{"message":"b"}"#, now()).unwrap();
        let a_id = a.id.clone();
        center.push(a);
        center.push(b);
        assert_eq!(center.unread_count(), 2);
        assert_eq!(center.iter_recent().next().unwrap().message, "b");

        assert!(center.mark_read(&a_id));
        assert!(!center.mark_read("missing"));
        assert_eq!(center.unread_count(), 1);

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn test_center_is_bounded() {
        let mut center = NotificationCenter::new();
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            let n = parse_notification(&format!(r#"{{"message":"m{i}"}}"#), now()).unwrap();
            center.push(n);
        }
        assert_eq!(center.len(), MAX_NOTIFICATIONS);
        assert_eq!(center.iter_recent().last().unwrap().message, "m5");
    }
}
