use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::IdentityError;

/// The local participant's name. Used both as the connection key on the
/// relay and as the routing key on every message, so it is kept exactly as
/// typed: case and surrounding whitespace are significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Rejects names that are empty or only whitespace.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        if raw.trim().is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire `type`: 0 for user text, 1 for relay notifications (presence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MessageKind {
    Message,
    Notification,
}

impl TryFrom<u8> for MessageKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Message),
            1 => Ok(Self::Notification),
            other => Err(format!("unknown message type {other}")),
        }
    }
}

impl From<MessageKind> for u8 {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Message => 0,
            MessageKind::Notification => 1,
        }
    }
}

/// One addressed chat event, in the relay's wire shape:
/// `{message, fromUser, toUser, type, time}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "message")]
    pub content: String,
    pub from_user: String,
    pub to_user: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(with = "iso_time")]
    pub time: DateTime<Utc>,
}

impl ChatMessage {
    /// A user-authored message stamped with the current time.
    pub fn outgoing(from_user: &str, to_user: &str, content: &str) -> Self {
        Self {
            content: content.to_string(),
            from_user: from_user.to_string(),
            to_user: to_user.to_string(),
            kind: MessageKind::Message,
            time: Utc::now(),
        }
    }

    pub fn from_wire(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// True when `identity` is the sender or the recipient.
    pub fn involves(&self, identity: &str) -> bool {
        self.from_user == identity || self.to_user == identity
    }

    /// True when the message was exchanged between `a` and `b`, in either
    /// direction.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.from_user == a && self.to_user == b) || (self.from_user == b && self.to_user == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "connected",
            Self::Closed => "disconnected",
        };
        f.write_str(label)
    }
}

/// Parses an ISO-8601 timestamp. Offset-less values (what Python's
/// `isoformat()` emits for naive datetimes) are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

mod iso_time {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO-8601 timestamp `{raw}`")))
    }
}

/// Human-readable clock time for a message, in the local timezone.
pub fn display_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn decodes_frontend_payload() {
        let payload = r#"{"message":"hi","fromUser":"alice","toUser":"bob","type":0,"time":"2025-03-01T10:15:30.250Z"}"#;
        let message = ChatMessage::from_wire(payload).unwrap();

        assert_eq!(message.content, "hi");
        assert_eq!(message.from_user, "alice");
        assert_eq!(message.to_user, "bob");
        assert_eq!(message.kind, MessageKind::Message);
        assert_eq!(
            message.time,
            Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap() + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn decodes_relay_notification_with_naive_time() {
        let payload = r#"{"message":"bob is online.","fromUser":"bob","toUser":"alice","type":1,"time":"2025-03-01T10:15:30.123456"}"#;
        let message = ChatMessage::from_wire(payload).unwrap();

        assert_eq!(message.kind, MessageKind::Notification);
        assert_eq!(message.time.timestamp(), Utc.with_ymd_and_hms(2025, 3, 1, 10, 15, 30).unwrap().timestamp());
        assert_eq!(message.time.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn offsets_are_normalised_to_utc() {
        let time = parse_timestamp("2025-03-01T12:00:00+02:00").unwrap();
        assert_eq!(time, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        assert_eq!(
            parse_timestamp("2025-03-01T10:00:00"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_unknown_type_and_bad_time() {
        let bad_type = r#"{"message":"x","fromUser":"a","toUser":"b","type":7,"time":"2025-03-01T10:00:00Z"}"#;
        let bad_time = r#"{"message":"x","fromUser":"a","toUser":"b","type":0,"time":"yesterday"}"#;
        let missing_field = r#"{"message":"x","fromUser":"a","type":0,"time":"2025-03-01T10:00:00Z"}"#;

        assert!(ChatMessage::from_wire(bad_type).is_err());
        assert!(ChatMessage::from_wire(bad_time).is_err());
        assert!(ChatMessage::from_wire(missing_field).is_err());
    }

    #[test]
    fn encodes_wire_field_names() {
        let message = ChatMessage {
            content: "hello".to_string(),
            from_user: "alice".to_string(),
            to_user: "bob".to_string(),
            kind: MessageKind::Notification,
            time: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
        };
        let value: serde_json::Value = serde_json::from_str(&message.to_wire().unwrap()).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "message": "hello",
                "fromUser": "alice",
                "toUser": "bob",
                "type": 1,
                "time": "2025-03-01T10:00:00.000Z",
            })
        );
    }

    #[test]
    fn pair_matching_is_symmetric() {
        let message = ChatMessage::outgoing("alice", "bob", "hi");

        assert!(message.is_between("alice", "bob"));
        assert!(message.is_between("bob", "alice"));
        assert!(!message.is_between("alice", "carol"));
        assert!(message.involves("bob"));
        assert!(!message.involves("Bob"));
    }

    #[test]
    fn identity_is_kept_verbatim_but_required() {
        assert_eq!(Identity::parse("  alice ").unwrap().as_str(), "  alice ");
        assert_ne!(Identity::parse("Alice").unwrap(), Identity::parse("alice").unwrap());
        assert_eq!(Identity::parse("   "), Err(IdentityError::Empty));
        assert_eq!(Identity::parse(""), Err(IdentityError::Empty));
    }
}
