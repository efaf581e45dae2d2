use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const KIND_MESSAGE: u8 = 0;
pub const KIND_NOTIFICATION: u8 = 1;

/// Wire shape shared with the clients: `{message, fromUser, toUser, type, time}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub message: String,
    pub from_user: String,
    pub to_user: String,
    #[serde(rename = "type")]
    pub kind: u8,
    /// Stamped on arrival when the sender left it out.
    #[serde(default = "Utc::now", with = "iso_time")]
    pub time: DateTime<Utc>,
}

impl RelayMessage {
    /// Presence notice about `user` for `recipient`, e.g. "bob is online.".
    pub fn presence(user: &str, recipient: &str, status: &str) -> Self {
        Self {
            message: format!("{user} is {status}."),
            from_user: user.to_string(),
            to_user: recipient.to_string(),
            kind: KIND_NOTIFICATION,
            time: Utc::now(),
        }
    }

    pub fn involves(&self, user: &str) -> bool {
        self.from_user == user || self.to_user == user
    }
}

mod iso_time {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if let Ok(time) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(time.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|err| de::Error::custom(format!("invalid timestamp `{raw}`: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_time_is_stamped() {
        let before = Utc::now();
        let message: RelayMessage =
            serde_json::from_str(r#"{"message":"hi","fromUser":"a","toUser":"b","type":0}"#).unwrap();

        assert!(message.time >= before);
        assert_eq!(message.kind, KIND_MESSAGE);
    }

    #[test]
    fn accepts_browser_and_naive_timestamps() {
        let browser: RelayMessage = serde_json::from_str(
            r#"{"message":"hi","fromUser":"a","toUser":"b","type":0,"time":"2025-03-01T10:00:00.000Z"}"#,
        )
        .unwrap();
        let naive: RelayMessage = serde_json::from_str(
            r#"{"message":"hi","fromUser":"a","toUser":"b","type":0,"time":"2025-03-01T10:00:00"}"#,
        )
        .unwrap();

        assert_eq!(browser.time, naive.time);
    }

    #[test]
    fn presence_notice_shape() {
        let notice = RelayMessage::presence("bob", "alice", "online");
        let value: serde_json::Value = serde_json::to_value(&notice).unwrap();

        assert_eq!(value["message"], "bob is online.");
        assert_eq!(value["fromUser"], "bob");
        assert_eq!(value["toUser"], "alice");
        assert_eq!(value["type"], 1);
        assert!(value["time"].as_str().unwrap().ends_with('Z'));
    }
}
