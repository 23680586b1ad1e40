//! Raw notifications delivered by the chat transport.
//!
//! These are wire-shaped: numeric fields that platforms deliver as message
//! tag strings stay strings here and are parsed by the normalizer, so a
//! malformed value degrades only the one notification that carried it.

use serde::{Deserialize, Serialize};

/// A chat message as received from the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Platform user id of the author.
    pub user_id: String,
    /// Display name of the author.
    pub username: String,
    /// Channel the message was sent to.
    pub channel: String,
    /// Message text.
    pub text: String,
    /// Bits attached to the message, 0 when none.
    #[serde(default)]
    pub bits: u32,
}

/// One decoded notification from the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A chat message, possibly carrying bits, a raid command or a
    /// third-party follow announcement.
    Message(ChatMessage),
    /// Another channel started hosting this one.
    BeingHosted {
        channel: String,
        viewers: u32,
        auto_host: bool,
    },
    /// Another channel raided this one. The viewer count arrives as a
    /// message tag string.
    Raid {
        channel: String,
        viewer_count: String,
    },
    /// A first-time subscription.
    NewSubscriber {
        display_name: String,
        plan_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// A renewed subscription.
    ReSubscriber {
        display_name: String,
        plan_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        months: u32,
    },
    /// One subscription gifted to a named recipient. Months arrive as a
    /// message tag string.
    GiftedSubscription {
        recipient: String,
        gifter: String,
        plan_name: String,
        months: String,
    },
    /// A bulk gift of subscriptions to random recipients. The count
    /// arrives as a message tag string.
    CommunitySubscription {
        gifter: String,
        plan_name: String,
        gifted_count: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_serde_roundtrip() {
        let n = Notification::Raid {
            channel: "cohost".to_string(),
            viewer_count: "42".to_string(),
        };

        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"type\":\"raid\""));

        let back: Notification = serde_json::from_str(&json).unwrap();
        match back {
            Notification::Raid { channel, viewer_count } => {
                assert_eq!(channel, "cohost");
                assert_eq!(viewer_count, "42");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_chat_message_bits_default() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"user_id":"1","username":"viewer","channel":"main","text":"hi"}"#,
        )
        .unwrap();
        assert_eq!(msg.bits, 0);
    }
}
