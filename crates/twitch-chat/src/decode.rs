//! Decoding parsed IRC lines into core notifications.
//!
//! Numeric tag values that the core parses itself (gift months, community
//! gift counts, raid viewer counts) are passed through as the raw strings
//! so a malformed value degrades exactly one notification downstream.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use chat_events::{ChatMessage, Notification};

use crate::irc::IrcMessage;

/// Service account that delivers legacy host notifications in plain chat.
const HOST_SENDER: &str = "jtv";

static HOST_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?<channel>\S+) is now (?<auto>auto )?hosting you(?: for (?:up to )?(?<viewers>\d+) viewers)?\.?$",
    )
    .expect("host pattern")
});

/// One decoded item from the chat stream. Presence updates sit alongside
/// notifications because they feed the approximate viewer count rather
/// than the event ledger.
#[derive(Debug, Clone)]
pub enum ChatItem {
    Notification(Notification),
    /// Chat user list delivered on join (RPL_NAMREPLY).
    Presence { users: Vec<String> },
}

/// Decode one parsed IRC message. Unknown commands and notice kinds decode
/// to `None`; decoding never fails.
pub fn decode_message(msg: &IrcMessage) -> Option<ChatItem> {
    match msg.command.as_str() {
        "PRIVMSG" => decode_privmsg(msg),
        "USERNOTICE" => decode_usernotice(msg).map(ChatItem::Notification),
        // RPL_NAMREPLY: the user list for the joined channel.
        "353" => {
            let users = msg
                .trailing
                .as_deref()
                .unwrap_or_default()
                .split_ascii_whitespace()
                .map(str::to_string)
                .collect();
            Some(ChatItem::Presence { users })
        }
        _ => None,
    }
}

fn decode_privmsg(msg: &IrcMessage) -> Option<ChatItem> {
    let text = msg.trailing.as_deref()?.trim();
    let nick = msg.sender_nick()?;

    if nick == HOST_SENDER {
        let notification = decode_host_line(text)?;
        return Some(ChatItem::Notification(notification));
    }

    let username = msg
        .tag("display-name")
        .filter(|name| !name.is_empty())
        .unwrap_or(nick)
        .to_string();
    let user_id = msg.tag("user-id").unwrap_or(nick).to_string();
    let bits = msg
        .tag("bits")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(0);

    Some(ChatItem::Notification(Notification::Message(ChatMessage {
        user_id,
        username,
        channel: msg.channel().unwrap_or_default().to_string(),
        text: text.to_string(),
        bits,
    })))
}

fn decode_host_line(text: &str) -> Option<Notification> {
    let captures = HOST_REGEX.captures(text)?;
    let viewers = captures
        .name("viewers")
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some(Notification::BeingHosted {
        channel: captures.name("channel")?.as_str().to_string(),
        viewers,
        auto_host: captures.name("auto").is_some(),
    })
}

fn decode_usernotice(msg: &IrcMessage) -> Option<Notification> {
    let display_name = msg
        .tag("display-name")
        .filter(|name| !name.is_empty())
        .or_else(|| msg.tag("login"))?
        .to_string();

    match msg.tag("msg-id")? {
        "sub" => Some(Notification::NewSubscriber {
            display_name,
            plan_name: msg.tag("msg-param-sub-plan-name")?.to_string(),
            message: msg.trailing.clone(),
        }),
        "resub" => Some(Notification::ReSubscriber {
            display_name,
            plan_name: msg.tag("msg-param-sub-plan-name")?.to_string(),
            message: msg.trailing.clone(),
            months: msg
                .tag("msg-param-cumulative-months")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(1),
        }),
        "subgift" => Some(Notification::GiftedSubscription {
            recipient: msg.tag("msg-param-recipient-display-name")?.to_string(),
            gifter: display_name,
            plan_name: msg.tag("msg-param-sub-plan-name")?.to_string(),
            months: msg.tag("msg-param-months").unwrap_or("1").to_string(),
        }),
        "submysterygift" => Some(Notification::CommunitySubscription {
            gifter: display_name,
            plan_name: msg.tag("msg-param-sub-plan")?.to_string(),
            gifted_count: msg.tag("msg-param-mass-gift-count")?.to_string(),
        }),
        "raid" => Some(Notification::Raid {
            channel: msg
                .tag("msg-param-displayName")
                .or_else(|| msg.tag("msg-param-login"))?
                .to_string(),
            viewer_count: msg.tag("msg-param-viewerCount").unwrap_or("0").to_string(),
        }),
        other => {
            trace!(kind = other, "ignoring usernotice");
            None
        }
    }
}
