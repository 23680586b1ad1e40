//! Canonical event types.
//!
//! Every notification the normalizer accepts becomes one of these. The
//! `event_time` on each entry is capture time: it is stamped by the
//! aggregation store at the moment of recording and is strictly monotonic
//! per store, independent of any timestamp the source notification carried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a subscription came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    /// Purchased by the subscriber for themself, new or renewal.
    Regular,
    /// Purchased by one user for one named recipient.
    Gifted,
    /// A bulk gift purchased by one user for many random recipients.
    Community,
    /// Anything the current model does not recognize. Rendered as a
    /// degraded entry at compose time, never a hard failure.
    Unknown,
}

/// A subscription ledger entry. Never deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub user_display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gifted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gifted_count: Option<u32>,
    pub plan_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub months: u32,
    pub kind: SubscriptionKind,
    pub event_time: DateTime<Utc>,
}

impl SubscriptionInfo {
    /// A subscription the subscriber bought themself.
    pub fn regular(
        user_display_name: impl Into<String>,
        plan_name: impl Into<String>,
        message: Option<String>,
        months: u32,
    ) -> Self {
        Self {
            user_display_name: user_display_name.into(),
            gifted_by: None,
            gifted_count: None,
            plan_name: plan_name.into(),
            message: message.filter(|m| !m.trim().is_empty()),
            months,
            kind: SubscriptionKind::Regular,
            event_time: Utc::now(),
        }
    }

    /// A subscription gifted to a named recipient.
    pub fn gifted(
        recipient: impl Into<String>,
        gifter: impl Into<String>,
        plan_name: impl Into<String>,
        months: u32,
    ) -> Self {
        Self {
            user_display_name: recipient.into(),
            gifted_by: Some(gifter.into()),
            gifted_count: None,
            plan_name: plan_name.into(),
            message: None,
            months,
            kind: SubscriptionKind::Gifted,
            event_time: Utc::now(),
        }
    }

    /// A bulk community gift.
    pub fn community(
        gifter: impl Into<String>,
        plan_name: impl Into<String>,
        gifted_count: u32,
    ) -> Self {
        let gifter = gifter.into();
        Self {
            user_display_name: gifter.clone(),
            gifted_by: Some(gifter),
            gifted_count: Some(gifted_count),
            plan_name: plan_name.into(),
            message: None,
            months: 1,
            kind: SubscriptionKind::Community,
            event_time: Utc::now(),
        }
    }
}

/// A bits donation ledger entry. Never deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheerInfo {
    pub channel: String,
    pub bits: u32,
    pub event_time: DateTime<Utc>,
}

impl CheerInfo {
    pub fn new(channel: impl Into<String>, bits: u32) -> Self {
        Self {
            channel: channel.into(),
            bits,
            event_time: Utc::now(),
        }
    }
}

/// A channel hosting this one. Keyed by channel, last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub channel: String,
    pub viewer_count: u32,
    pub event_time: DateTime<Utc>,
}

impl HostInfo {
    pub fn new(channel: impl Into<String>, viewer_count: u32) -> Self {
        Self {
            channel: channel.into(),
            viewer_count,
            event_time: Utc::now(),
        }
    }
}

/// A raid, inbound or outbound depending on the event variant carrying it.
/// Inbound raids are keyed by channel, last-write-wins; the outbound raid
/// is a per-session singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidInfo {
    pub channel: String,
    pub viewer_count: u32,
    pub event_time: DateTime<Utc>,
}

impl RaidInfo {
    pub fn new(channel: impl Into<String>, viewer_count: u32) -> Self {
        Self {
            channel: channel.into(),
            viewer_count,
            event_time: Utc::now(),
        }
    }
}

/// A new follower announced by a third-party bot. Keyed by display name;
/// a repeat refreshes the timestamp but the name stays unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowerInfo {
    pub user_display_name: String,
    pub event_time: DateTime<Utc>,
}

impl FollowerInfo {
    pub fn new(user_display_name: impl Into<String>) -> Self {
        Self {
            user_display_name: user_display_name.into(),
            event_time: Utc::now(),
        }
    }
}

/// One canonical event produced by the normalizer and consumed by the
/// aggregation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SupportEvent {
    Subscription(SubscriptionInfo),
    Cheer(CheerInfo),
    Host(HostInfo),
    RaidInbound(RaidInfo),
    RaidOutbound(RaidInfo),
    Follow(FollowerInfo),
}
