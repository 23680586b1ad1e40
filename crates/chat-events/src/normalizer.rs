//! Normalization of raw notifications into canonical events.
//!
//! Chat messages run through an ordered pipeline of independent classifiers
//! (outbound raid command, follow announcement, cheer); each returns an
//! optional event, so a single message may yield zero, one or two events
//! and new detectors slot in without touching the existing ones.

use regex::Regex;
use tracing::trace;

use crate::error::{EventError, Result};
use crate::event::{
    CheerInfo, FollowerInfo, HostInfo, RaidInfo, SubscriptionInfo, SupportEvent,
};
use crate::notification::{ChatMessage, Notification};

/// Capture group the follow pattern must define.
const FOLLOW_CAPTURE_GROUP: &str = "username";

/// Identity and pattern configuration for the normalizer. All identities
/// are injected; the classification logic carries no literal ids.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// User id of the broadcaster, the only author allowed to trigger the
    /// outbound raid command.
    pub broadcaster_id: String,
    /// User id of the third-party bot that announces new followers.
    pub follow_announcer_id: String,
    /// Announcement text pattern with a `username` capture group.
    pub follow_pattern: Regex,
    /// Literal prefix of the outbound raid chat command.
    pub raid_command_prefix: String,
}

impl NormalizerConfig {
    pub fn new(
        broadcaster_id: impl Into<String>,
        follow_announcer_id: impl Into<String>,
        follow_pattern: &str,
        raid_command_prefix: impl Into<String>,
    ) -> Result<Self> {
        let follow_pattern = Regex::new(follow_pattern)?;
        if !follow_pattern
            .capture_names()
            .flatten()
            .any(|name| name == FOLLOW_CAPTURE_GROUP)
        {
            return Err(EventError::PatternMissingGroup);
        }
        Ok(Self {
            broadcaster_id: broadcaster_id.into(),
            follow_announcer_id: follow_announcer_id.into(),
            follow_pattern,
            raid_command_prefix: raid_command_prefix.into(),
        })
    }
}

type MessageClassifier = fn(&EventNormalizer, &ChatMessage, u32) -> Option<SupportEvent>;

/// Maps each raw notification into zero or more canonical events.
#[derive(Debug)]
pub struct EventNormalizer {
    config: NormalizerConfig,
}

impl EventNormalizer {
    /// Message classifiers in evaluation order.
    const MESSAGE_PIPELINE: [MessageClassifier; 3] = [
        Self::classify_outbound_raid,
        Self::classify_follow_announcement,
        Self::classify_cheer,
    ];

    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize one notification. `approximate_viewers` is the current
    /// viewer count snapshot, consumed by the outbound raid classifier.
    ///
    /// A malformed numeric field fails only this notification; the
    /// normalizer itself is stateless and unaffected for later calls.
    pub fn normalize(
        &self,
        notification: &Notification,
        approximate_viewers: u32,
    ) -> Result<Vec<SupportEvent>> {
        match notification {
            Notification::Message(msg) => Ok(self.classify_message(msg, approximate_viewers)),
            Notification::BeingHosted {
                channel,
                auto_host: true,
                ..
            } => {
                trace!(channel, "dropping auto-host notification");
                Ok(Vec::new())
            }
            Notification::BeingHosted {
                channel, viewers, ..
            } => Ok(vec![SupportEvent::Host(HostInfo::new(channel, *viewers))]),
            Notification::Raid {
                channel,
                viewer_count,
            } => {
                let viewers = parse_field("raid", "viewer_count", viewer_count)?;
                Ok(vec![SupportEvent::RaidInbound(RaidInfo::new(
                    channel, viewers,
                ))])
            }
            Notification::NewSubscriber {
                display_name,
                plan_name,
                message,
            } => Ok(vec![SupportEvent::Subscription(SubscriptionInfo::regular(
                display_name,
                plan_name,
                message.clone(),
                1,
            ))]),
            Notification::ReSubscriber {
                display_name,
                plan_name,
                message,
                months,
            } => Ok(vec![SupportEvent::Subscription(SubscriptionInfo::regular(
                display_name,
                plan_name,
                message.clone(),
                *months,
            ))]),
            Notification::GiftedSubscription {
                recipient,
                gifter,
                plan_name,
                months,
            } => {
                let months = parse_field("gifted_subscription", "months", months)?;
                Ok(vec![SupportEvent::Subscription(SubscriptionInfo::gifted(
                    recipient, gifter, plan_name, months,
                ))])
            }
            Notification::CommunitySubscription {
                gifter,
                plan_name,
                gifted_count,
            } => {
                let count = parse_field("community_subscription", "gifted_count", gifted_count)?;
                Ok(vec![SupportEvent::Subscription(
                    SubscriptionInfo::community(gifter, plan_name, count),
                )])
            }
        }
    }

    fn classify_message(&self, msg: &ChatMessage, approximate_viewers: u32) -> Vec<SupportEvent> {
        Self::MESSAGE_PIPELINE
            .iter()
            .filter_map(|classify| classify(self, msg, approximate_viewers))
            .collect()
    }

    /// The broadcaster typing the raid command at stream end. The viewer
    /// count is the approximate snapshot at the moment of initiation.
    fn classify_outbound_raid(
        &self,
        msg: &ChatMessage,
        approximate_viewers: u32,
    ) -> Option<SupportEvent> {
        if msg.user_id != self.config.broadcaster_id {
            return None;
        }
        let destination = msg.text.strip_prefix(&self.config.raid_command_prefix)?;
        Some(SupportEvent::RaidOutbound(RaidInfo::new(
            destination.trim(),
            approximate_viewers,
        )))
    }

    /// A third-party bot announcing a new follower in plain chat text.
    fn classify_follow_announcement(
        &self,
        msg: &ChatMessage,
        _approximate_viewers: u32,
    ) -> Option<SupportEvent> {
        if msg.user_id != self.config.follow_announcer_id {
            return None;
        }
        let captures = self.config.follow_pattern.captures(&msg.text)?;
        let follower = captures.name(FOLLOW_CAPTURE_GROUP)?;
        Some(SupportEvent::Follow(FollowerInfo::new(follower.as_str())))
    }

    /// Bits attached to any message, independent of its other content.
    fn classify_cheer(&self, msg: &ChatMessage, _approximate_viewers: u32) -> Option<SupportEvent> {
        if msg.bits == 0 {
            return None;
        }
        Some(SupportEvent::Cheer(CheerInfo::new(
            msg.username.clone(),
            msg.bits,
        )))
    }
}

fn parse_field(notification: &'static str, field: &'static str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| EventError::malformed(notification, field, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROADCASTER_ID: &str = "61809127";
    const ANNOUNCER_ID: &str = "100135110";

    fn normalizer() -> EventNormalizer {
        let config = NormalizerConfig::new(
            BROADCASTER_ID,
            ANNOUNCER_ID,
            "Welcome to the class (?<username>[^!]+)!",
            "/raid ",
        )
        .unwrap();
        EventNormalizer::new(config)
    }

    fn message(user_id: &str, text: &str, bits: u32) -> Notification {
        Notification::Message(ChatMessage {
            user_id: user_id.to_string(),
            username: "someone".to_string(),
            channel: "main".to_string(),
            text: text.to_string(),
            bits,
        })
    }

    #[test]
    fn test_config_rejects_pattern_without_username_group() {
        let result = NormalizerConfig::new("1", "2", "Welcome (\\w+)!", "/raid ");
        assert!(matches!(result, Err(EventError::PatternMissingGroup)));
    }

    #[test]
    fn test_auto_host_dropped_silently() {
        let events = normalizer()
            .normalize(
                &Notification::BeingHosted {
                    channel: "autohoster".to_string(),
                    viewers: 12,
                    auto_host: true,
                },
                0,
            )
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_manual_host_normalizes() {
        let events = normalizer()
            .normalize(
                &Notification::BeingHosted {
                    channel: "tbdgamer".to_string(),
                    viewers: 0,
                    auto_host: false,
                },
                0,
            )
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [SupportEvent::Host(host)] if host.channel == "tbdgamer" && host.viewer_count == 0
        ));
    }

    #[test]
    fn test_outbound_raid_from_broadcaster() {
        let events = normalizer()
            .normalize(&message(BROADCASTER_ID, "/raid LuckyNoS7evin", 0), 23)
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [SupportEvent::RaidOutbound(raid)]
                if raid.channel == "LuckyNoS7evin" && raid.viewer_count == 23
        ));
    }

    #[test]
    fn test_raid_command_from_viewer_ignored() {
        let events = normalizer()
            .normalize(&message("555", "/raid LuckyNoS7evin", 0), 23)
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_follow_announcement_extracts_username() {
        let events = normalizer()
            .normalize(
                &message(ANNOUNCER_ID, "Welcome to the class rexogamerswitch!", 0),
                0,
            )
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [SupportEvent::Follow(follow)] if follow.user_display_name == "rexogamerswitch"
        ));
    }

    #[test]
    fn test_follow_text_from_other_author_ignored() {
        let events = normalizer()
            .normalize(&message("555", "Welcome to the class impostor!", 0), 0)
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_bits_yield_cheer_regardless_of_content() {
        let events = normalizer()
            .normalize(&message("555", "cheer100 great stream", 100), 0)
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [SupportEvent::Cheer(cheer)] if cheer.bits == 100
        ));
    }

    #[test]
    fn test_broadcaster_raid_with_bits_yields_two_events() {
        let events = normalizer()
            .normalize(&message(BROADCASTER_ID, "/raid friend", 50), 10)
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SupportEvent::RaidOutbound(_)));
        assert!(matches!(events[1], SupportEvent::Cheer(_)));
    }

    #[test]
    fn test_malformed_gift_months_is_an_error() {
        let result = normalizer().normalize(
            &Notification::GiftedSubscription {
                recipient: "lucky".to_string(),
                gifter: "generous".to_string(),
                plan_name: "Tier 1".to_string(),
                months: "not-a-number".to_string(),
            },
            0,
        );
        assert!(matches!(
            result,
            Err(EventError::MalformedField { field: "months", .. })
        ));
    }

    #[test]
    fn test_malformed_event_does_not_poison_later_ones() {
        let n = normalizer();
        let bad = Notification::CommunitySubscription {
            gifter: "generous".to_string(),
            plan_name: "1000".to_string(),
            gifted_count: String::new(),
        };
        assert!(n.normalize(&bad, 0).is_err());

        let good = Notification::CommunitySubscription {
            gifter: "generous".to_string(),
            plan_name: "1000".to_string(),
            gifted_count: "5".to_string(),
        };
        let events = n.normalize(&good, 0).unwrap();
        assert!(matches!(
            events.as_slice(),
            [SupportEvent::Subscription(sub)] if sub.gifted_count == Some(5)
        ));
    }

    #[test]
    fn test_resubscriber_keeps_months_and_message() {
        let events = normalizer()
            .normalize(
                &Notification::ReSubscriber {
                    display_name: "regular_viewer".to_string(),
                    plan_name: "Channel Subscription".to_string(),
                    message: Some("love the streams".to_string()),
                    months: 14,
                },
                0,
            )
            .unwrap();
        assert!(matches!(
            events.as_slice(),
            [SupportEvent::Subscription(sub)]
                if sub.months == 14 && sub.message.as_deref() == Some("love the streams")
        ));
    }
}
