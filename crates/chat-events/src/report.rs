//! Deterministic session report composition.
//!
//! The composer only reads a [`StoreSnapshot`]; given the same snapshot it
//! always produces the same markdown document, regardless of the order the
//! snapshot's entries were recorded or appear in.

use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::warn;

use crate::event::{SubscriptionInfo, SubscriptionKind};
use crate::store::StoreSnapshot;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders the canonical session summary document.
#[derive(Debug, Default)]
pub struct ReportComposer;

impl ReportComposer {
    pub fn new() -> Self {
        Self
    }

    /// Compose the full document. An entry the composer cannot render
    /// degrades to an "unrecognized" line with a diagnostic; it never
    /// aborts the rest of the report.
    pub fn compose(&self, snapshot: &StoreSnapshot, generated_at: DateTime<Utc>) -> String {
        let mut doc = String::new();

        let _ = write!(
            doc,
            "---\n\
             title: 'S0000 - TODO: stream title'\n\
             categories: streams\n\
             date: {}\n\
             youtube_url: https://youtu.be/TODO\n\
             youtube_embed: https://www.youtube.com/embed/TODO\n\
             ---\n\n\
             TODO: stream notes about what you actually accomplished\n\n",
            generated_at.format(TIME_FORMAT)
        );

        if snapshot.has_supporters() {
            doc.push_str("## Today's Supporters\n\n");
            self.compose_subscriptions(&mut doc, snapshot);
            self.compose_cheers(&mut doc, snapshot);
            self.compose_followers(&mut doc, snapshot);
            self.compose_raids(&mut doc, snapshot);
            self.compose_hosts(&mut doc, snapshot);
        }

        if let Some(raid) = &snapshot.outbound_raid {
            doc.push_str("## Pay it forward\n\n");
            let viewer_text = if raid.viewer_count > 0 {
                format!(" with {} viewers", raid.viewer_count)
            } else {
                String::new()
            };
            let _ = writeln!(
                doc,
                "- {}: we raided [{}](//twitch.tv/{}){}!",
                raid.event_time.format(TIME_FORMAT),
                raid.channel,
                raid.channel,
                viewer_text,
            );
            doc.push('\n');
        }

        doc
    }

    fn compose_subscriptions(&self, doc: &mut String, snapshot: &StoreSnapshot) {
        if snapshot.subscriptions.is_empty() {
            return;
        }
        doc.push_str("### Subscriptions\n\n");

        let mut unrecognized = 0u32;
        let mut subs: Vec<&SubscriptionInfo> = snapshot.subscriptions.iter().collect();
        subs.sort_by_key(|sub| sub.event_time);
        for sub in subs {
            let line = match render_subscription(sub) {
                Ok(line) => line,
                Err(diagnostic) => {
                    unrecognized += 1;
                    warn!(
                        user = %sub.user_display_name,
                        "skipping subscription detail: {diagnostic}"
                    );
                    format!("unrecognized subscription from {}!", sub.user_display_name)
                }
            };
            let _ = writeln!(doc, "- {}: {}", sub.event_time.format(TIME_FORMAT), line);
        }
        doc.push('\n');

        if unrecognized > 0 {
            warn!(count = unrecognized, "report contains unrecognized subscription entries");
        }
    }

    fn compose_cheers(&self, doc: &mut String, snapshot: &StoreSnapshot) {
        if snapshot.cheers.is_empty() {
            return;
        }
        doc.push_str("### Cheers\n\n");
        let mut cheers: Vec<_> = snapshot.cheers.iter().collect();
        cheers.sort_by_key(|cheer| cheer.event_time);
        for cheer in cheers {
            let _ = writeln!(
                doc,
                "- {}: {} cheered with {} bits!",
                cheer.event_time.format(TIME_FORMAT),
                cheer.channel,
                group_thousands(cheer.bits),
            );
        }
        doc.push('\n');
    }

    fn compose_followers(&self, doc: &mut String, snapshot: &StoreSnapshot) {
        if snapshot.followers.is_empty() {
            return;
        }
        doc.push_str("### Followers\n\n");
        let mut followers: Vec<_> = snapshot.followers.iter().collect();
        followers.sort_by_key(|follower| follower.event_time);
        for follower in followers {
            let _ = writeln!(
                doc,
                "- {}: {}",
                follower.event_time.format(TIME_FORMAT),
                follower.user_display_name,
            );
        }
        doc.push('\n');
    }

    fn compose_raids(&self, doc: &mut String, snapshot: &StoreSnapshot) {
        if snapshot.raids.is_empty() {
            return;
        }
        doc.push_str("### Raids\n\n");
        let mut raids: Vec<_> = snapshot.raids.iter().collect();
        raids.sort_by_key(|raid| raid.event_time);
        for raid in raids {
            let _ = writeln!(
                doc,
                "- {}: [{}](//twitch.tv/{}) raided with {} viewers!",
                raid.event_time.format(TIME_FORMAT),
                raid.channel,
                raid.channel,
                raid.viewer_count,
            );
        }
        doc.push('\n');
    }

    fn compose_hosts(&self, doc: &mut String, snapshot: &StoreSnapshot) {
        if snapshot.hosts.is_empty() {
            return;
        }
        doc.push_str("### Hosts\n\n");
        let mut hosts: Vec<_> = snapshot.hosts.iter().collect();
        hosts.sort_by_key(|host| host.event_time);
        for host in hosts {
            let _ = writeln!(
                doc,
                "- {}: [{}](//twitch.tv/{}) hosted with {} viewers!",
                host.event_time.format(TIME_FORMAT),
                host.channel,
                host.channel,
                host.viewer_count,
            );
        }
        doc.push('\n');
    }
}

/// Render one subscription entry, dispatched on its kind. An unknown kind
/// is a recoverable diagnostic, not a failure of the whole report.
fn render_subscription(sub: &SubscriptionInfo) -> Result<String, String> {
    match sub.kind {
        SubscriptionKind::Community => {
            let gifter = sub.gifted_by.as_deref().unwrap_or("someone");
            let count = sub.gifted_count.unwrap_or(1);
            Ok(format!(
                "{} gifted {} {} subscriptions!",
                gifter, count, sub.plan_name
            ))
        }
        SubscriptionKind::Gifted => {
            let gifter = sub.gifted_by.as_deref().unwrap_or("someone");
            if sub.months > 1 {
                Ok(format!(
                    "{} gifted {} a {} subscription! They are on a {} month streak!",
                    gifter, sub.user_display_name, sub.plan_name, sub.months
                ))
            } else {
                Ok(format!(
                    "{} gifted {} a {} subscription!",
                    gifter, sub.user_display_name, sub.plan_name
                ))
            }
        }
        SubscriptionKind::Regular => {
            let message = sub
                .message
                .as_deref()
                .map(|m| format!("\n  - message: {m}"))
                .unwrap_or_default();
            if sub.months > 1 {
                Ok(format!(
                    "{} resubscribed with a {} subscription! They are on a {} month streak!{}",
                    sub.user_display_name, sub.plan_name, sub.months, message
                ))
            } else {
                Ok(format!(
                    "{} subscribed with a {} subscription!{}",
                    sub.user_display_name, sub.plan_name, message
                ))
            }
        }
        SubscriptionKind::Unknown => Err("unknown subscription kind".to_string()),
    }
}

/// Format a number with thousands separators ("1500" -> "1,500").
fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{CheerInfo, FollowerInfo, HostInfo, RaidInfo};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn stamped<T>(mut info: T, secs: i64, set: impl Fn(&mut T, DateTime<Utc>)) -> T {
        set(&mut info, at(secs));
        info
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(100), "100");
        assert_eq!(group_thousands(1500), "1,500");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_empty_snapshot_has_no_sections() {
        let doc = ReportComposer::new().compose(&StoreSnapshot::default(), at(0));
        assert!(doc.starts_with("---\n"));
        assert!(!doc.contains("## Today's Supporters"));
        assert!(!doc.contains("## Pay it forward"));
    }

    #[test]
    fn test_host_line_with_zero_viewers() {
        let snapshot = StoreSnapshot {
            hosts: vec![stamped(HostInfo::new("tbdgamer", 0), 1, |h, t| {
                h.event_time = t
            })],
            ..Default::default()
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));
        assert!(doc.contains("[tbdgamer](//twitch.tv/tbdgamer) hosted with 0 viewers!"));
        // Exactly one host line.
        assert_eq!(doc.matches("hosted with").count(), 1);
    }

    #[test]
    fn test_pay_it_forward_with_viewers() {
        let snapshot = StoreSnapshot {
            outbound_raid: Some(stamped(RaidInfo::new("LuckyNoS7evin", 23), 1, |r, t| {
                r.event_time = t
            })),
            ..Default::default()
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));
        assert!(doc.contains("## Pay it forward"));
        assert!(doc.contains("we raided [LuckyNoS7evin](//twitch.tv/LuckyNoS7evin) with 23 viewers!"));
    }

    #[test]
    fn test_pay_it_forward_omits_zero_viewer_text() {
        let snapshot = StoreSnapshot {
            outbound_raid: Some(RaidInfo::new("LuckyNoS7evin", 0)),
            ..Default::default()
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));
        assert!(doc.contains("we raided [LuckyNoS7evin](//twitch.tv/LuckyNoS7evin)!"));
        assert!(!doc.contains("with 0 viewers"));
    }

    #[test]
    fn test_two_identical_cheers_render_two_lines() {
        let snapshot = StoreSnapshot {
            cheers: vec![
                stamped(CheerInfo::new("tbdgamer", 100), 1, |c, t| c.event_time = t),
                stamped(CheerInfo::new("tbdgamer", 100), 2, |c, t| c.event_time = t),
            ],
            ..Default::default()
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));
        assert_eq!(doc.matches("tbdgamer cheered with 100 bits!").count(), 2);
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let snapshot = StoreSnapshot {
            subscriptions: vec![SubscriptionInfo::regular("subber", "Tier 1", None, 1)],
            cheers: vec![CheerInfo::new("cheerer", 50)],
            followers: vec![FollowerInfo::new("follower")],
            raids: vec![RaidInfo::new("raider", 5)],
            hosts: vec![HostInfo::new("hoster", 2)],
            outbound_raid: Some(RaidInfo::new("friend", 0)),
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));

        let positions: Vec<usize> = [
            "### Subscriptions",
            "### Cheers",
            "### Followers",
            "### Raids",
            "### Hosts",
            "## Pay it forward",
        ]
        .iter()
        .map(|section| doc.find(section).expect(section))
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_entries_ordered_by_capture_time() {
        let snapshot = StoreSnapshot {
            cheers: vec![
                stamped(CheerInfo::new("later", 2), 5, |c, t| c.event_time = t),
                stamped(CheerInfo::new("earlier", 1), 1, |c, t| c.event_time = t),
            ],
            ..Default::default()
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));
        assert!(doc.find("earlier cheered").unwrap() < doc.find("later cheered").unwrap());
    }

    #[test]
    fn test_compose_invariant_under_entry_permutation() {
        let subs = vec![
            stamped(
                SubscriptionInfo::regular("one", "Tier 1", None, 1),
                1,
                |s, t| s.event_time = t,
            ),
            stamped(
                SubscriptionInfo::gifted("two", "generous", "Tier 1", 1),
                2,
                |s, t| s.event_time = t,
            ),
            stamped(
                SubscriptionInfo::community("bulk", "Tier 1", 5),
                3,
                |s, t| s.event_time = t,
            ),
        ];
        let cheers = vec![
            stamped(CheerInfo::new("a", 10), 4, |c, t| c.event_time = t),
            stamped(CheerInfo::new("b", 20), 5, |c, t| c.event_time = t),
        ];

        let forward = StoreSnapshot {
            subscriptions: subs.clone(),
            cheers: cheers.clone(),
            ..Default::default()
        };
        let reversed = StoreSnapshot {
            subscriptions: subs.into_iter().rev().collect(),
            cheers: cheers.into_iter().rev().collect(),
            ..Default::default()
        };

        let composer = ReportComposer::new();
        assert_eq!(composer.compose(&forward, at(10)), composer.compose(&reversed, at(10)));
    }

    #[test]
    fn test_subscription_lines() {
        let community = SubscriptionInfo::community("generous", "Tier 1", 5);
        assert_eq!(
            render_subscription(&community).unwrap(),
            "generous gifted 5 Tier 1 subscriptions!"
        );

        let gifted_streak = SubscriptionInfo::gifted("lucky", "generous", "Tier 1", 4);
        assert_eq!(
            render_subscription(&gifted_streak).unwrap(),
            "generous gifted lucky a Tier 1 subscription! They are on a 4 month streak!"
        );

        let gifted = SubscriptionInfo::gifted("lucky", "generous", "Tier 1", 1);
        assert_eq!(
            render_subscription(&gifted).unwrap(),
            "generous gifted lucky a Tier 1 subscription!"
        );

        let resub = SubscriptionInfo::regular(
            "regular_viewer",
            "Tier 1",
            Some("great content".to_string()),
            7,
        );
        assert_eq!(
            render_subscription(&resub).unwrap(),
            "regular_viewer resubscribed with a Tier 1 subscription! They are on a 7 month streak!\n  - message: great content"
        );

        let new_sub = SubscriptionInfo::regular("newcomer", "Tier 1", None, 1);
        assert_eq!(
            render_subscription(&new_sub).unwrap(),
            "newcomer subscribed with a Tier 1 subscription!"
        );
    }

    #[test]
    fn test_unknown_kind_degrades_without_aborting() {
        let mut odd = SubscriptionInfo::regular("mystery", "Tier 1", None, 1);
        odd.kind = SubscriptionKind::Unknown;
        let snapshot = StoreSnapshot {
            subscriptions: vec![
                stamped(odd, 1, |s, t| s.event_time = t),
                stamped(
                    SubscriptionInfo::regular("fine", "Tier 1", None, 1),
                    2,
                    |s, t| s.event_time = t,
                ),
            ],
            ..Default::default()
        };
        let doc = ReportComposer::new().compose(&snapshot, at(10));
        assert!(doc.contains("unrecognized subscription from mystery!"));
        assert!(doc.contains("fine subscribed with a Tier 1 subscription!"));
    }
}
