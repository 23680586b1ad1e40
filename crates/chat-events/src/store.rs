//! Per-category aggregation of canonical events.
//!
//! Each category is an independently lockable collection with its own merge
//! rule: subscriptions and cheers append, hosts and inbound raids replace by
//! channel, followers replace by name, and the outbound raid is a
//! last-write-wins singleton. No operation touches two categories at once,
//! so there is no cross-category lock ordering to get wrong.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::event::{
    CheerInfo, FollowerInfo, HostInfo, RaidInfo, SubscriptionInfo, SupportEvent,
};

/// Issues capture timestamps that are strictly increasing per store, even
/// when the wall clock ticks slower than events arrive.
#[derive(Debug, Default)]
struct CaptureClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl CaptureClock {
    fn stamp(&self) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let mut now = Utc::now();
        if let Some(prev) = *last
            && now <= prev
        {
            now = prev + Duration::microseconds(1);
        }
        *last = Some(now);
        now
    }
}

/// A consistent point-in-time view of all categories. Each category is read
/// atomically; categories are not mutually time-aligned beyond that.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreSnapshot {
    pub subscriptions: Vec<SubscriptionInfo>,
    pub cheers: Vec<CheerInfo>,
    pub followers: Vec<FollowerInfo>,
    pub raids: Vec<RaidInfo>,
    pub hosts: Vec<HostInfo>,
    pub outbound_raid: Option<RaidInfo>,
}

impl StoreSnapshot {
    /// True when no supporter category holds any entry. The outbound raid
    /// is not a supporter category.
    pub fn has_supporters(&self) -> bool {
        !self.subscriptions.is_empty()
            || !self.cheers.is_empty()
            || !self.followers.is_empty()
            || !self.raids.is_empty()
            || !self.hosts.is_empty()
    }
}

/// Thread-safe event ledger for one session. Created on session start,
/// never cleared; composing a report only reads it.
#[derive(Debug, Default)]
pub struct AggregationStore {
    clock: CaptureClock,
    subscriptions: Mutex<Vec<SubscriptionInfo>>,
    cheers: Mutex<Vec<CheerInfo>>,
    followers: Mutex<FxHashMap<String, FollowerInfo>>,
    raids: Mutex<FxHashMap<String, RaidInfo>>,
    hosts: Mutex<FxHashMap<String, HostInfo>>,
    outbound_raid: Mutex<Option<RaidInfo>>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one canonical event, applying the category's merge rule under
    /// that category's lock. The capture timestamp is assigned here.
    pub fn record(&self, event: SupportEvent) {
        let stamp = self.clock.stamp();
        match event {
            SupportEvent::Subscription(mut info) => {
                info.event_time = stamp;
                self.subscriptions.lock().push(info);
            }
            SupportEvent::Cheer(mut info) => {
                info.event_time = stamp;
                self.cheers.lock().push(info);
            }
            SupportEvent::Follow(mut info) => {
                info.event_time = stamp;
                self.followers
                    .lock()
                    .insert(info.user_display_name.clone(), info);
            }
            SupportEvent::RaidInbound(mut info) => {
                info.event_time = stamp;
                self.raids.lock().insert(info.channel.clone(), info);
            }
            SupportEvent::Host(mut info) => {
                info.event_time = stamp;
                self.hosts.lock().insert(info.channel.clone(), info);
            }
            SupportEvent::RaidOutbound(mut info) => {
                info.event_time = stamp;
                *self.outbound_raid.lock() = Some(info);
            }
        }
    }

    /// Clone every category under its own lock. Never observes a
    /// partially-applied `record` call.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            subscriptions: self.subscriptions.lock().clone(),
            cheers: self.cheers.lock().clone(),
            followers: self.followers.lock().values().cloned().collect(),
            raids: self.raids.lock().values().cloned().collect(),
            hosts: self.hosts.lock().values().cloned().collect(),
            outbound_raid: self.outbound_raid.lock().clone(),
        }
    }
}
