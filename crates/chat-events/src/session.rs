//! Session orchestrator wiring the core components together.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::Utc;

use crate::announce::{AnnouncementPolicy, WelcomeRequest};
use crate::error::Result;
use crate::normalizer::{EventNormalizer, NormalizerConfig};
use crate::notification::Notification;
use crate::report::ReportComposer;
use crate::roster::TeamRoster;
use crate::store::{AggregationStore, StoreSnapshot};

/// One live session: normalizes incoming notifications, records the
/// resulting events, and decides welcome announcements. All entry points
/// take `&self` and are safe for concurrent producers.
#[derive(Debug)]
pub struct StreamSession {
    normalizer: EventNormalizer,
    store: AggregationStore,
    policy: AnnouncementPolicy,
    composer: ReportComposer,
    approximate_viewers: AtomicU32,
}

impl StreamSession {
    pub fn new(config: NormalizerConfig, roster: Arc<TeamRoster>) -> Self {
        let policy = AnnouncementPolicy::new(roster, &config.broadcaster_id);
        Self {
            normalizer: EventNormalizer::new(config),
            store: AggregationStore::new(),
            policy,
            composer: ReportComposer::new(),
            approximate_viewers: AtomicU32::new(0),
        }
    }

    /// Handle one notification: evaluate the welcome policy for chat
    /// message authors, then record every event the normalizer yields.
    /// A malformed notification returns the error after touching nothing.
    pub fn handle(&self, notification: &Notification) -> Result<Option<WelcomeRequest>> {
        let events = self
            .normalizer
            .normalize(notification, self.approximate_viewers.load(Ordering::Relaxed))?;

        let welcome = match notification {
            Notification::Message(msg) => self.policy.evaluate(&msg.user_id, &msg.username),
            _ => None,
        };

        for event in events {
            self.store.record(event);
        }
        Ok(welcome)
    }

    /// Update the approximate viewer count from presence information. Only
    /// the latest snapshot is kept; there is no history.
    pub fn set_approximate_viewers(&self, count: u32) {
        self.approximate_viewers.store(count, Ordering::Relaxed);
    }

    pub fn approximate_viewers(&self) -> u32 {
        self.approximate_viewers.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &AggregationStore {
        &self.store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Compose the report for the current snapshot. Safe to call while
    /// `handle` runs on other threads.
    pub fn compose_report(&self) -> String {
        self.composer.compose(&self.store.snapshot(), Utc::now())
    }
}
