//! Welcome announcement policy for team members.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::roster::TeamRoster;

/// A request to send one welcome message. Rendering and delivery belong to
/// the transport; the policy only decides that a welcome is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeRequest {
    /// Chat username of the member being welcomed.
    pub username: String,
    /// Display name from the roster.
    pub display_name: String,
    /// The member's own channel URL from the roster.
    pub channel_url: String,
    /// Display name of the team.
    pub team_name: String,
}

/// Decides, at most once per member per session, whether a welcome message
/// should go out. The broadcaster's own id is pre-seeded so they never
/// welcome themselves.
#[derive(Debug)]
pub struct AnnouncementPolicy {
    roster: Arc<TeamRoster>,
    welcomed: Mutex<FxHashSet<String>>,
}

impl AnnouncementPolicy {
    pub fn new(roster: Arc<TeamRoster>, broadcaster_id: &str) -> Self {
        let mut welcomed = FxHashSet::default();
        welcomed.insert(broadcaster_id.to_string());
        Self {
            roster,
            welcomed: Mutex::new(welcomed),
        }
    }

    /// Evaluate one message author. Returns a request exactly once per
    /// roster member id for the session lifetime; the add-if-absent insert
    /// under the lock keeps that true even when callers race.
    pub fn evaluate(&self, user_id: &str, username: &str) -> Option<WelcomeRequest> {
        let member = self.roster.member(user_id)?;
        if !self.welcomed.lock().insert(user_id.to_string()) {
            return None;
        }
        Some(WelcomeRequest {
            username: username.to_string(),
            display_name: member.display_name.clone(),
            channel_url: member.channel_url.clone(),
            team_name: self.roster.team_name().to_string(),
        })
    }
}
