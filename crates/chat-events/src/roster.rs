//! Team roster supplied once at startup.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One affiliated member of the broadcaster's team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    /// Platform user id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// URL of the member's own channel.
    pub channel_url: String,
}

impl TeamMember {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        channel_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            channel_url: channel_url.into(),
        }
    }
}

/// Immutable member-id to member mapping, loaded once by the roster
/// collaborator and consulted read-only for the lifetime of the session.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    team_name: String,
    members: FxHashMap<String, TeamMember>,
}

impl TeamRoster {
    pub fn new(
        team_name: impl Into<String>,
        members: impl IntoIterator<Item = TeamMember>,
    ) -> Self {
        Self {
            team_name: team_name.into(),
            members: members
                .into_iter()
                .map(|member| (member.id.clone(), member))
                .collect(),
        }
    }

    /// Display name of the team.
    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    /// Look up a member by platform user id.
    pub fn member(&self, id: &str) -> Option<&TeamMember> {
        self.members.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_lookup() {
        let roster = TeamRoster::new(
            "Live Coders",
            [
                TeamMember::new("100", "alpha", "https://twitch.tv/alpha"),
                TeamMember::new("200", "beta", "https://twitch.tv/beta"),
            ],
        );

        assert_eq!(roster.len(), 2);
        assert_eq!(roster.team_name(), "Live Coders");
        assert_eq!(roster.member("100").unwrap().display_name, "alpha");
        assert!(roster.contains("200"));
        assert!(!roster.contains("300"));
    }
}
