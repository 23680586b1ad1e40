//! Helix API client for the startup roster fetch.
//!
//! Resolves the authenticated broadcaster id and loads the team membership
//! exactly once; the core consumes the resulting [`TeamRoster`] read-only.
//! Any failure here is fatal to session start: a session with an empty or
//! partial roster would silently welcome nobody.

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use chat_events::{TeamMember, TeamRoster};

use crate::error::{Result, TwitchChatError};

const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

#[derive(Debug, Deserialize)]
struct HelixUser {
    id: String,
    #[allow(dead_code)]
    login: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    data: Vec<HelixTeam>,
}

#[derive(Debug, Deserialize)]
struct HelixTeam {
    team_display_name: String,
    users: Vec<HelixTeamUser>,
}

#[derive(Debug, Deserialize)]
struct HelixTeamUser {
    user_id: String,
    user_login: String,
    user_name: String,
}

/// Thin Helix client scoped to what the roster collaborator needs.
#[derive(Debug, Clone)]
pub struct HelixClient {
    http: Client,
    client_id: String,
    access_token: String,
}

impl HelixClient {
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("stream-recap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            client_id: client_id.into(),
            access_token: access_token.into(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .header("Client-Id", &self.client_id)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TwitchChatError::api(format!("{url} returned {status}")));
        }
        Ok(response.json().await?)
    }

    /// Resolve the user the access token belongs to, i.e. the broadcaster.
    pub async fn authenticated_user_id(&self) -> Result<String> {
        let users: UsersResponse = self.get_json(&format!("{HELIX_BASE_URL}/users")).await?;
        let user = users
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchChatError::api("token resolves to no user"))?;
        info!(id = %user.id, name = %user.display_name, "resolved broadcaster");
        Ok(user.id)
    }

    /// Fetch the team membership for a team url slug and build the roster.
    pub async fn fetch_team_roster(&self, team_slug: &str) -> Result<TeamRoster> {
        let teams: TeamsResponse = self
            .get_json(&format!("{HELIX_BASE_URL}/teams?name={team_slug}"))
            .await?;
        let team = teams
            .data
            .into_iter()
            .next()
            .ok_or_else(|| TwitchChatError::api(format!("no team named {team_slug:?}")))?;

        let members = team.users.into_iter().map(|user| {
            let channel_url = format!("https://twitch.tv/{}", user.user_login);
            TeamMember::new(user.user_id, user.user_name, channel_url)
        });
        let roster = TeamRoster::new(team.team_display_name, members);
        info!(
            team = roster.team_name(),
            members = roster.len(),
            "loaded team roster"
        );
        Ok(roster)
    }
}
