//! Client for the FTC events API: event teams and their rankings.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::ScoutConfig;
use crate::storage::TeamNumber;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Rank used for sorting teams that have not played yet
const UNRANKED: u32 = 999;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API credentials not configured. Set them in Admin settings.")]
    MissingCredentials,

    #[error("Failed to fetch {what}: HTTP {status} {text}")]
    Status {
        what: &'static str,
        status: u16,
        text: String,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Team {
    pub team_number: TeamNumber,
    pub name_short: String,
    pub name_full: String,
    pub city: Option<String>,
    pub state_prov: Option<String>,
    pub country: Option<String>,
    pub rookie_year: Option<u32>,
}

impl Team {
    /// Short name, falling back to the full name
    pub fn display_name(&self) -> &str {
        if self.name_short.is_empty() {
            &self.name_full
        } else {
            &self.name_short
        }
    }

    /// "City, State", whichever parts are known
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.state_prov.as_deref()) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(part), None) | (None, Some(part)) => Some(part.to_owned()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ranking {
    pub rank: u32,
    pub team_number: TeamNumber,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub qualifying_points: f64,
    pub ranking_points: f64,
    pub opr: Option<f64>,
    pub np: Option<f64>,
    pub tbp: Option<f64>,
}

impl Ranking {
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamWithRanking {
    #[serde(flatten)]
    pub team: Team,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranking: Option<Ranking>,
}

impl TeamWithRanking {
    pub fn rank(&self) -> Option<u32> {
        self.ranking.as_ref().map(|ranking| ranking.rank)
    }
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    #[serde(default)]
    teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
struct RankingsResponse {
    #[serde(rename = "Rankings", default)]
    rankings: Vec<Ranking>,
}

/// FTC API login, kept with the app state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub auth_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth_key: auth_key.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.auth_key.trim().is_empty()
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.auth_key);
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }
}

/// Blocking HTTP client; call it off the UI thread
#[derive(Debug, Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    season: u32,
}

impl ApiClient {
    pub fn new(base_url: &str, season: u32) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            season,
        }
    }

    pub fn from_config(config: &ScoutConfig) -> Self {
        Self::new(&config.api_base_url, config.season)
    }

    pub fn teams_url(&self) -> String {
        format!("{}/{}/teams", self.base_url, self.season)
    }

    pub fn rankings_url(&self, event_code: &str) -> String {
        format!("{}/{}/rankings/{}", self.base_url, self.season, event_code)
    }

    pub fn fetch_teams(&self, credentials: &Credentials, event_code: &str) -> ApiResult<Vec<Team>> {
        let request = self.agent.get(&self.teams_url()).query("eventCode", event_code);
        let response: TeamsResponse = self.call(request, credentials, "teams")?;
        log::debug!("Fetched {} teams for {}", response.teams.len(), event_code);
        Ok(response.teams)
    }

    pub fn fetch_rankings(&self, credentials: &Credentials, event_code: &str) -> ApiResult<Vec<Ranking>> {
        let request = self.agent.get(&self.rankings_url(event_code));
        let response: RankingsResponse = self.call(request, credentials, "rankings")?;
        log::debug!("Fetched {} rankings for {}", response.rankings.len(), event_code);
        Ok(response.rankings)
    }

    pub fn fetch_teams_with_rankings(
        &self,
        credentials: &Credentials,
        event_code: &str,
    ) -> ApiResult<Vec<TeamWithRanking>> {
        let teams = self.fetch_teams(credentials, event_code)?;
        let rankings = self.fetch_rankings(credentials, event_code)?;
        Ok(merge_rankings(teams, rankings))
    }

    /// True if the API accepts `credentials` for a teams request
    pub fn validate_credentials(&self, credentials: &Credentials, event_code: &str) -> bool {
        match self.fetch_teams(credentials, event_code) {
            Ok(_) => true,
            Err(err) => {
                log::warn!("Credential check failed: {}", err);
                false
            }
        }
    }

    fn call<T: serde::de::DeserializeOwned>(
        &self,
        request: ureq::Request,
        credentials: &Credentials,
        what: &'static str,
    ) -> ApiResult<T> {
        if !credentials.is_complete() {
            return Err(ApiError::MissingCredentials);
        }

        let response = request
            .set("Authorization", &credentials.authorization_header())
            .set("Accept", "application/json")
            .call();

        match response {
            Ok(response) => Ok(response.into_json::<T>()?),
            Err(ureq::Error::Status(status, response)) => Err(ApiError::Status {
                what,
                status,
                text: response.status_text().to_owned(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport(transport.to_string())),
        }
    }
}

/// Attach each team's ranking, matched by team number. Team order is kept.
pub fn merge_rankings(teams: Vec<Team>, rankings: Vec<Ranking>) -> Vec<TeamWithRanking> {
    let mut by_team: HashMap<TeamNumber, Ranking> = rankings
        .into_iter()
        .map(|ranking| (ranking.team_number, ranking))
        .collect();

    teams
        .into_iter()
        .map(|team| TeamWithRanking {
            ranking: by_team.remove(&team.team_number),
            team,
        })
        .collect()
}

/// Teams whose number, short name or full name contains `query`, ignoring case
pub fn filter_teams<'a>(teams: &'a [TeamWithRanking], query: &str) -> Vec<&'a TeamWithRanking> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return teams.iter().collect();
    }
    teams
        .iter()
        .filter(|entry| {
            entry.team.team_number.to_string().contains(&query)
                || entry.team.name_short.to_lowercase().contains(&query)
                || entry.team.name_full.to_lowercase().contains(&query)
        })
        .collect()
}

/// Ranked teams first by rank, unranked teams after in their original order
pub fn sort_by_rank(teams: &mut [TeamWithRanking]) {
    teams.sort_by_key(|entry| entry.rank().unwrap_or(UNRANKED));
}

/// Summary numbers shown above the team list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TeamStats {
    pub total: usize,
    pub ranked: usize,
    /// Mean OPR of ranked teams, 0 when nobody is ranked
    pub average_opr: f64,
    pub top_team: Option<TeamNumber>,
}

impl TeamStats {
    pub fn compute(teams: &[TeamWithRanking]) -> Self {
        let ranked = teams.iter().filter(|entry| entry.ranking.is_some()).count();
        let opr_sum: f64 = teams
            .iter()
            .filter_map(|entry| entry.ranking.as_ref()?.opr)
            .sum();
        let average_opr = if ranked > 0 { opr_sum / ranked as f64 } else { 0.0 };
        let top_team = teams
            .iter()
            .min_by_key(|entry| entry.rank().unwrap_or(UNRANKED))
            .map(|entry| entry.team.team_number);

        Self {
            total: teams.len(),
            ranked,
            average_opr,
            top_team,
        }
    }
}
