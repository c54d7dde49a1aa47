use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{read_json, FixtureProvider};
use crate::error::ApiResult;
use crate::models::{
    FinalScore, Fixture, FixtureResult, League, MatchStatus, TeamForm, TeamRef,
};

/// How far ahead the upcoming fallback looks
const UPCOMING_DAYS: u64 = 7;

/// Client for the football-data.org v4 REST API
pub struct FootballDataClient {
    client: Client,
    base_url: String,
    token: String,
}

/// List of matches (`/matches`, `/teams/{id}/matches`)
#[derive(Debug, Deserialize)]
struct MatchesResponse {
    #[serde(default)]
    matches: Vec<MatchResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchResponse {
    id: i64,
    utc_date: String,
    status: String,
    competition: Option<CompetitionResponse>,
    season: Option<SeasonResponse>,
    home_team: TeamResponse,
    away_team: TeamResponse,
    score: Option<ScoreResponse>,
}

#[derive(Debug, Deserialize)]
struct CompetitionResponse {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeasonResponse {
    start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamResponse {
    id: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    full_time: Option<GoalsResponse>,
}

#[derive(Debug, Deserialize)]
struct GoalsResponse {
    home: Option<u32>,
    away: Option<u32>,
}

impl MatchResponse {
    fn full_time(&self) -> Option<FinalScore> {
        let goals = self.score.as_ref()?.full_time.as_ref()?;
        Some(FinalScore {
            home: goals.home?,
            away: goals.away?,
        })
    }
}

impl FootballDataClient {
    /// Create a new football-data.org client
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get_matches(&self, url: &str) -> ApiResult<Vec<MatchResponse>> {
        debug!("Fetching football-data matches: {}", url);

        let response = self
            .client
            .get(url)
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        let body: MatchesResponse = read_json(response).await?;
        Ok(body.matches)
    }
}

#[async_trait]
impl FixtureProvider for FootballDataClient {
    fn name(&self) -> &'static str {
        "football-data"
    }

    async fn fixtures_on(&self, date: NaiveDate) -> ApiResult<Vec<Fixture>> {
        let day = date.format("%Y-%m-%d");
        let url = format!("{}/matches?dateFrom={}&dateTo={}", self.base_url, day, day);

        let fixtures: Vec<Fixture> = self
            .get_matches(&url)
            .await?
            .into_iter()
            .filter_map(convert_match)
            .collect();

        info!("football-data returned {} fixtures for {}", fixtures.len(), day);
        Ok(fixtures)
    }

    async fn upcoming_fixtures(&self, limit: usize) -> ApiResult<Vec<Fixture>> {
        let url = upcoming_url(&self.base_url, Utc::now().date_naive());

        let mut fixtures: Vec<Fixture> = self
            .get_matches(&url)
            .await?
            .into_iter()
            .filter_map(convert_match)
            .collect();

        fixtures.sort_by_key(|f| f.kickoff);
        fixtures.truncate(limit);
        Ok(fixtures)
    }

    async fn team_form(
        &self,
        _fixture: &Fixture,
        team: &TeamRef,
        matches: usize,
    ) -> ApiResult<TeamForm> {
        let url = format!(
            "{}/teams/{}/matches?status=FINISHED&limit={}",
            self.base_url, team.id, matches
        );

        let recent = self.get_matches(&url).await?;
        let form = form_from_matches(team.id, &recent);

        debug!(
            "Form for {}: {} played, {} scored, {} conceded",
            team.name, form.played, form.scored, form.conceded
        );
        Ok(form)
    }

    async fn result(&self, fixture_id: i64) -> ApiResult<FixtureResult> {
        let url = format!("{}/matches/{}", self.base_url, fixture_id);

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        let m: MatchResponse = read_json(response).await?;
        Ok(match_result(&m))
    }
}

/// Matches after `today` that are still to be played; the API defaults to today alone without a range
fn upcoming_url(base_url: &str, today: NaiveDate) -> String {
    let from = today + Days::new(1);
    let to = today + Days::new(UPCOMING_DAYS);
    format!(
        "{}/matches?dateFrom={}&dateTo={}&status=SCHEDULED,TIMED",
        base_url,
        from.format("%Y-%m-%d"),
        to.format("%Y-%m-%d")
    )
}

fn match_result(m: &MatchResponse) -> FixtureResult {
    match MatchStatus::from_football_data(&m.status) {
        MatchStatus::Finished => match m.full_time() {
            Some(score) => FixtureResult::Finished(score),
            None => {
                warn!("Match {} finished without a full-time score", m.id);
                FixtureResult::Pending
            }
        },
        MatchStatus::Cancelled | MatchStatus::Postponed => FixtureResult::Void,
        _ => FixtureResult::Pending,
    }
}

/// Convert API match to our model; fixtures without known teams are dropped
fn convert_match(m: MatchResponse) -> Option<Fixture> {
    let kickoff = DateTime::parse_from_rfc3339(&m.utc_date)
        .ok()?
        .with_timezone(&Utc);

    let home = TeamRef {
        id: m.home_team.id?,
        name: m.home_team.name?,
    };
    let away = TeamRef {
        id: m.away_team.id?,
        name: m.away_team.name?,
    };

    let league = match m.competition {
        Some(c) => League {
            id: c.id,
            name: c.name,
            season: m
                .season
                .and_then(|s| s.start_date)
                .and_then(|d| d.get(..4).and_then(|y| y.parse().ok())),
        },
        None => League {
            id: 0,
            name: "Unknown".to_string(),
            season: None,
        },
    };

    Some(Fixture {
        id: m.id,
        league,
        home,
        away,
        kickoff,
        status: MatchStatus::from_football_data(&m.status),
    })
}

/// Sum goals for and against `team_id` over finished matches with a score
fn form_from_matches(team_id: i64, matches: &[MatchResponse]) -> TeamForm {
    let mut form = TeamForm::default();

    for m in matches {
        let Some(score) = m.full_time() else {
            continue;
        };

        let (scored, conceded) = if m.home_team.id == Some(team_id) {
            (score.home, score.away)
        } else if m.away_team.id == Some(team_id) {
            (score.away, score.home)
        } else {
            continue;
        };

        form.played += 1;
        form.scored += scored as f64;
        form.conceded += conceded as f64;
    }

    form
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHES: &str = r#"{
        "matches": [
            {
                "id": 101,
                "utcDate": "2026-10-18T14:00:00Z",
                "status": "FINISHED",
                "competition": { "id": 2021, "name": "Premier League" },
                "season": { "startDate": "2026-08-15" },
                "homeTeam": { "id": 57, "name": "Arsenal FC" },
                "awayTeam": { "id": 61, "name": "Chelsea FC" },
                "score": { "fullTime": { "home": 3, "away": 1 } }
            },
            {
                "id": 102,
                "utcDate": "2026-10-11T16:30:00Z",
                "status": "FINISHED",
                "competition": { "id": 2021, "name": "Premier League" },
                "homeTeam": { "id": 65, "name": "Manchester City FC" },
                "awayTeam": { "id": 57, "name": "Arsenal FC" },
                "score": { "fullTime": { "home": 2, "away": 2 } }
            },
            {
                "id": 103,
                "utcDate": "2026-10-25T19:00:00Z",
                "status": "TIMED",
                "homeTeam": { "id": null, "name": null },
                "awayTeam": { "id": 57, "name": "Arsenal FC" },
                "score": { "fullTime": { "home": null, "away": null } }
            }
        ]
    }"#;

    fn parse() -> Vec<MatchResponse> {
        serde_json::from_str::<MatchesResponse>(MATCHES).unwrap().matches
    }

    #[test]
    fn test_convert_match() {
        let fixtures: Vec<Fixture> = parse().into_iter().filter_map(convert_match).collect();
        assert_eq!(fixtures.len(), 2); // TBD home team dropped

        let f = &fixtures[0];
        assert_eq!(f.id, 101);
        assert_eq!(f.home.name, "Arsenal FC");
        assert_eq!(f.away.id, 61);
        assert_eq!(f.league.name, "Premier League");
        assert_eq!(f.league.season, Some(2026));
        assert_eq!(f.status, MatchStatus::Finished);
        assert_eq!(f.kickoff.format("%H:%M").to_string(), "14:00");

        assert_eq!(fixtures[1].league.season, None);
    }

    #[test]
    fn test_form_from_matches() {
        let form = form_from_matches(57, &parse());
        assert_eq!(form.played, 2);
        assert_eq!(form.scored, 5.0);
        assert_eq!(form.conceded, 3.0);

        let unknown = form_from_matches(1, &parse());
        assert_eq!(unknown.played, 0);
    }

    #[test]
    fn test_match_result() {
        let matches = parse();
        assert_eq!(
            match_result(&matches[0]),
            FixtureResult::Finished(FinalScore { home: 3, away: 1 })
        );
        assert_eq!(match_result(&matches[2]), FixtureResult::Pending);
    }

    #[test]
    fn test_upcoming_url_skips_today() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(
            upcoming_url("https://api.football-data.org/v4", today),
            "https://api.football-data.org/v4/matches?dateFrom=2026-10-19&dateTo=2026-10-25&status=SCHEDULED,TIMED"
        );
    }

    #[test]
    fn test_timed_match_is_upcoming() {
        let mut timed = parse().into_iter().nth(2).unwrap();
        timed.home_team = TeamResponse {
            id: Some(65),
            name: Some("Manchester City FC".to_string()),
        };
        let fixture = convert_match(timed).unwrap();
        assert_eq!(fixture.status, MatchStatus::Scheduled);
        assert_eq!(fixture.kickoff.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 25).unwrap());
    }
}
