use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{read_json, FixtureProvider};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    FinalScore, Fixture, FixtureResult, League, MatchStatus, ProviderPrediction, TeamForm,
    TeamRef,
};

/// Client for the API-Football v3 REST API
pub struct ApiFootballClient {
    client: Client,
    base_url: String,
    api_key: String,
    timezone: Option<String>,
}

/// Every API-Football payload is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    /// `[]` when fine, an object of messages otherwise
    #[serde(default)]
    errors: serde_json::Value,
    response: T,
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    fixture: FixtureInfo,
    league: LeagueInfo,
    teams: Teams,
    #[serde(default)]
    goals: Option<Goals>,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: i64,
    date: String,
    status: StatusInfo,
}

#[derive(Debug, Deserialize)]
struct StatusInfo {
    short: String,
}

#[derive(Debug, Deserialize)]
struct LeagueInfo {
    id: i64,
    name: String,
    season: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Teams {
    home: TeamInfo,
    away: TeamInfo,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Goals {
    home: Option<u32>,
    away: Option<u32>,
}

/// `/teams/statistics` response body
#[derive(Debug, Deserialize)]
struct TeamStatistics {
    fixtures: StatFixtures,
    goals: StatGoals,
}

#[derive(Debug, Deserialize)]
struct StatFixtures {
    played: SplitCount,
}

#[derive(Debug, Deserialize)]
struct SplitCount {
    total: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StatGoals {
    #[serde(rename = "for")]
    scored: GoalAverages,
    #[serde(rename = "against")]
    conceded: GoalAverages,
}

#[derive(Debug, Deserialize)]
struct GoalAverages {
    average: SplitAverage,
}

#[derive(Debug, Deserialize)]
struct SplitAverage {
    /// Reported as a string, e.g. "1.5"
    total: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PredictionEntry {
    predictions: PredictionInfo,
}

#[derive(Debug, Deserialize)]
struct PredictionInfo {
    percent: PredictionPercent,
}

#[derive(Debug, Deserialize)]
struct PredictionPercent {
    home: String,
    draw: String,
    away: String,
}

impl ApiFootballClient {
    /// Create a new API-Football client
    pub fn new(base_url: &str, api_key: &str, timezone: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timezone,
        })
    }

    /// GET `path?query` and unwrap the envelope
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &str) -> ApiResult<T> {
        let mut url = format!("{}/{}?{}", self.base_url, path, query);
        if let Some(tz) = &self.timezone {
            if path == "fixtures" {
                url.push_str(&format!("&timezone={}", urlencoding::encode(tz)));
            }
        }

        debug!("Fetching API-Football: {}", url);

        let response = self
            .client
            .get(&url)
            .header("x-apisports-key", &self.api_key)
            .send()
            .await?;

        let envelope: Envelope<T> = read_json(response).await?;
        check_errors(&envelope.errors)?;
        Ok(envelope.response)
    }

    async fn get_fixtures(&self, query: &str) -> ApiResult<Vec<Fixture>> {
        let entries: Vec<FixtureEntry> = self.get("fixtures", query).await?;
        Ok(entries.into_iter().filter_map(convert_fixture).collect())
    }
}

/// API-Football reports quota and auth problems with HTTP 200 and a non-empty `errors`
fn check_errors(errors: &serde_json::Value) -> ApiResult<()> {
    let empty = match errors {
        serde_json::Value::Null => true,
        serde_json::Value::Array(a) => a.is_empty(),
        serde_json::Value::Object(o) => o.is_empty(),
        _ => false,
    };

    if empty {
        Ok(())
    } else {
        Err(ApiError::provider_error(errors.to_string()))
    }
}

fn convert_fixture(entry: FixtureEntry) -> Option<Fixture> {
    let kickoff = match DateTime::parse_from_rfc3339(&entry.fixture.date) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(e) => {
            warn!("Bad fixture date {:?}: {}", entry.fixture.date, e);
            return None;
        }
    };

    Some(Fixture {
        id: entry.fixture.id,
        league: League {
            id: entry.league.id,
            name: entry.league.name,
            season: entry.league.season,
        },
        home: TeamRef {
            id: entry.teams.home.id,
            name: entry.teams.home.name,
        },
        away: TeamRef {
            id: entry.teams.away.id,
            name: entry.teams.away.name,
        },
        kickoff,
        status: MatchStatus::from_api_football(&entry.fixture.status.short),
    })
}

fn fixture_result(entry: &FixtureEntry) -> FixtureResult {
    match MatchStatus::from_api_football(&entry.fixture.status.short) {
        MatchStatus::Finished => {
            let score = entry.goals.as_ref().and_then(|g| {
                Some(FinalScore {
                    home: g.home?,
                    away: g.away?,
                })
            });
            score
                .map(FixtureResult::Finished)
                .unwrap_or(FixtureResult::Pending)
        }
        MatchStatus::Cancelled | MatchStatus::Postponed => FixtureResult::Void,
        _ => FixtureResult::Pending,
    }
}

fn convert_statistics(stats: &TeamStatistics) -> TeamForm {
    let played = stats.fixtures.played.total.unwrap_or(0);
    let parse = |avg: &SplitAverage| {
        avg.total
            .as_deref()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    TeamForm::from_averages(
        played,
        parse(&stats.goals.scored.average),
        parse(&stats.goals.conceded.average),
    )
}

/// "45%" -> 0.45
fn parse_percent(s: &str) -> Option<f64> {
    s.trim().trim_end_matches('%').trim().parse::<f64>().ok().map(|p| p / 100.0)
}

fn convert_prediction(entry: &PredictionEntry) -> Option<ProviderPrediction> {
    let percent = &entry.predictions.percent;
    Some(ProviderPrediction {
        home: parse_percent(&percent.home)?,
        draw: parse_percent(&percent.draw)?,
        away: parse_percent(&percent.away)?,
    })
}

#[async_trait]
impl FixtureProvider for ApiFootballClient {
    fn name(&self) -> &'static str {
        "api-football"
    }

    async fn fixtures_on(&self, date: NaiveDate) -> ApiResult<Vec<Fixture>> {
        let day = date.format("%Y-%m-%d");
        let mut fixtures = self.get_fixtures(&format!("date={}", day)).await?;

        // Nothing scheduled: fall back to whatever is live right now
        if fixtures.is_empty() {
            info!("No fixtures on {}, checking live fixtures", day);
            fixtures = self.get_fixtures("live=all").await?;
        }

        info!("API-Football returned {} fixtures for {}", fixtures.len(), day);
        Ok(fixtures)
    }

    async fn upcoming_fixtures(&self, limit: usize) -> ApiResult<Vec<Fixture>> {
        self.get_fixtures(&format!("next={}", limit)).await
    }

    async fn team_form(
        &self,
        fixture: &Fixture,
        team: &TeamRef,
        _matches: usize,
    ) -> ApiResult<TeamForm> {
        let Some(season) = fixture.league.season else {
            return Err(ApiError::provider_error(format!(
                "fixture {} has no season",
                fixture.id
            )));
        };

        let query = format!(
            "league={}&season={}&team={}",
            fixture.league.id, season, team.id
        );
        let stats: TeamStatistics = self.get("teams/statistics", &query).await?;
        Ok(convert_statistics(&stats))
    }

    async fn prediction(&self, fixture: &Fixture) -> ApiResult<Option<ProviderPrediction>> {
        let entries: Vec<PredictionEntry> = self
            .get("predictions", &format!("fixture={}", fixture.id))
            .await?;
        Ok(entries.first().and_then(convert_prediction))
    }

    async fn result(&self, fixture_id: i64) -> ApiResult<FixtureResult> {
        let entries: Vec<FixtureEntry> = self.get("fixtures", &format!("id={}", fixture_id)).await?;

        match entries.first() {
            Some(entry) => Ok(fixture_result(entry)),
            None => Err(ApiError::provider_error(format!(
                "fixture {} not found",
                fixture_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURES: &str = r#"{
        "get": "fixtures",
        "errors": [],
        "results": 2,
        "response": [
            {
                "fixture": { "id": 1035000, "date": "2026-10-18T19:00:00+00:00", "status": { "short": "NS" } },
                "league": { "id": 140, "name": "La Liga", "season": 2026 },
                "teams": { "home": { "id": 541, "name": "Real Madrid" }, "away": { "id": 529, "name": "Barcelona" } },
                "goals": { "home": null, "away": null }
            },
            {
                "fixture": { "id": 1035001, "date": "2026-10-18T16:15:00+02:00", "status": { "short": "FT" } },
                "league": { "id": 140, "name": "La Liga", "season": 2026 },
                "teams": { "home": { "id": 530, "name": "Atletico Madrid" }, "away": { "id": 536, "name": "Sevilla" } },
                "goals": { "home": 0, "away": 2 }
            }
        ]
    }"#;

    #[test]
    fn test_convert_fixtures() {
        let envelope: Envelope<Vec<FixtureEntry>> = serde_json::from_str(FIXTURES).unwrap();
        assert!(check_errors(&envelope.errors).is_ok());

        let entries = envelope.response;
        assert_eq!(fixture_result(&entries[0]), FixtureResult::Pending);
        assert_eq!(
            fixture_result(&entries[1]),
            FixtureResult::Finished(FinalScore { home: 0, away: 2 })
        );

        let fixtures: Vec<Fixture> = entries.into_iter().filter_map(convert_fixture).collect();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].matchup(), "Real Madrid vs Barcelona");
        assert_eq!(fixtures[0].league.season, Some(2026));
        assert_eq!(fixtures[1].kickoff.format("%H:%M").to_string(), "14:15");
    }

    #[test]
    fn test_errors_object_is_surfaced() {
        let errors = serde_json::json!({ "requests": "You have reached the request limit for the day" });
        assert!(matches!(check_errors(&errors), Err(ApiError::Provider(_))));
        assert!(check_errors(&serde_json::json!([])).is_ok());
        assert!(check_errors(&serde_json::Value::Null).is_ok());
    }

    #[test]
    fn test_convert_statistics() {
        let body = r#"{
            "fixtures": { "played": { "home": 4, "away": 4, "total": 8 } },
            "goals": {
                "for": { "average": { "home": "2.0", "away": "1.0", "total": "1.5" } },
                "against": { "average": { "home": "0.5", "away": "1.5", "total": "1.0" } }
            }
        }"#;
        let stats: TeamStatistics = serde_json::from_str(body).unwrap();
        let form = convert_statistics(&stats);
        assert_eq!(form.played, 8);
        assert_eq!(form.scored_avg(), Some(1.5));
        assert_eq!(form.conceded_avg(), Some(1.0));
    }

    #[test]
    fn test_convert_prediction() {
        let body = r#"{ "predictions": { "percent": { "home": "45%", "draw": "25%", "away": "30%" } } }"#;
        let entry: PredictionEntry = serde_json::from_str(body).unwrap();
        let p = convert_prediction(&entry).unwrap();
        assert!((p.home - 0.45).abs() < 1e-12);
        assert!((p.away - 0.30).abs() < 1e-12);

        assert_eq!(parse_percent("n/a"), None);
    }
}
