pub mod api_football;
pub mod football_data;
pub mod telegram;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::{Config, ProviderKind};
use crate::error::{ApiError, ApiResult};
use crate::models::{Fixture, FixtureResult, ProviderPrediction, TeamForm, TeamRef};

pub use api_football::ApiFootballClient;
pub use football_data::FootballDataClient;
pub use telegram::TelegramClient;

/// Source of fixtures, team form and results
#[async_trait]
pub trait FixtureProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// All fixtures kicking off on `date` (UTC)
    async fn fixtures_on(&self, date: NaiveDate) -> ApiResult<Vec<Fixture>>;

    /// The next `limit` fixtures, used when a day has nothing scheduled
    async fn upcoming_fixtures(&self, limit: usize) -> ApiResult<Vec<Fixture>>;

    /// Recent goals scored/conceded by `team` over up to `matches` games
    async fn team_form(&self, fixture: &Fixture, team: &TeamRef, matches: usize)
        -> ApiResult<TeamForm>;

    /// Provider's own win/draw/win prediction, if it publishes one
    async fn prediction(&self, _fixture: &Fixture) -> ApiResult<Option<ProviderPrediction>> {
        Ok(None)
    }

    /// How the fixture ended, if it has
    async fn result(&self, fixture_id: i64) -> ApiResult<FixtureResult>;
}

/// Build the provider selected in the configuration
pub fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn FixtureProvider>> {
    let provider: Arc<dyn FixtureProvider> = match config.provider {
        ProviderKind::FootballData => {
            let token = config
                .football_data_token
                .as_deref()
                .context("FOOTBALL_DATA_TOKEN must be set")?;
            Arc::new(FootballDataClient::new(&config.football_data_url, token)?)
        }
        ProviderKind::ApiFootball => {
            let key = config
                .api_football_key
                .as_deref()
                .context("API_FOOTBALL_KEY must be set")?;
            Arc::new(ApiFootballClient::new(
                &config.api_football_url,
                key,
                config.api_football_timezone.clone(),
            )?)
        }
    };

    Ok(provider)
}

/// Check the status and decode a JSON body
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized(body)),
        StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
        s if !s.is_success() => Err(ApiError::Status {
            status: s.as_u16(),
            body,
        }),
        _ => Ok(serde_json::from_str(&body)?),
    }
}
