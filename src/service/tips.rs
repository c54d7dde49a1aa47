use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::cache::TtlCache;
use crate::api::FixtureProvider;
use crate::config::Config;
use crate::db::TipStore;
use crate::error::ApiResult;
use crate::models::{Fixture, MatchStatus, Tip};
use crate::prediction::{best_market, EloTable, Predictor};

/// Fixtures fetched when a day has none scheduled
const UPCOMING_LIMIT: usize = 10;

/// Tuning for tip generation
#[derive(Debug, Clone)]
pub struct TipSettings {
    pub cache_ttl: Duration,
    pub form_matches: usize,
    pub min_probability: f64,
}

impl TipSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_ttl: Duration::from_secs(config.cache_ttl),
            form_matches: config.form_matches,
            min_probability: config.min_probability,
        }
    }
}

/// Fetches fixtures, prices them and records the picks
pub struct TipService {
    provider: Arc<dyn FixtureProvider>,
    store: Arc<TipStore>,
    elo: Arc<RwLock<EloTable>>,
    predictor: Predictor,
    settings: TipSettings,
    fixtures_cache: Mutex<TtlCache<NaiveDate, Vec<Fixture>>>,
    tips_cache: Mutex<TtlCache<NaiveDate, Vec<Tip>>>,
}

impl TipService {
    /// Create a new tip service
    pub fn new(
        provider: Arc<dyn FixtureProvider>,
        store: Arc<TipStore>,
        elo: Arc<RwLock<EloTable>>,
        settings: TipSettings,
    ) -> Self {
        Self {
            provider,
            store,
            elo,
            predictor: Predictor::new(),
            fixtures_cache: Mutex::new(TtlCache::new(settings.cache_ttl)),
            tips_cache: Mutex::new(TtlCache::new(settings.cache_ttl)),
            settings,
        }
    }

    pub fn store(&self) -> &TipStore {
        &self.store
    }

    pub async fn fixtures_today(&self) -> ApiResult<Vec<Fixture>> {
        self.fixtures_on(Utc::now().date_naive()).await
    }

    pub async fn tips_today(&self) -> ApiResult<Vec<Tip>> {
        self.tips_on(Utc::now().date_naive()).await
    }

    /// Fixtures for `date`, or the next few fixtures if the day is empty.
    ///
    /// Provider failures are returned to the caller and never cached.
    pub async fn fixtures_on(&self, date: NaiveDate) -> ApiResult<Vec<Fixture>> {
        if let Some(cached) = self.fixtures_cache.lock().await.get(&date, Instant::now()) {
            debug!("Fixture cache hit for {}", date);
            return Ok(cached);
        }

        let mut fixtures = self.provider.fixtures_on(date).await?;
        if fixtures.is_empty() {
            info!(
                "{} has no fixtures on {}, fetching upcoming",
                self.provider.name(),
                date
            );
            fixtures = self.provider.upcoming_fixtures(UPCOMING_LIMIT).await?;
        }
        fixtures.sort_by_key(|f| f.kickoff);

        self.fixtures_cache
            .lock()
            .await
            .insert(date, fixtures.clone(), Instant::now());

        Ok(fixtures)
    }

    /// One tip per scheduled fixture, most likely first
    pub async fn tips_on(&self, date: NaiveDate) -> ApiResult<Vec<Tip>> {
        if let Some(cached) = self.tips_cache.lock().await.get(&date, Instant::now()) {
            debug!("Tip cache hit for {}", date);
            return Ok(cached);
        }

        let fixtures = self.fixtures_on(date).await?;

        let mut tips = Vec::new();
        for fixture in fixtures
            .iter()
            .filter(|f| f.status == MatchStatus::Scheduled)
        {
            if let Some(tip) = self.tip_for(fixture).await {
                tips.push(tip);
            }
        }
        tips.sort_by(|a, b| b.probability.total_cmp(&a.probability));

        info!(
            "Generated {} tips from {} fixtures for {}",
            tips.len(),
            fixtures.len(),
            date
        );

        self.record(&tips).await;

        self.tips_cache
            .lock()
            .await
            .insert(date, tips.clone(), Instant::now());

        Ok(tips)
    }

    /// Price a single fixture. Missing form or prediction degrades the estimate instead of failing.
    pub async fn tip_for(&self, fixture: &Fixture) -> Option<Tip> {
        let matches = self.settings.form_matches;
        let (home_form, away_form, prediction) = tokio::join!(
            self.provider.team_form(fixture, &fixture.home, matches),
            self.provider.team_form(fixture, &fixture.away, matches),
            self.provider.prediction(fixture),
        );

        let home_form = home_form
            .map_err(|e| warn!("No form for {}: {}", fixture.home.name, e))
            .ok();
        let away_form = away_form
            .map_err(|e| warn!("No form for {}: {}", fixture.away.name, e))
            .ok();
        let prediction = prediction
            .map_err(|e| warn!("No prediction for fixture {}: {}", fixture.id, e))
            .ok()
            .flatten();

        let estimate = {
            let elo = self.elo.read().await;
            self.predictor.estimate(
                fixture,
                home_form.as_ref(),
                away_form.as_ref(),
                prediction.as_ref(),
                &elo,
            )
        };

        let (market, probability) =
            best_market(&estimate.probabilities, self.settings.min_probability)?;

        debug!(
            "Fixture {} | {} | xG {:.2}-{:.2} | {} {:.1}% ({})",
            fixture.id,
            fixture.matchup(),
            estimate.rates.home,
            estimate.rates.away,
            market.as_str(),
            probability * 100.0,
            estimate.source.as_str(),
        );

        Some(Tip {
            fixture: fixture.clone(),
            market,
            probability,
            source: estimate.source,
            probabilities: estimate.probabilities,
        })
    }

    /// Write tips to the ledger; a storage failure does not stop the reply
    async fn record(&self, tips: &[Tip]) {
        let now = Utc::now();
        for tip in tips {
            match self.store.insert_tip(&tip.to_record(now)).await {
                Ok(Some(id)) => debug!("Recorded tip {} for fixture {}", id, tip.fixture.id),
                Ok(None) => {}
                Err(e) => warn!("Failed to record tip for fixture {}: {}", tip.fixture.id, e),
            }
        }
    }

    /// Drop cached fixtures and tips for `date`
    pub async fn invalidate(&self, date: NaiveDate) {
        self.fixtures_cache.lock().await.invalidate(&date);
        self.tips_cache.lock().await.invalidate(&date);
    }

    /// Drop every expired cache entry
    pub async fn purge_expired(&self) {
        let now = Instant::now();
        self.fixtures_cache.lock().await.purge_expired(now);
        self.tips_cache.lock().await.purge_expired(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::{EstimateSource, TeamForm, TipOutcome};
    use crate::testing::{fixture, StubProvider};

    fn settings() -> TipSettings {
        TipSettings {
            cache_ttl: Duration::from_secs(300),
            form_matches: 10,
            min_probability: 0.0,
        }
    }

    async fn service(provider: Arc<StubProvider>) -> TipService {
        let store = Arc::new(TipStore::new("sqlite::memory:").await.unwrap());
        TipService::new(
            provider,
            store,
            Arc::new(RwLock::new(EloTable::new())),
            settings(),
        )
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[tokio::test]
    async fn test_tips_are_cached_and_recorded() {
        let provider = Arc::new(StubProvider::new(vec![
            fixture(1, (10, "Arsenal"), (20, "Chelsea")),
            fixture(2, (30, "Leeds"), (40, "Burnley")),
        ]));
        provider.set_form(10, TeamForm::new(10, 25.0, 8.0));
        provider.set_form(20, TeamForm::new(10, 18.0, 15.0));
        let service = service(Arc::clone(&provider)).await;

        let tips = service.tips_on(day()).await.unwrap();
        assert_eq!(tips.len(), 2);
        assert!(tips[0].probability >= tips[1].probability);

        let arsenal = tips.iter().find(|t| t.fixture.id == 1).unwrap();
        assert_eq!(arsenal.source, EstimateSource::TeamForm);
        let leeds = tips.iter().find(|t| t.fixture.id == 2).unwrap();
        assert_eq!(leeds.source, EstimateSource::LeagueAverage);

        // Second call is served from cache
        service.tips_on(day()).await.unwrap();
        assert_eq!(provider.fixture_calls(), 1);

        let ledger = service.store().pending_tips().await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|r| r.outcome == TipOutcome::Pending));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let provider = Arc::new(StubProvider::new(vec![fixture(1, (10, "A"), (20, "B"))]));
        provider.fail_next_fixtures(ApiError::RateLimited);
        let service = service(Arc::clone(&provider)).await;

        assert!(matches!(
            service.fixtures_on(day()).await,
            Err(ApiError::RateLimited)
        ));
        let fixtures = service.fixtures_on(day()).await.unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(provider.fixture_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_day_falls_back_to_upcoming() {
        let provider = Arc::new(StubProvider::new(vec![]));
        provider.set_upcoming(vec![fixture(9, (1, "X"), (2, "Y"))]);
        let service = service(Arc::clone(&provider)).await;

        let fixtures = service.fixtures_on(day()).await.unwrap();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].id, 9);
    }

    #[tokio::test]
    async fn test_finished_fixtures_get_no_tip() {
        let mut finished = fixture(1, (10, "A"), (20, "B"));
        finished.status = MatchStatus::Finished;
        let provider = Arc::new(StubProvider::new(vec![finished]));
        let service = service(provider).await;

        assert!(service.tips_on(day()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let provider = Arc::new(StubProvider::new(vec![fixture(1, (10, "A"), (20, "B"))]));
        let service = service(Arc::clone(&provider)).await;

        service.fixtures_on(day()).await.unwrap();
        service.invalidate(day()).await;
        service.fixtures_on(day()).await.unwrap();
        assert_eq!(provider.fixture_calls(), 2);
    }
}
