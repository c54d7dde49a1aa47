use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use crate::api::FixtureProvider;
use crate::error::{ApiError, ApiResult};
use crate::models::{Fixture, FixtureResult, League, MatchStatus, TeamForm, TeamRef};

/// Scheduled fixture on 2026-10-18 at 19:00 UTC
pub fn fixture(id: i64, home: (i64, &str), away: (i64, &str)) -> Fixture {
    Fixture {
        id,
        league: League {
            id: 39,
            name: "Premier League".to_string(),
            season: Some(2026),
        },
        home: TeamRef {
            id: home.0,
            name: home.1.to_string(),
        },
        away: TeamRef {
            id: away.0,
            name: away.1.to_string(),
        },
        kickoff: Utc.with_ymd_and_hms(2026, 10, 18, 19, 0, 0).unwrap(),
        status: MatchStatus::Scheduled,
    }
}

#[derive(Default)]
struct StubState {
    fixtures: Vec<Fixture>,
    upcoming: Vec<Fixture>,
    forms: HashMap<i64, TeamForm>,
    results: HashMap<i64, FixtureResult>,
    fail_next_fixtures: Option<ApiError>,
    result_errors: HashMap<i64, ApiError>,
}

/// In-memory provider with canned responses
#[derive(Default)]
pub struct StubProvider {
    state: Mutex<StubState>,
    fixture_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        let provider = Self::default();
        provider.state.lock().unwrap().fixtures = fixtures;
        provider
    }

    pub fn set_upcoming(&self, fixtures: Vec<Fixture>) {
        self.state.lock().unwrap().upcoming = fixtures;
    }

    pub fn set_form(&self, team_id: i64, form: TeamForm) {
        self.state.lock().unwrap().forms.insert(team_id, form);
    }

    pub fn set_result(&self, fixture_id: i64, result: FixtureResult) {
        self.state.lock().unwrap().results.insert(fixture_id, result);
    }

    pub fn fail_next_fixtures(&self, error: ApiError) {
        self.state.lock().unwrap().fail_next_fixtures = Some(error);
    }

    pub fn fail_next_result(&self, fixture_id: i64, error: ApiError) {
        self.state.lock().unwrap().result_errors.insert(fixture_id, error);
    }

    pub fn fixture_calls(&self) -> usize {
        self.fixture_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FixtureProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fixtures_on(&self, _date: NaiveDate) -> ApiResult<Vec<Fixture>> {
        self.fixture_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        match state.fail_next_fixtures.take() {
            Some(e) => Err(e),
            None => Ok(state.fixtures.clone()),
        }
    }

    async fn upcoming_fixtures(&self, limit: usize) -> ApiResult<Vec<Fixture>> {
        let state = self.state.lock().unwrap();
        Ok(state.upcoming.iter().take(limit).cloned().collect())
    }

    async fn team_form(
        &self,
        _fixture: &Fixture,
        team: &TeamRef,
        _matches: usize,
    ) -> ApiResult<TeamForm> {
        let state = self.state.lock().unwrap();
        state.forms.get(&team.id).copied().ok_or(ApiError::Status {
            status: 404,
            body: format!("no form for {}", team.id),
        })
    }

    async fn result(&self, fixture_id: i64) -> ApiResult<FixtureResult> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.result_errors.remove(&fixture_id) {
            return Err(e);
        }
        Ok(state
            .results
            .get(&fixture_id)
            .copied()
            .unwrap_or(FixtureResult::Pending))
    }
}
