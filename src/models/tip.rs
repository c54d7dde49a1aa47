use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Fixture, Market, MarketProbabilities};

/// A market pick for a fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tip {
    /// Fixture the tip is for
    pub fixture: Fixture,

    /// Chosen market
    pub market: Market,

    /// Model probability of the chosen market (0.0 - 1.0)
    pub probability: f64,

    /// What the estimate was built from
    pub source: EstimateSource,

    /// All market probabilities the pick was chosen from
    pub probabilities: MarketProbabilities,
}

impl Tip {
    /// Ledger row for this tip
    pub fn to_record(&self, created_at: DateTime<Utc>) -> TipRecord {
        TipRecord {
            id: None,
            fixture_id: self.fixture.id,
            tip_date: self.fixture.kickoff.date_naive(),
            matchup: self.fixture.matchup(),
            home_id: self.fixture.home.id,
            away_id: self.fixture.away.id,
            market: self.market,
            probability: self.probability,
            outcome: TipOutcome::Pending,
            created_at,
            settled_at: None,
        }
    }
}

/// Input the probability estimate was derived from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    /// Recent goals of both teams
    TeamForm,
    /// Team form blended with the provider prediction or Elo ratings
    Blend,
    /// No usable team data, league-average goal rates
    LeagueAverage,
}

impl EstimateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateSource::TeamForm => "team_form",
            EstimateSource::Blend => "blend",
            EstimateSource::LeagueAverage => "league_average",
        }
    }
}

/// Settlement state of a recorded tip
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TipOutcome {
    Pending,
    Win,
    Loss,
    /// Fixture cancelled or postponed
    Void,
}

impl TipOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipOutcome::Pending => "pending",
            TipOutcome::Win => "win",
            TipOutcome::Loss => "loss",
            TipOutcome::Void => "void",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "win" => TipOutcome::Win,
            "loss" => TipOutcome::Loss,
            "void" => TipOutcome::Void,
            _ => TipOutcome::Pending,
        }
    }
}

/// A tip as stored in the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipRecord {
    /// Row identifier, `None` until stored
    pub id: Option<i64>,

    /// Provider fixture identifier
    pub fixture_id: i64,

    /// Match day
    pub tip_date: NaiveDate,

    /// "Home vs Away"
    pub matchup: String,

    /// Provider team ids, used to feed ratings once settled
    pub home_id: i64,
    pub away_id: i64,

    pub market: Market,

    pub probability: f64,

    pub outcome: TipOutcome,

    /// When the tip was first produced
    pub created_at: DateTime<Utc>,

    /// When the outcome was decided
    pub settled_at: Option<DateTime<Utc>>,
}
