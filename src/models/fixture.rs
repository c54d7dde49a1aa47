use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled match as reported by the sports data provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fixture {
    /// Provider fixture identifier
    pub id: i64,

    /// Competition the fixture belongs to
    pub league: League,

    /// Home side
    pub home: TeamRef,

    /// Away side
    pub away: TeamRef,

    /// Kickoff time
    pub kickoff: DateTime<Utc>,

    /// Current status
    pub status: MatchStatus,
}

impl Fixture {
    /// "Home vs Away"
    pub fn matchup(&self) -> String {
        format!("{} vs {}", self.home.name, self.away.name)
    }
}

/// Competition information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct League {
    pub id: i64,
    pub name: String,
    /// Season start year, when the provider reports one
    pub season: Option<i32>,
}

/// Team reference inside a fixture
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TeamRef {
    pub id: i64,
    pub name: String,
}

/// Lifecycle of a fixture
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
    Unknown,
}

impl MatchStatus {
    /// Parse a football-data.org status string
    pub fn from_football_data(status: &str) -> Self {
        match status {
            "SCHEDULED" | "TIMED" => MatchStatus::Scheduled,
            "IN_PLAY" | "PAUSED" | "LIVE" => MatchStatus::Live,
            "FINISHED" | "AWARDED" => MatchStatus::Finished,
            "POSTPONED" | "SUSPENDED" => MatchStatus::Postponed,
            "CANCELLED" => MatchStatus::Cancelled,
            _ => MatchStatus::Unknown,
        }
    }

    /// Parse an API-Football short status code
    pub fn from_api_football(short: &str) -> Self {
        match short {
            "TBD" | "NS" => MatchStatus::Scheduled,
            "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "INT" | "LIVE" | "SUSP" => MatchStatus::Live,
            "FT" | "AET" | "PEN" | "AWD" | "WO" => MatchStatus::Finished,
            "PST" => MatchStatus::Postponed,
            "CANC" | "ABD" => MatchStatus::Cancelled,
            _ => MatchStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
            MatchStatus::Unknown => "unknown",
        }
    }
}

/// Full-time score of a finished fixture
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinalScore {
    pub home: u32,
    pub away: u32,
}

impl FinalScore {
    pub fn total(&self) -> u32 {
        self.home + self.away
    }
}

/// Result of asking the provider how a fixture ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureResult {
    /// Not finished yet
    Pending,
    /// Finished with a score
    Finished(FinalScore),
    /// Cancelled or postponed, tips on it are void
    Void,
}

/// Aggregated recent goals for one team
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamForm {
    /// Matches the totals were taken over
    pub played: u32,
    /// Goals scored over those matches
    pub scored: f64,
    /// Goals conceded over those matches
    pub conceded: f64,
}

impl TeamForm {
    pub fn new(played: u32, scored: f64, conceded: f64) -> Self {
        Self {
            played,
            scored,
            conceded,
        }
    }

    /// Build from per-match averages (API-Football reports averages only)
    pub fn from_averages(played: u32, scored_avg: f64, conceded_avg: f64) -> Self {
        Self {
            played,
            scored: scored_avg * played as f64,
            conceded: conceded_avg * played as f64,
        }
    }

    pub fn scored_avg(&self) -> Option<f64> {
        (self.played > 0).then(|| self.scored / self.played as f64)
    }

    pub fn conceded_avg(&self) -> Option<f64> {
        (self.played > 0).then(|| self.conceded / self.played as f64)
    }
}

/// Win/draw/win split published by the provider, as fractions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProviderPrediction {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl ProviderPrediction {
    /// Normalise so the three outcomes sum to one. `None` when there is nothing to normalise.
    pub fn normalized(&self) -> Option<Self> {
        let total = self.home + self.draw + self.away;
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some(Self {
            home: self.home / total,
            draw: self.draw / total,
            away: self.away / total,
        })
    }
}
