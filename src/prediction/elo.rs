use std::collections::HashMap;

use crate::models::FinalScore;

pub const INITIAL_RATING: f64 = 1500.0;
pub const HOME_ADVANTAGE: f64 = 60.0;
pub const K_FACTOR: f64 = 20.0;

#[derive(Debug, Clone, Copy)]
struct Entry {
    rating: f64,
    games: u32,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            rating: INITIAL_RATING,
            games: 0,
        }
    }
}

/// Team strength ratings learned from settled results, keyed by provider team id
#[derive(Debug, Clone, Default)]
pub struct EloTable {
    entries: HashMap<i64, Entry>,
}

impl EloTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rating(&self, team_id: i64) -> f64 {
        self.entries
            .get(&team_id)
            .map(|e| e.rating)
            .unwrap_or(INITIAL_RATING)
    }

    /// Number of results recorded for the team
    pub fn games(&self, team_id: i64) -> u32 {
        self.entries.get(&team_id).map(|e| e.games).unwrap_or(0)
    }

    /// Expected score (win = 1, draw = 0.5) of the home side
    pub fn expected(&self, home_id: i64, away_id: i64) -> f64 {
        let diff = self.rating(away_id) - (self.rating(home_id) + HOME_ADVANTAGE);
        1.0 / (1.0 + 10f64.powf(diff / 400.0))
    }

    /// Split the expected score into home/draw/away given a draw probability
    pub fn outcome_split(&self, home_id: i64, away_id: i64, draw: f64) -> (f64, f64, f64) {
        let expected = self.expected(home_id, away_id);
        let draw = draw.clamp(0.0, 1.0);
        let home = (expected - draw / 2.0).max(0.0);
        let away = (1.0 - expected - draw / 2.0).max(0.0);
        let total = home + draw + away;
        (home / total, draw / total, away / total)
    }

    /// Update both teams with a full-time result
    pub fn record(&mut self, home_id: i64, away_id: i64, score: &FinalScore) {
        let expected = self.expected(home_id, away_id);
        let actual = match score.home.cmp(&score.away) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Equal => 0.5,
            std::cmp::Ordering::Less => 0.0,
        };
        let delta = K_FACTOR * margin_multiplier(score.home.abs_diff(score.away)) * (actual - expected);

        let home = self.entries.entry(home_id).or_default();
        home.rating += delta;
        home.games += 1;

        let away = self.entries.entry(away_id).or_default();
        away.rating -= delta;
        away.games += 1;
    }
}

/// Larger wins move ratings further
fn margin_multiplier(goal_diff: u32) -> f64 {
    match goal_diff {
        0 | 1 => 1.0,
        2 => 1.5,
        n => (11.0 + n as f64) / 8.0,
    }
}
