use serde::{Deserialize, Serialize};

use super::FinalScore;

/// Betting market a tip can be given on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// More than 1.5 total goals
    Over15,
    /// More than 2.5 total goals
    Over25,
    /// Fewer than 2.5 total goals
    Under25,
    /// More than 3.5 total goals
    Over35,
    /// Both teams score
    Btts,
    /// At least one team fails to score
    BttsNo,
    HomeWin,
    Draw,
    AwayWin,
}

impl Market {
    /// Every market, in tie-break order
    pub const ALL: [Market; 9] = [
        Market::Over15,
        Market::Over25,
        Market::Under25,
        Market::Over35,
        Market::Btts,
        Market::BttsNo,
        Market::HomeWin,
        Market::Draw,
        Market::AwayWin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Over15 => "over_1_5",
            Market::Over25 => "over_2_5",
            Market::Under25 => "under_2_5",
            Market::Over35 => "over_3_5",
            Market::Btts => "btts",
            Market::BttsNo => "btts_no",
            Market::HomeWin => "home_win",
            Market::Draw => "draw",
            Market::AwayWin => "away_win",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Market::ALL.into_iter().find(|m| m.as_str() == s)
    }

    /// Human-readable label used in replies
    pub fn label(&self) -> &'static str {
        match self {
            Market::Over15 => "Over 1.5 goals",
            Market::Over25 => "Over 2.5 goals",
            Market::Under25 => "Under 2.5 goals",
            Market::Over35 => "Over 3.5 goals",
            Market::Btts => "Both teams to score",
            Market::BttsNo => "Both teams to score: No",
            Market::HomeWin => "Home win",
            Market::Draw => "Draw",
            Market::AwayWin => "Away win",
        }
    }

    /// Whether the market won given the full-time score
    pub fn settle(&self, score: &FinalScore) -> bool {
        let total = score.total();
        let btts = score.home > 0 && score.away > 0;
        match self {
            Market::Over15 => total >= 2,
            Market::Over25 => total >= 3,
            Market::Under25 => total <= 2,
            Market::Over35 => total >= 4,
            Market::Btts => btts,
            Market::BttsNo => !btts,
            Market::HomeWin => score.home > score.away,
            Market::Draw => score.home == score.away,
            Market::AwayWin => score.home < score.away,
        }
    }
}

/// Probability per market, kept in `Market::ALL` order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketProbabilities {
    entries: Vec<(Market, f64)>,
}

impl MarketProbabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the probability of a market
    pub fn insert(&mut self, market: Market, probability: f64) {
        match self.entries.binary_search_by(|(m, _)| m.cmp(&market)) {
            Ok(idx) => self.entries[idx].1 = probability,
            Err(idx) => self.entries.insert(idx, (market, probability)),
        }
    }

    pub fn get(&self, market: Market) -> Option<f64> {
        self.entries
            .binary_search_by(|(m, _)| m.cmp(&market))
            .ok()
            .map(|idx| self.entries[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Market, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Market, f64)> for MarketProbabilities {
    fn from_iter<T: IntoIterator<Item = (Market, f64)>>(iter: T) -> Self {
        let mut probs = MarketProbabilities::new();
        for (market, probability) in iter {
            probs.insert(market, probability);
        }
        probs
    }
}
