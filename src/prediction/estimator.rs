use crate::models::{
    EstimateSource, Fixture, Market, MarketProbabilities, ProviderPrediction, TeamForm,
};

use super::elo::EloTable;
use super::poisson::ScoreGrid;

/// League-average goals per match for the home side
pub const LEAGUE_HOME_GOALS: f64 = 1.45;
/// League-average goals per match for the away side
pub const LEAGUE_AWAY_GOALS: f64 = 1.15;
/// Multiplier applied to the home rate (and divided out of the away rate) when built from form
pub const HOME_FACTOR: f64 = 1.08;

/// Expected goals for each side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalRates {
    pub home: f64,
    pub away: f64,
    pub source: EstimateSource,
}

fn mean(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Each side's attack averaged with the opponent's defence
pub fn expected_goals(home: Option<&TeamForm>, away: Option<&TeamForm>) -> GoalRates {
    let home_attack = home.and_then(TeamForm::scored_avg);
    let home_defence = home.and_then(TeamForm::conceded_avg);
    let away_attack = away.and_then(TeamForm::scored_avg);
    let away_defence = away.and_then(TeamForm::conceded_avg);

    let home_rate = mean(&[home_attack, away_defence]);
    let away_rate = mean(&[away_attack, home_defence]);

    match (home_rate, away_rate) {
        (None, None) => GoalRates {
            home: LEAGUE_HOME_GOALS,
            away: LEAGUE_AWAY_GOALS,
            source: EstimateSource::LeagueAverage,
        },
        (home_rate, away_rate) => GoalRates {
            home: home_rate.map(|r| r * HOME_FACTOR).unwrap_or(LEAGUE_HOME_GOALS),
            away: away_rate.map(|r| r / HOME_FACTOR).unwrap_or(LEAGUE_AWAY_GOALS),
            source: EstimateSource::TeamForm,
        },
    }
}

/// Result of pricing a fixture
#[derive(Debug, Clone)]
pub struct Estimate {
    pub probabilities: MarketProbabilities,
    pub source: EstimateSource,
    pub rates: GoalRates,
}

/// Prices every market for a fixture
#[derive(Debug, Clone, Default)]
pub struct Predictor;

impl Predictor {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(
        &self,
        fixture: &Fixture,
        home_form: Option<&TeamForm>,
        away_form: Option<&TeamForm>,
        prediction: Option<&ProviderPrediction>,
        elo: &EloTable,
    ) -> Estimate {
        let rates = expected_goals(home_form, away_form);
        let grid = ScoreGrid::from_rates(rates.home, rates.away);

        let mut probabilities = MarketProbabilities::new();
        probabilities.insert(Market::Over15, grid.over(1.5));
        probabilities.insert(Market::Over25, grid.over(2.5));
        probabilities.insert(Market::Under25, grid.under(2.5));
        probabilities.insert(Market::Over35, grid.over(3.5));
        let btts = grid.btts();
        probabilities.insert(Market::Btts, btts);
        probabilities.insert(Market::BttsNo, 1.0 - btts);

        // 1X2: Poisson, averaged with whatever outside opinions are available
        let poisson_draw = grid.draw();
        let mut splits = vec![(grid.home_win(), poisson_draw, grid.away_win())];
        if let Some(p) = prediction.and_then(ProviderPrediction::normalized) {
            splits.push((p.home, p.draw, p.away));
        }
        if elo.games(fixture.home.id) > 0 && elo.games(fixture.away.id) > 0 {
            splits.push(elo.outcome_split(fixture.home.id, fixture.away.id, poisson_draw));
        }

        let n = splits.len() as f64;
        let (home, draw, away) = splits
            .iter()
            .fold((0.0, 0.0, 0.0), |acc, s| (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2));
        probabilities.insert(Market::HomeWin, home / n);
        probabilities.insert(Market::Draw, draw / n);
        probabilities.insert(Market::AwayWin, away / n);

        let source = if splits.len() > 1 {
            EstimateSource::Blend
        } else {
            rates.source
        };

        Estimate {
            probabilities,
            source,
            rates,
        }
    }
}
