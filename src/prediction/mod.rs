pub mod elo;
pub mod estimator;
pub mod poisson;
pub mod select;

pub use elo::EloTable;
pub use estimator::{expected_goals, Estimate, GoalRates, Predictor};
pub use poisson::ScoreGrid;
pub use select::best_market;
