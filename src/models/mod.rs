pub mod fixture;
pub mod market;
pub mod tip;

pub use fixture::{
    FinalScore, Fixture, FixtureResult, League, MatchStatus, ProviderPrediction, TeamForm,
    TeamRef,
};
pub use market::{Market, MarketProbabilities};
pub use tip::{EstimateSource, Tip, TipOutcome, TipRecord};
