use crate::models::{Market, MarketProbabilities};

/// Pick the most likely market.
///
/// NaN entries are skipped; on a tie the market declared first in `Market::ALL` wins.
/// Returns `None` when no market reaches `min_probability`.
pub fn best_market(probs: &MarketProbabilities, min_probability: f64) -> Option<(Market, f64)> {
    let mut best: Option<(Market, f64)> = None;
    for (market, probability) in probs.iter() {
        if probability.is_nan() || probability < min_probability {
            continue;
        }
        match best {
            Some((_, current)) if probability <= current => {}
            _ => best = Some((market, probability)),
        }
    }
    best
}
