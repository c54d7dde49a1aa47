use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::api::FixtureProvider;
use crate::db::TipStore;
use crate::models::{FixtureResult, TipOutcome};
use crate::prediction::EloTable;

/// Worker that settles pending tips once their fixtures finish
pub struct SettlementWorker {
    provider: Arc<dyn FixtureProvider>,
    store: Arc<TipStore>,
    elo: Arc<RwLock<EloTable>>,
    interval: Duration,
}

impl SettlementWorker {
    /// Create a new settlement worker
    pub fn new(
        provider: Arc<dyn FixtureProvider>,
        store: Arc<TipStore>,
        elo: Arc<RwLock<EloTable>>,
        interval_secs: u64,
    ) -> Self {
        Self {
            provider,
            store,
            elo,
            interval: Duration::from_secs(interval_secs),
        }
    }

    /// Run the worker loop
    pub async fn run(&self) {
        info!("Settlement worker started (interval: {:?})", self.interval);

        let mut interval = time::interval(self.interval);

        loop {
            interval.tick().await;
            match self.settle_once().await {
                Ok(0) => debug!("No tips settled"),
                Ok(n) => info!("Settled {} tips", n),
                Err(e) => error!("Settlement run failed: {}", e),
            }
        }
    }

    /// Settle every pending tip whose fixture has a result; returns how many were settled.
    /// Ratings only move once the outcome is stored. A transient provider error ends the run early.
    pub async fn settle_once(&self) -> Result<usize> {
        let today = Utc::now().date_naive();
        let pending = self.store.pending_tips().await?;

        let mut settled = 0;

        for tip in pending.iter().filter(|t| t.tip_date <= today) {
            let Some(id) = tip.id else {
                continue;
            };

            let result = match self.provider.result(tip.fixture_id).await {
                Ok(result) => result,
                Err(e) if e.is_transient() => {
                    warn!(
                        "Provider unavailable at fixture {}, retrying next run: {}",
                        tip.fixture_id, e
                    );
                    break;
                }
                Err(e) => {
                    warn!("No result for fixture {}: {}", tip.fixture_id, e);
                    continue;
                }
            };

            let (outcome, score) = match result {
                FixtureResult::Pending => continue,
                FixtureResult::Void => (TipOutcome::Void, None),
                FixtureResult::Finished(score) => {
                    let outcome = if tip.market.settle(&score) {
                        TipOutcome::Win
                    } else {
                        TipOutcome::Loss
                    };
                    (outcome, Some(score))
                }
            };

            if let Err(e) = self.store.settle_tip(id, outcome, Utc::now()).await {
                error!("Failed to settle tip {}: {:#}", id, e);
                continue;
            }

            if let Some(score) = score {
                self.elo
                    .write()
                    .await
                    .record(tip.home_id, tip.away_id, &score);
            }
            settled += 1;

            info!(
                "Settled tip {} | {} | {} -> {}",
                id,
                tip.matchup,
                tip.market.as_str(),
                outcome.as_str()
            );
        }

        Ok(settled)
    }
}
