use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tracing::{info, warn};

use crate::models::{Market, TipOutcome, TipRecord};

/// SQLite ledger of every tip handed out
pub struct TipStore {
    pool: Pool<Sqlite>,
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: i64,
    pub pending: i64,
    pub wins: i64,
    pub losses: i64,
    pub voids: i64,
}

impl LedgerSummary {
    /// Wins over decided tips, `None` before anything is decided
    pub fn hit_rate(&self) -> Option<f64> {
        let decided = self.wins + self.losses;
        (decided > 0).then(|| self.wins as f64 / decided as f64)
    }
}

impl TipStore {
    /// Create a new tip store and initialize the database
    pub async fn new(database_url: &str) -> Result<Self> {
        // Create data directory if needed
        if let Some(path) = database_url.strip_prefix("sqlite:") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .context("Failed to create database directory")?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .create_if_missing(true);

        // Every in-memory connection is its own database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Tip store initialized");
        Ok(store)
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tips (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                fixture_id INTEGER NOT NULL UNIQUE,
                tip_date TEXT NOT NULL,
                matchup TEXT NOT NULL,
                home_id INTEGER NOT NULL,
                away_id INTEGER NOT NULL,
                market TEXT NOT NULL,
                probability REAL NOT NULL,
                outcome TEXT NOT NULL,
                created_at TEXT NOT NULL,
                settled_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create tips table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_tips_outcome
            ON tips (outcome)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a tip; returns `None` if the fixture already has one
    pub async fn insert_tip(&self, tip: &TipRecord) -> Result<Option<i64>> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO tips (
                fixture_id,
                tip_date,
                matchup,
                home_id,
                away_id,
                market,
                probability,
                outcome,
                created_at,
                settled_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tip.fixture_id)
        .bind(tip.tip_date.format("%Y-%m-%d").to_string())
        .bind(&tip.matchup)
        .bind(tip.home_id)
        .bind(tip.away_id)
        .bind(tip.market.as_str())
        .bind(tip.probability)
        .bind(tip.outcome.as_str())
        .bind(tip.created_at.to_rfc3339())
        .bind(tip.settled_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to insert tip")?;

        if result.rows_affected() == 0 {
            Ok(None)
        } else {
            Ok(Some(result.last_insert_rowid()))
        }
    }

    /// Tips still waiting for a result, oldest match first
    pub async fn pending_tips(&self) -> Result<Vec<TipRecord>> {
        let rows = sqlx::query_as::<_, TipRow>(
            r#"
            SELECT * FROM tips
            WHERE outcome = 'pending'
            ORDER BY tip_date ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch pending tips")?;

        Ok(decode_rows(rows))
    }

    /// Most recent tips, newest first
    pub async fn recent_tips(&self, limit: i64) -> Result<Vec<TipRecord>> {
        let rows = sqlx::query_as::<_, TipRow>(
            r#"
            SELECT * FROM tips
            ORDER BY tip_date DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent tips")?;

        Ok(decode_rows(rows))
    }

    /// Mark a tip as decided
    pub async fn settle_tip(
        &self,
        id: i64,
        outcome: TipOutcome,
        settled_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tips SET outcome = ?, settled_at = ?
            WHERE id = ?
            "#,
        )
        .bind(outcome.as_str())
        .bind(settled_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to settle tip")?;

        Ok(())
    }

    /// Count tips per outcome
    pub async fn summary(&self) -> Result<LedgerSummary> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT outcome, COUNT(*) FROM tips GROUP BY outcome")
                .fetch_all(&self.pool)
                .await
                .context("Failed to summarize tips")?;

        let mut summary = LedgerSummary::default();
        for (outcome, count) in rows {
            summary.total += count;
            match TipOutcome::parse(&outcome) {
                TipOutcome::Pending => summary.pending += count,
                TipOutcome::Win => summary.wins += count,
                TipOutcome::Loss => summary.losses += count,
                TipOutcome::Void => summary.voids += count,
            }
        }

        Ok(summary)
    }
}

/// Database row representation
#[derive(sqlx::FromRow)]
struct TipRow {
    id: i64,
    fixture_id: i64,
    tip_date: String,
    matchup: String,
    home_id: i64,
    away_id: i64,
    market: String,
    probability: f64,
    outcome: String,
    created_at: String,
    settled_at: Option<String>,
}

/// Convert rows, skipping (and logging) any that no longer decode
fn decode_rows(rows: Vec<TipRow>) -> Vec<TipRecord> {
    rows.into_iter()
        .filter_map(|row| match TipRecord::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable tip row: {}", e);
                None
            }
        })
        .collect()
}

fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl TryFrom<TipRow> for TipRecord {
    type Error = anyhow::Error;

    fn try_from(row: TipRow) -> Result<Self> {
        let market = Market::parse(&row.market)
            .with_context(|| format!("tip {} has unknown market {}", row.id, row.market))?;

        Ok(TipRecord {
            id: Some(row.id),
            fixture_id: row.fixture_id,
            tip_date: NaiveDate::parse_from_str(&row.tip_date, "%Y-%m-%d")
                .context("Invalid tip date")?,
            matchup: row.matchup,
            home_id: row.home_id,
            away_id: row.away_id,
            market,
            probability: row.probability,
            outcome: TipOutcome::parse(&row.outcome),
            created_at: parse_time(&row.created_at)
                .with_context(|| format!("tip {} has invalid created_at {}", row.id, row.created_at))?,
            settled_at: row.settled_at.as_deref().and_then(parse_time),
        })
    }
}
