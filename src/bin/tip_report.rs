use std::env;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use football_tips::db::TipStore;
use football_tips::format::stats_message;
use football_tips::models::TipOutcome;

const DEFAULT_LIMIT: i64 = 20;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tip_report=info,football_tips=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse arguments
    let args: Vec<String> = env::args().collect();
    let limit = parse_limit(&args);

    dotenvy::dotenv().ok();
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/tips.db".to_string());

    info!("Reading tip ledger from {}", database_url);
    let store = TipStore::new(&database_url).await?;

    let summary = store.summary().await?;
    println!("{}", strip_tags(&stats_message(&summary)));
    println!();

    let tips = store.recent_tips(limit).await?;
    println!("Last {} tips:", tips.len());
    for tip in tips {
        let marker = match tip.outcome {
            TipOutcome::Pending => "…",
            TipOutcome::Win => "✔",
            TipOutcome::Loss => "✘",
            TipOutcome::Void => "-",
        };
        println!(
            "{} {} | {:<40} | {:<10} {:>5.1}% | {}",
            marker,
            tip.tip_date,
            tip.matchup,
            tip.market.as_str(),
            tip.probability * 100.0,
            tip.outcome.as_str()
        );
    }

    Ok(())
}

fn parse_limit(args: &[String]) -> i64 {
    for (i, arg) in args.iter().enumerate() {
        if arg == "--limit" || arg == "-n" {
            if let Some(value) = args.get(i + 1) {
                if let Ok(limit) = value.parse() {
                    return limit;
                }
            }
        }
    }
    DEFAULT_LIMIT
}

/// The summary is Telegram HTML; print it as plain text
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
