//! Reply text for the bot. Everything is Telegram HTML.

use std::fmt::Write;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::LedgerSummary;
use crate::models::{EstimateSource, Fixture, MatchStatus, Tip};

/// Escape the characters Telegram HTML treats specially
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn status_suffix(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::Scheduled => "",
        MatchStatus::Live => " 🔴 live",
        MatchStatus::Finished => " (FT)",
        MatchStatus::Postponed => " (postponed)",
        MatchStatus::Cancelled => " (cancelled)",
        MatchStatus::Unknown => "",
    }
}

/// Kickoff as `HH:MM`, prefixed with the day when it is not on `date`
fn kickoff_label(kickoff: DateTime<Utc>, date: NaiveDate) -> String {
    if kickoff.date_naive() == date {
        kickoff.format("%H:%M").to_string()
    } else {
        kickoff.format("%a %d %b %H:%M").to_string()
    }
}

pub fn fixtures_message(date: NaiveDate, fixtures: &[Fixture]) -> String {
    if fixtures.is_empty() {
        return "⚠️ No matches found today.".to_string();
    }

    let mut msg = if fixtures.iter().all(|f| f.kickoff.date_naive() == date) {
        format!("📊 <b>Matches for {}</b>\n\n", date.format("%Y-%m-%d"))
    } else {
        String::from("📊 <b>No matches today. Coming up next:</b>\n\n")
    };
    for f in fixtures {
        let _ = writeln!(
            msg,
            "{} | {} vs {} <i>({})</i>{}",
            kickoff_label(f.kickoff, date),
            escape_html(&f.home.name),
            escape_html(&f.away.name),
            escape_html(&f.league.name),
            status_suffix(f.status),
        );
    }
    msg
}

pub fn tips_message(date: NaiveDate, tips: &[Tip], max_tips: usize) -> String {
    if tips.is_empty() {
        return "⚠️ No tips available right now.".to_string();
    }

    let mut msg = if tips.iter().all(|t| t.fixture.kickoff.date_naive() == date) {
        String::from("🔥 <b>Today's tips</b>\n\n")
    } else {
        String::from("🔥 <b>Upcoming tips</b>\n\n")
    };
    for tip in tips.iter().take(max_tips) {
        let _ = writeln!(
            msg,
            "<b>{} vs {}</b>\n{} · {} UTC\n➡️ {}: <b>{}</b>",
            escape_html(&tip.fixture.home.name),
            escape_html(&tip.fixture.away.name),
            escape_html(&tip.fixture.league.name),
            kickoff_label(tip.fixture.kickoff, date),
            tip.market.label(),
            percent(tip.probability),
        );
        if tip.source == EstimateSource::LeagueAverage {
            msg.push_str("<i>No team data, based on league averages</i>\n");
        }
        msg.push('\n');
    }

    if tips.len() > max_tips {
        let _ = writeln!(msg, "…and {} more", tips.len() - max_tips);
    }
    msg.push_str("<i>Model estimates only. Bet responsibly.</i>");
    msg
}

pub fn stats_message(summary: &LedgerSummary) -> String {
    let hit_rate = summary
        .hit_rate()
        .map(percent)
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "📈 <b>Tip record</b>\n\nTotal: {}\n✅ Won: {}\n❌ Lost: {}\n⏳ Pending: {}\n➖ Void: {}\nHit rate: <b>{}</b>",
        summary.total, summary.wins, summary.losses, summary.pending, summary.voids, hit_rate
    )
}

pub fn help_message() -> String {
    "⚽ <b>Football tips bot</b>\n\n\
     /today - today's matches\n\
     /tips - best market for each match\n\
     /stats - how past tips did\n\
     /help - this message"
        .to_string()
}

pub fn cooldown_message(remaining: Duration) -> String {
    format!(
        "⏳ Please wait {}s before asking again.",
        remaining.as_secs().max(1)
    )
}

pub fn error_message() -> String {
    "⚠️ Could not reach the football data service. Try again in a few minutes.".to_string()
}

pub fn unknown_command_message() -> String {
    "🤔 Unknown command. Send /help to see what I can do.".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Market, MarketProbabilities};
    use crate::testing::fixture;

    fn tip(id: i64, market: Market, probability: f64, source: EstimateSource) -> Tip {
        Tip {
            fixture: fixture(id, (1, "Brighton & Hove"), (2, "<Wolves>")),
            market,
            probability,
            source,
            probabilities: MarketProbabilities::new(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("A & B <c>"), "A &amp; B &lt;c&gt;");
    }

    #[test]
    fn test_fixtures_message() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let msg = fixtures_message(date, &[fixture(1, (1, "Arsenal"), (2, "Chelsea"))]);
        assert!(msg.contains("Matches for 2026-10-18"));
        assert!(msg.contains("19:00 | Arsenal vs Chelsea"));
        assert!(msg.contains("Premier League"));

        assert!(fixtures_message(date, &[]).contains("No matches"));
    }

    #[test]
    fn test_later_fixtures_show_their_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let msg = fixtures_message(date, &[fixture(1, (1, "Arsenal"), (2, "Chelsea"))]);
        assert!(!msg.contains("Matches for"));
        assert!(msg.contains("Coming up next"));
        assert!(msg.contains("Sun 18 Oct 19:00 | Arsenal vs Chelsea"));

        let tips = vec![tip(1, Market::Over15, 0.7, EstimateSource::TeamForm)];
        let msg = tips_message(date, &tips, 5);
        assert!(msg.contains("Upcoming tips"));
        assert!(msg.contains("Sun 18 Oct 19:00 UTC"));
    }

    #[test]
    fn test_tips_message() {
        let tips = vec![
            tip(1, Market::Over15, 0.784, EstimateSource::TeamForm),
            tip(2, Market::Btts, 0.55, EstimateSource::LeagueAverage),
            tip(3, Market::Draw, 0.3, EstimateSource::TeamForm),
        ];
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let msg = tips_message(date, &tips, 2);

        assert!(msg.contains("Brighton &amp; Hove vs &lt;Wolves&gt;"));
        assert!(msg.contains("Over 1.5 goals: <b>78.4%</b>"));
        assert!(msg.contains("league averages"));
        assert!(msg.contains("and 1 more"));
        assert!(!msg.contains("Draw:"));
    }

    #[test]
    fn test_stats_message() {
        let summary = LedgerSummary {
            total: 5,
            pending: 1,
            wins: 3,
            losses: 1,
            voids: 0,
        };
        let msg = stats_message(&summary);
        assert!(msg.contains("Won: 3"));
        assert!(msg.contains("75.0%"));

        assert!(stats_message(&LedgerSummary::default()).contains("n/a"));
    }

    #[test]
    fn test_cooldown_message_rounds_up_to_one() {
        assert!(cooldown_message(Duration::from_millis(300)).contains("1s"));
        assert!(cooldown_message(Duration::from_secs(12)).contains("12s"));
    }
}
