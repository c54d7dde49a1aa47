use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::api::telegram::{ReplyKeyboard, TgUpdate};
use crate::api::TelegramClient;
use crate::format;
use crate::service::{RateLimiter, TipService};

pub const BUTTON_TIPS: &str = "🔥 Tips";
pub const BUTTON_TODAY: &str = "📊 Today's matches";
pub const BUTTON_STATS: &str = "📈 Stats";

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// What a chat message asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Today,
    Tips,
    Stats,
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        // "/tips@my_bot extra" -> "/tips"
        let word = text
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();

        match word.as_str() {
            "/start" => Command::Start,
            "/help" => Command::Help,
            "/today" | "/hoy" | "/partidos" => Command::Today,
            "/tips" | "/pronosticos" => Command::Tips,
            "/stats" => Command::Stats,
            _ if text == BUTTON_TIPS => Command::Tips,
            _ if text == BUTTON_TODAY => Command::Today,
            _ if text == BUTTON_STATS => Command::Stats,
            _ => Command::Unknown,
        }
    }

    /// Commands that hit the sports API and count against the user's cooldown
    fn is_rate_limited(&self) -> bool {
        matches!(self, Command::Today | Command::Tips)
    }
}

/// Worker that long-polls Telegram and answers commands
pub struct BotWorker {
    client: TelegramClient,
    service: Arc<TipService>,
    rate_limiter: RateLimiter,
    keyboard: ReplyKeyboard,
    poll_timeout: Duration,
    max_tips: usize,
}

impl BotWorker {
    /// Create a new bot worker
    pub fn new(
        client: TelegramClient,
        service: Arc<TipService>,
        user_cooldown_secs: u64,
        poll_timeout_secs: u64,
        max_tips: usize,
    ) -> Self {
        Self {
            client,
            service,
            rate_limiter: RateLimiter::new(Duration::from_secs(user_cooldown_secs)),
            keyboard: ReplyKeyboard::column(&[BUTTON_TIPS, BUTTON_TODAY, BUTTON_STATS]),
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            max_tips,
        }
    }

    /// Run the worker loop
    pub async fn run(mut self) {
        info!("Bot worker started (poll timeout: {:?})", self.poll_timeout);

        let mut offset = 0;

        loop {
            let updates = match self.client.get_updates(offset, self.poll_timeout).await {
                Ok(updates) => updates,
                Err(e) => {
                    error!("Failed to fetch Telegram updates: {}", e);
                    time::sleep(ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                self.handle_update(update).await;
            }

            self.rate_limiter.purge(Instant::now());
            self.service.purge_expired().await;
        }
    }

    async fn handle_update(&mut self, update: TgUpdate) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.as_deref() else {
            return;
        };

        let chat_id = message.chat.id;
        let user_id = message.from.as_ref().map(|u| u.id).unwrap_or(chat_id);
        let command = Command::parse(text);

        debug!("Chat {} user {} sent {:?}", chat_id, user_id, command);

        let reply = self.reply_for(command, user_id, Instant::now()).await;

        if let Err(e) = self
            .client
            .send_message(chat_id, &reply, Some(&self.keyboard))
            .await
        {
            warn!("Failed to reply to chat {}: {}", chat_id, e);
        }
    }

    /// Build the reply text for a command
    pub async fn reply_for(&mut self, command: Command, user_id: i64, now: Instant) -> String {
        if command.is_rate_limited() {
            if let Err(remaining) = self.rate_limiter.check(user_id, now) {
                info!("User {} rate limited for {:?}", user_id, remaining);
                return format::cooldown_message(remaining);
            }
        }

        match command {
            Command::Start | Command::Help => format::help_message(),
            Command::Today => match self.service.fixtures_today().await {
                Ok(fixtures) => format::fixtures_message(Utc::now().date_naive(), &fixtures),
                Err(e) => {
                    error!("Failed to fetch fixtures: {}", e);
                    format::error_message()
                }
            },
            Command::Tips => match self.service.tips_today().await {
                Ok(tips) => format::tips_message(Utc::now().date_naive(), &tips, self.max_tips),
                Err(e) => {
                    error!("Failed to build tips: {}", e);
                    format::error_message()
                }
            },
            Command::Stats => match self.service.store().summary().await {
                Ok(summary) => format::stats_message(&summary),
                Err(e) => {
                    error!("Failed to read tip ledger: {}", e);
                    format::error_message()
                }
            },
            Command::Unknown => format::unknown_command_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TipStore;
    use crate::error::ApiError;
    use crate::prediction::EloTable;
    use crate::service::TipSettings;
    use crate::testing::{fixture, StubProvider};
    use tokio::sync::RwLock;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/tips@football_tips_bot"), Command::Tips);
        assert_eq!(Command::parse("  /HOY  "), Command::Today);
        assert_eq!(Command::parse("/stats please"), Command::Stats);
        assert_eq!(Command::parse(BUTTON_TIPS), Command::Tips);
        assert_eq!(Command::parse(BUTTON_TODAY), Command::Today);
        assert_eq!(Command::parse("hello"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
    }

    async fn worker(provider: Arc<StubProvider>) -> BotWorker {
        let store = Arc::new(TipStore::new("sqlite::memory:").await.unwrap());
        let service = Arc::new(TipService::new(
            provider,
            store,
            Arc::new(RwLock::new(EloTable::new())),
            TipSettings {
                cache_ttl: Duration::from_secs(300),
                form_matches: 10,
                min_probability: 0.0,
            },
        ));
        let client =
            TelegramClient::new("http://localhost:1", "test-token", Duration::from_secs(1))
                .unwrap();
        BotWorker::new(client, service, 30, 1, 10)
    }

    #[tokio::test]
    async fn test_tips_reply_and_cooldown() {
        let provider = Arc::new(StubProvider::new(vec![fixture(
            1,
            (10, "Arsenal"),
            (20, "Chelsea"),
        )]));
        let mut bot = worker(provider).await;
        let now = Instant::now();

        let reply = bot.reply_for(Command::Tips, 7, now).await;
        assert!(reply.contains("Arsenal vs Chelsea"));

        let reply = bot.reply_for(Command::Tips, 7, now + Duration::from_secs(5)).await;
        assert!(reply.contains("Please wait 25s"));

        // Help is never rate limited
        let reply = bot.reply_for(Command::Help, 7, now + Duration::from_secs(5)).await;
        assert!(reply.contains("/tips"));
    }

    #[tokio::test]
    async fn test_provider_failure_reply() {
        let provider = Arc::new(StubProvider::new(vec![]));
        provider.fail_next_fixtures(ApiError::Unauthorized("bad token".into()));
        let mut bot = worker(provider).await;

        let reply = bot.reply_for(Command::Today, 1, Instant::now()).await;
        assert_eq!(reply, format::error_message());
    }

    #[tokio::test]
    async fn test_stats_reply() {
        let provider = Arc::new(StubProvider::new(vec![fixture(1, (10, "A"), (20, "B"))]));
        let mut bot = worker(provider).await;

        bot.reply_for(Command::Tips, 1, Instant::now()).await;
        let reply = bot.reply_for(Command::Stats, 1, Instant::now()).await;
        assert!(reply.contains("Total: 1"));
        assert!(reply.contains("Pending: 1"));
    }
}
