use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::read_json;
use crate::error::{ApiError, ApiResult};

/// Client for the Telegram Bot HTTP API
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

/// `{"ok": .., "result": ..}` wrapper around every Bot API reply
#[derive(Debug, Deserialize)]
struct TgResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUpdate {
    pub update_id: i64,
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    pub chat: TgChat,
    pub from: Option<TgUser>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TgUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// Persistent reply keyboard shown under the input field
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboard {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyKeyboard {
    /// One button per row
    pub fn column(labels: &[&str]) -> Self {
        Self {
            keyboard: labels
                .iter()
                .map(|l| vec![KeyboardButton { text: l.to_string() }])
                .collect(),
            resize_keyboard: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyKeyboard>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramClient {
    /// Create a new client; `poll_timeout` is the long-poll window used by `get_updates`
    pub fn new(base_url: &str, token: &str, poll_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let body: TgResponse<T> = read_json(response).await?;
        unwrap_result(body)
    }

    /// Bot's own user, used to check the token at start-up
    pub async fn get_me(&self) -> ApiResult<TgUser> {
        let response = self.client.get(self.method_url("getMe")).send().await?;
        Self::decode(response).await
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout: Duration) -> ApiResult<Vec<TgUpdate>> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", timeout.as_secs().to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ])
            .send()
            .await?;

        let updates: Vec<TgUpdate> = Self::decode(response).await?;
        if !updates.is_empty() {
            debug!("Received {} updates", updates.len());
        }
        Ok(updates)
    }

    /// Send an HTML message, returning its message id
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&ReplyKeyboard>,
    ) -> ApiResult<i64> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: keyboard,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        match Self::decode::<SentMessage>(response).await {
            Ok(sent) => Ok(sent.message_id),
            Err(e) => {
                warn!("Telegram sendMessage to {} failed: {}", chat_id, e);
                Err(e)
            }
        }
    }
}

fn unwrap_result<T>(body: TgResponse<T>) -> ApiResult<T> {
    match (body.ok, body.result) {
        (true, Some(result)) => Ok(result),
        _ => Err(ApiError::provider_error(
            body.description
                .unwrap_or_else(|| "Telegram returned ok=false".to_string()),
        )),
    }
}
