use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Notion accepts at most this many characters in one rich-text object.
pub const MAX_TEXT_LENGTH: usize = 2000;
/// Notion accepts at most this many rich-text objects per property.
pub const MAX_RICH_TEXT_SEGMENTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RichText {
    pub text: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub start: String,
}

/// A single database property value, serialized the way the pages endpoint
/// expects it, e.g. `{"url": "https://..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Url(String),
    Date(DateValue),
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// Splits `text` into rich-text segments that respect Notion's size limits.
/// Text past the last allowed segment is dropped.
pub fn rich_text(text: &str) -> Vec<RichText> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_LENGTH)
        .take(MAX_RICH_TEXT_SEGMENTS)
        .map(|chunk| RichText {
            text: TextContent {
                content: chunk.iter().collect(),
            },
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedPage {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rejected with {status} {code}: {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("server error {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    /// Notion answered but the body could not be read. The page may already
    /// exist, so retrying after this can create a duplicate.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for NotionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NotionError::Timeout
        } else if err.is_decode() {
            NotionError::InvalidResponse(err.to_string())
        } else {
            NotionError::Transport(err.without_url().to_string())
        }
    }
}

/// The one Notion operation the relay depends on.
#[async_trait]
pub trait PageCreator: Send + Sync {
    async fn create_database_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> std::result::Result<CreatedPage, NotionError>;
}

/// Error body returned by the Notion API.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub struct NotionClient {
    http: Client,
    base_url: String,
    token: String,
    version: String,
}

impl NotionClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(config.notion_timeout)
            .connect_timeout(config.notion_timeout.min(std::time::Duration::from_secs(5)))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(NotionClient {
            http,
            base_url: config.notion_api_base_url.clone(),
            token: config.notion_token.clone(),
            version: config.notion_version.clone(),
        })
    }
}

#[async_trait]
impl PageCreator for NotionClient {
    async fn create_database_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> std::result::Result<CreatedPage, NotionError> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });

        let res = self
            .http
            .post(format!("{}/pages", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            let page: CreatedPage = res.json().await?;
            return Ok(page);
        }

        let text = res.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.code, body.message),
            Err(_) => (String::new(), text),
        };
        tracing::debug!(status = status.as_u16(), code = %code, "Notion returned an error");

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NotionError::Unauthorized(message),
            StatusCode::TOO_MANY_REQUESTS => NotionError::RateLimited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => NotionError::Timeout,
            s if s.is_server_error() => NotionError::ServerError {
                status: s.as_u16(),
                message,
            },
            s => NotionError::Rejected {
                status: s.as_u16(),
                code,
                message,
            },
        })
    }
}
