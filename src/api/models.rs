use serde::{Deserialize, Serialize};
use chrono::{DateTime, SecondsFormat, Utc};
use url::Url;

use crate::config::PropertyNames;
use crate::error::{AppError, Result};
use crate::notion::{DateValue, Properties, PropertyValue, rich_text};

/// Body of `POST /chat-summary`, as sent by the caller. Fields stay optional
/// here so a missing field is reported by name instead of as a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct ChatSummaryRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSummary {
    pub title: String,
    pub summary: String,
    pub content: Option<String>,
    /// Exactly as the caller sent it; parsing only checks it.
    pub url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ChatSummaryRequest {
    pub fn validate(self) -> Result<ChatSummary> {
        let title = non_blank(self.title)
            .ok_or_else(|| AppError::ValidationError("title is required and must not be empty".into()))?;
        let summary = non_blank(self.summary)
            .ok_or_else(|| AppError::ValidationError("summary is required and must not be empty".into()))?;

        let url = match non_blank(self.url) {
            Some(raw) => {
                let parsed = Url::parse(raw.trim())
                    .map_err(|e| AppError::ValidationError(format!("url is not a valid URL: {}", e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::ValidationError("url must use http or https".into()));
                }
                Some(raw)
            }
            None => None,
        };

        Ok(ChatSummary {
            title,
            summary,
            content: self.content.filter(|c| !c.is_empty()),
            url,
        })
    }
}

/// Property set for one new database row. Built, sent, and dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct NotionPageRecord {
    pub properties: Properties,
}

impl NotionPageRecord {
    pub fn new(summary: &ChatSummary, names: &PropertyNames, created_at: DateTime<Utc>) -> Self {
        let mut properties = Properties::new();
        properties.insert(names.title.clone(), PropertyValue::Title(rich_text(&summary.title)));
        properties.insert(names.summary.clone(), PropertyValue::RichText(rich_text(&summary.summary)));
        if let Some(content) = &summary.content {
            properties.insert(names.content.clone(), PropertyValue::RichText(rich_text(content)));
        }
        if let Some(url) = &summary.url {
            properties.insert(names.url.clone(), PropertyValue::Url(url.clone()));
        }
        properties.insert(
            names.date.clone(),
            PropertyValue::Date(DateValue {
                start: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            }),
        );

        NotionPageRecord { properties }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatSummaryResponse {
    pub page_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(title: Option<&str>, summary: Option<&str>) -> ChatSummaryRequest {
        ChatSummaryRequest {
            title: title.map(str::to_string),
            summary: summary.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_required_fields_are_named() {
        let err = request(None, Some("S")).validate().unwrap_err();
        assert!(err.to_string().contains("title"));

        let err = request(Some("T"), None).validate().unwrap_err();
        assert!(err.to_string().contains("summary"));

        let err = request(Some("   "), Some("S")).validate().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let mut req = request(Some("T"), Some("S"));
        req.url = Some("invalid-url".into());
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("url"));

        let mut req = request(Some("T"), Some("S"));
        req.url = Some("ftp://example.com/file".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_optional_fields_are_dropped() {
        let mut req = request(Some("T"), Some("S"));
        req.content = Some(String::new());
        req.url = Some(String::new());
        let summary = req.validate().unwrap();
        assert_eq!(summary.content, None);
        assert_eq!(summary.url, None);
    }

    #[test]
    fn test_whitespace_content_is_kept() {
        let mut req = request(Some("T"), Some("S"));
        req.content = Some("   ".into());
        let summary = req.validate().unwrap();
        assert_eq!(summary.content.as_deref(), Some("   "));
    }

    #[test]
    fn test_url_is_sent_as_given() {
        for given in [
            "https://chat.openai.com",
            "https://Example.COM/a b",
            "https://example.com/../x",
        ] {
            let mut req = request(Some("T"), Some("S"));
            req.url = Some(given.into());
            let summary = req.validate().unwrap();
            let record = NotionPageRecord::new(&summary, &PropertyNames::default(), Utc::now());
            assert_eq!(record.properties["URL"], PropertyValue::Url(given.into()));
        }
    }

    #[test]
    fn test_minimal_record_has_title_summary_and_date_only() {
        let summary = request(Some("T"), Some("S")).validate().unwrap();
        let created_at = Utc.with_ymd_and_hms(2024, 3, 30, 1, 0, 0).unwrap();
        let record = NotionPageRecord::new(&summary, &PropertyNames::default(), created_at);

        let keys: Vec<&str> = record.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Date", "Name", "Summary"]);
        assert_eq!(
            record.properties["Date"],
            PropertyValue::Date(DateValue {
                start: "2024-03-30T01:00:00Z".into()
            })
        );
        assert_eq!(record.properties["Name"], PropertyValue::Title(rich_text("T")));
    }

    #[test]
    fn test_full_record_includes_content_and_url() {
        let req = ChatSummaryRequest {
            title: Some("T".into()),
            summary: Some("S".into()),
            content: Some("C".into()),
            url: Some("https://chat.openai.com/c/abc".into()),
        };
        let summary = req.validate().unwrap();
        let record = NotionPageRecord::new(&summary, &PropertyNames::default(), Utc::now());

        assert_eq!(record.properties.len(), 5);
        assert_eq!(record.properties["Content"], PropertyValue::RichText(rich_text("C")));
        assert_eq!(
            record.properties["URL"],
            PropertyValue::Url("https://chat.openai.com/c/abc".into())
        );
    }
}
