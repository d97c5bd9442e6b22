//! Content model structs for articles.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Front-matter attributes of an article file.
///
/// Every field is optional: a document missing a key simply produces an
/// article without that field, nothing is validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArticleAttributes {
    /// The `date` attribute as a UTC timestamp, when it parses
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(parse_date)
    }
}

/// Listing entry: attributes plus the slug derived from the file path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePreview {
    pub slug: String,

    #[serde(flatten)]
    pub attributes: ArticleAttributes,
}

impl ArticlePreview {
    pub fn title(&self) -> &str {
        self.attributes.title.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.attributes.description.as_deref().unwrap_or_default()
    }

    /// Site-relative URL of the article page
    pub fn url(&self) -> String {
        format!("/s/{}", self.slug)
    }
}

/// A fully rendered article.
///
/// `content` is HTML produced from author-controlled markdown and is emitted
/// unescaped. Never build an `Article` from markdown an outsider can write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub preview: ArticlePreview,

    pub content: String,
}

impl Article {
    pub fn slug(&self) -> &str {
        &self.preview.slug
    }

    pub fn title(&self) -> &str {
        self.preview.title()
    }

    pub fn description(&self) -> &str {
        self.preview.description()
    }
}

/// Parse a front-matter date.
///
/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and
/// `Month D, YYYY`. Naive values are taken as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}
