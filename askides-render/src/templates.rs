//! Askama template definitions.

use askama::Template;
use askides_core::escape::html_escape;
use askides_core::meta::{render_head, MetadataEntry};
use askides_core::{Article, ArticlePreview, Config};
use chrono::Datelike;

fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// A story link in the index list
#[derive(Debug, Clone)]
pub struct StoryEntry {
    pub url: String,
    pub title: String,
    pub date: Option<String>,
}

impl From<&ArticlePreview> for StoryEntry {
    fn from(preview: &ArticlePreview) -> Self {
        Self {
            url: preview.url(),
            title: preview.title().to_string(),
            date: preview.attributes.date.clone(),
        }
    }
}

/// Landing page: intro, story list and subscribe form
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    // Pre-rendered <head> metadata
    pub head: String,

    // Site metadata
    pub site_title: String,
    pub site_author: String,
    pub site_intro: Option<String>,
    pub year: i32,

    // One-shot session values
    pub message: Option<String>,
    pub error: Option<String>,

    pub stories: Vec<StoryEntry>,
}

impl IndexTemplate {
    pub fn new(
        config: &Config,
        metadata: &[MetadataEntry],
        stories: &[ArticlePreview],
        message: Option<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            head: render_head(metadata),
            site_title: config.site.title.clone(),
            site_author: config.site.author.clone(),
            site_intro: config.site.intro.clone(),
            year: current_year(),
            message,
            error,
            stories: stories.iter().map(StoryEntry::from).collect(),
        }
    }
}

/// Single article page
#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleTemplate {
    pub head: String,
    pub site_title: String,
    pub site_author: String,
    pub year: i32,

    pub title: String,
    pub date: Option<String>,

    /// Rendered article HTML, inserted unescaped
    pub content: String,
}

impl ArticleTemplate {
    pub fn new(config: &Config, metadata: &[MetadataEntry], article: &Article) -> Self {
        Self {
            head: render_head(metadata),
            site_title: config.site.title.clone(),
            site_author: config.site.author.clone(),
            year: current_year(),
            title: article.title().to_string(),
            date: article.preview.attributes.date.clone(),
            content: article.content.clone(),
        }
    }
}

/// 404 error page template
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub head: String,
    pub site_title: String,
    pub site_author: String,
    pub year: i32,
}

impl NotFoundTemplate {
    pub fn new(config: &Config) -> Self {
        Self {
            head: format!(
                "<title>Not Found | {}</title>",
                html_escape(&config.site.title)
            ),
            site_title: config.site.title.clone(),
            site_author: config.site.author.clone(),
            year: current_year(),
        }
    }
}

/// Subscription confirmation e-mail
#[derive(Template)]
#[template(path = "emails/subscribe.html")]
pub struct SubscribeEmailTemplate {
    pub site_title: String,
    /// Confirmation link
    pub href: String,
}
