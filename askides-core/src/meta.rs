//! Page metadata: title, description, Open Graph, Twitter Card and
//! canonical link entries.
//!
//! Entry order is part of the output contract. Head renderers emit the
//! entries in sequence, and crawlers treat reordered or duplicated tags as
//! different pages.

use crate::config::Config;
use crate::escape::html_escape;
use serde::{Deserialize, Serialize};

/// One `<head>` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataEntry {
    Title {
        title: String,
    },
    Name {
        name: String,
        content: String,
    },
    Property {
        property: String,
        content: String,
    },
    Link {
        #[serde(rename = "tagName")]
        tag_name: String,
        rel: String,
        href: String,
    },
}

impl MetadataEntry {
    fn name(name: &str, content: impl Into<String>) -> Self {
        Self::Name {
            name: name.to_string(),
            content: content.into(),
        }
    }

    fn property(property: &str, content: impl Into<String>) -> Self {
        Self::Property {
            property: property.to_string(),
            content: content.into(),
        }
    }

    /// Render as an HTML head element
    pub fn to_html(&self) -> String {
        match self {
            Self::Title { title } => format!("<title>{}</title>", html_escape(title)),
            Self::Name { name, content } => format!(
                r#"<meta name="{}" content="{}">"#,
                html_escape(name),
                html_escape(content)
            ),
            Self::Property { property, content } => format!(
                r#"<meta property="{}" content="{}">"#,
                html_escape(property),
                html_escape(content)
            ),
            Self::Link {
                tag_name,
                rel,
                href,
            } => format!(
                r#"<{} rel="{}" href="{}">"#,
                html_escape(tag_name),
                html_escape(rel),
                html_escape(href)
            ),
        }
    }
}

/// Render a metadata sequence as head markup, one element per line
pub fn render_head(entries: &[MetadataEntry]) -> String {
    entries
        .iter()
        .map(MetadataEntry::to_html)
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Default)]
pub struct MetadataOptions {
    /// Site-relative path of the page; defaults to `/`
    pub canonical_path: Option<String>,

    /// Preview image: absolute URL, or a site path joined to the base URL.
    /// Defaults to the generated `/image?title=` endpoint.
    pub image_url: Option<String>,
}

impl MetadataOptions {
    pub fn canonical(path: impl Into<String>) -> Self {
        Self {
            canonical_path: Some(path.into()),
            image_url: None,
        }
    }
}

/// Builds the metadata sequence for a page
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    base_url: String,
    twitter_site: String,
    image_width: u32,
    image_height: u32,
}

impl MetadataBuilder {
    pub fn new(base_url: impl Into<String>, twitter_site: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            twitter_site: twitter_site.into(),
            image_width: 1200,
            image_height: 630,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_url(), config.site.twitter.clone())
            .with_image_size(config.image.width, config.image.height)
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// URL of the generated social image for `title`.
    ///
    /// Every byte outside `A-Za-z0-9-._~` is percent-encoded, including
    /// `!'()*`, so `Hello!` becomes `Hello%21`. The image endpoint decodes
    /// both forms identically.
    pub fn social_image_url(&self, title: &str) -> String {
        format!("{}/image?title={}", self.base_url, urlencoding::encode(title))
    }

    /// Build the ordered metadata entries.
    ///
    /// The canonical URL is the base URL followed by the canonical path
    /// verbatim; paths must already be normalised.
    pub fn build(
        &self,
        title: &str,
        description: &str,
        opts: &MetadataOptions,
    ) -> Vec<MetadataEntry> {
        let canonical_path = opts.canonical_path.as_deref().unwrap_or("/");
        let canonical_url = format!("{}{}", self.base_url, canonical_path);
        let image_url = match opts.image_url.as_deref() {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.to_string()
            }
            Some(path) => format!("{}{}", self.base_url, path),
            None => self.social_image_url(title),
        };

        vec![
            MetadataEntry::Title {
                title: title.to_string(),
            },
            MetadataEntry::name("description", description),
            // Open Graph
            MetadataEntry::property("og:type", "website"),
            MetadataEntry::property("og:url", canonical_url.as_str()),
            MetadataEntry::property("og:title", title),
            MetadataEntry::property("og:description", description),
            MetadataEntry::property("og:image", image_url.as_str()),
            MetadataEntry::property("og:image:width", self.image_width.to_string()),
            MetadataEntry::property("og:image:height", self.image_height.to_string()),
            MetadataEntry::property("og:image:alt", title),
            // Twitter
            MetadataEntry::name("twitter:card", "summary_large_image"),
            MetadataEntry::name("twitter:site", self.twitter_site.as_str()),
            MetadataEntry::name("twitter:title", title),
            MetadataEntry::name("twitter:description", description),
            MetadataEntry::name("twitter:image", image_url.as_str()),
            MetadataEntry::name("twitter:image:alt", title),
            // Canonical
            MetadataEntry::Link {
                tag_name: "link".into(),
                rel: "canonical".into(),
                href: canonical_url,
            },
        ]
    }
}
