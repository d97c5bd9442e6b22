//! Sitemap and robots.txt generation.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://askides.com/</loc>
//!     <lastmod>2025-01-01T00:00:00+00:00</lastmod>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use crate::config::RobotsRule;
use crate::escape::html_escape;
use crate::models::ArticlePreview;
use chrono::{DateTime, SecondsFormat, Utc};

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const HOME_PRIORITY: f32 = 1.0;
const ARTICLE_PRIORITY: f32 = 0.5;

/// Single URL entry in the sitemap
#[derive(Debug, Clone, PartialEq)]
pub struct UrlEntry {
    /// Site-relative path
    pub path: String,
    pub lastmod: DateTime<Utc>,
    pub priority: f32,
}

/// Sitemap data structure
#[derive(Debug, Clone)]
pub struct Sitemap {
    base_url: String,
    urls: Vec<UrlEntry>,
}

impl Sitemap {
    /// Home page plus every article page.
    ///
    /// An article's `lastmod` is its own date when that parses, otherwise
    /// `generated_at`.
    pub fn from_articles(
        base_url: impl Into<String>,
        articles: &[ArticlePreview],
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut urls = vec![UrlEntry {
            path: "/".into(),
            lastmod: generated_at,
            priority: HOME_PRIORITY,
        }];

        urls.extend(articles.iter().map(|article| UrlEntry {
            path: article.url(),
            lastmod: article.attributes.parsed_date().unwrap_or(generated_at),
            priority: ARTICLE_PRIORITY,
        }));

        Self {
            base_url: base_url.into(),
            urls,
        }
    }

    pub fn urls(&self) -> &[UrlEntry] {
        &self.urls
    }

    /// Generate sitemap XML string.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
        xml.push('\n');

        for entry in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!(
                "    <loc>{}</loc>\n",
                html_escape(&format!("{}{}", self.base_url, entry.path))
            ));
            xml.push_str(&format!(
                "    <lastmod>{}</lastmod>\n",
                entry.lastmod.to_rfc3339_opts(SecondsFormat::Secs, false)
            ));
            xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// Render robots.txt: one `User-agent` group per rule, groups separated by
/// a blank line.
pub fn robots_txt(rules: &[RobotsRule]) -> String {
    rules
        .iter()
        .map(|rule| {
            let mut lines = vec![format!("User-agent: {}", rule.agent)];
            lines.extend(rule.allow.iter().map(|path| format!("Allow: {path}")));
            lines.extend(rule.disallow.iter().map(|path| format!("Disallow: {path}")));
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleAttributes;
    use chrono::TimeZone;

    fn preview(slug: &str, date: Option<&str>) -> ArticlePreview {
        ArticlePreview {
            slug: slug.into(),
            attributes: ArticleAttributes {
                title: Some(slug.into()),
                date: date.map(Into::into),
                description: None,
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap()
    }

    #[test]
    fn test_sitemap_entries() {
        let articles = vec![
            preview("tech/foo", Some("2024-01-01")),
            preview("undated", None),
        ];
        let sitemap = Sitemap::from_articles("https://askides.com", &articles, now());

        let urls = sitemap.urls();
        assert_eq!(urls.len(), 3);
        assert_eq!((urls[0].path.as_str(), urls[0].priority), ("/", 1.0));
        assert_eq!(urls[1].path, "/s/tech/foo");
        assert_eq!(urls[1].lastmod, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(urls[2].lastmod, now());
        assert_eq!(urls[2].priority, 0.5);
    }

    #[test]
    fn test_sitemap_xml() {
        let articles = vec![preview("a&b", Some("2024-01-01"))];
        let xml = Sitemap::from_articles("https://askides.com", &articles, now()).to_xml();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
        assert!(xml.contains("<loc>https://askides.com/</loc>"));
        assert!(xml.contains("<lastmod>2025-02-03T04:05:06+00:00</lastmod>"));
        assert!(xml.contains("<priority>1.0</priority>"));
        assert!(xml.contains("<loc>https://askides.com/s/a&amp;b</loc>"));
        assert!(xml.contains("<priority>0.5</priority>"));
        assert!(xml.ends_with("</urlset>\n"));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn test_default_robots() {
        let rules = vec![RobotsRule {
            agent: "*".into(),
            allow: vec!["/".into()],
            disallow: vec![],
        }];
        insta::assert_snapshot!(robots_txt(&rules), @r"
        User-agent: *
        Allow: /
        ");
    }

    #[test]
    fn test_robots_groups() {
        let rules = vec![
            RobotsRule {
                agent: "*".into(),
                allow: vec!["/".into()],
                disallow: vec!["/api/".into()],
            },
            RobotsRule {
                agent: "GPTBot".into(),
                allow: vec![],
                disallow: vec!["/".into()],
            },
        ];
        assert_eq!(
            robots_txt(&rules),
            "User-agent: *\nAllow: /\nDisallow: /api/\n\nUser-agent: GPTBot\nDisallow: /"
        );
    }
}
