//! Front-matter parsing from article files.

use crate::models::ArticleAttributes;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^\x{FEFF}?---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|$)(.*)$").unwrap()
    })
}

/// Split a document into its front-matter attributes and markdown body.
///
/// Documents without a leading `---` block parse to empty attributes with the
/// whole text as body. Unknown keys are ignored.
///
/// # Example
///
/// ```
/// use askides_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ndate: 2025-01-01\n---\n# Hello World\n";
///
/// let (attrs, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(attrs.title.as_deref(), Some("My Post"));
/// assert_eq!(attrs.date.as_deref(), Some("2025-01-01"));
/// assert_eq!(body, "# Hello World\n");
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(ArticleAttributes, &str), FrontmatterError> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return Ok((ArticleAttributes::default(), content));
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    // An empty block is valid and carries no attributes
    let attributes = if yaml.trim().is_empty() {
        ArticleAttributes::default()
    } else {
        serde_yaml::from_str::<Option<ArticleAttributes>>(yaml)?.unwrap_or_default()
    };

    Ok((attributes, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Test Post
description: A test post
date: 2025-01-01
---

# Hello World

This is the content."#;

        let (attrs, body) = parse_frontmatter(content).unwrap();
        assert_eq!(attrs.title.as_deref(), Some("Test Post"));
        assert_eq!(attrs.description.as_deref(), Some("A test post"));
        assert_eq!(attrs.date.as_deref(), Some("2025-01-01"));
        assert!(body.contains("# Hello World"));
        assert!(body.contains("This is the content."));
    }

    #[test]
    fn test_missing_fields_stay_empty() {
        let content = "---\ntitle: Only Title\n---\nBody";
        let (attrs, body) = parse_frontmatter(content).unwrap();
        assert_eq!(attrs.title.as_deref(), Some("Only Title"));
        assert_eq!(attrs.date, None);
        assert_eq!(attrs.description, None);
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let content = "---\ntitle: Tagged\ntags:\n  - rust\n---\nContent.";
        let (attrs, _) = parse_frontmatter(content).unwrap();
        assert_eq!(attrs.title.as_deref(), Some("Tagged"));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (attrs, body) = parse_frontmatter(content).unwrap();
        assert_eq!(attrs, ArticleAttributes::default());
        assert_eq!(body, content);
    }

    #[test]
    fn test_empty_frontmatter_block() {
        let (attrs, body) = parse_frontmatter("---\n---\nBody").unwrap();
        assert_eq!(attrs, ArticleAttributes::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (attrs, body) = parse_frontmatter(content).unwrap();
        assert_eq!(attrs.title.as_deref(), Some("Windows"));
        assert_eq!(body, "Body\r\n");
    }

    #[test]
    fn test_quoted_values() {
        let content = "---\ntitle: \"Colons: everywhere\"\ndescription: 'It''s fine'\n---\n";
        let (attrs, body) = parse_frontmatter(content).unwrap();
        assert_eq!(attrs.title.as_deref(), Some("Colons: everywhere"));
        assert_eq!(attrs.description.as_deref(), Some("It's fine"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_invalid_yaml() {
        let content = r#"---
title: Test
invalid yaml: [unclosed
---

Content."#;

        assert!(parse_frontmatter(content).is_err());
    }
}
