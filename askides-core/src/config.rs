//! Site configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the askides.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub image: ImageConfig,

    /// Permanent redirects, keyed by request path
    #[serde(default)]
    pub redirects: BTreeMap<String, String>,

    #[serde(default = "default_robots")]
    pub robots: Vec<RobotsRule>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,

    #[serde(default)]
    pub author: String,

    /// Absolute base URL, e.g. "https://askides.com" (no trailing slash)
    pub url: String,

    #[serde(default)]
    pub intro: Option<String>,

    #[serde(default = "default_twitter")]
    pub twitter: String,
}

fn default_twitter() -> String {
    String::from("@usevoltion")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_articles")]
    pub articles: PathBuf,

    /// Font file used by the social image renderer
    #[serde(default)]
    pub font: Option<PathBuf>,
}

fn default_articles() -> PathBuf {
    PathBuf::from("articles")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            articles: default_articles(),
            font: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_width")]
    pub width: u32,

    #[serde(default = "default_image_height")]
    pub height: u32,

    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,

    #[serde(default = "default_gradient_from")]
    pub gradient_from: String,

    #[serde(default = "default_gradient_to")]
    pub gradient_to: String,
}

fn default_image_width() -> u32 {
    1200
}

fn default_image_height() -> u32 {
    630
}

fn default_fallback_title() -> String {
    String::from("Askides")
}

fn default_gradient_from() -> String {
    String::from("#1a2980")
}

fn default_gradient_to() -> String {
    String::from("#2196f3")
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: default_image_width(),
            height: default_image_height(),
            fallback_title: default_fallback_title(),
            gradient_from: default_gradient_from(),
            gradient_to: default_gradient_to(),
        }
    }
}

/// One `User-agent` group in robots.txt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsRule {
    pub agent: String,

    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default)]
    pub disallow: Vec<String>,
}

fn default_robots() -> Vec<RobotsRule> {
    vec![RobotsRule {
        agent: "*".into(),
        allow: vec!["/".into()],
        disallow: vec![],
    }]
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from a YAML string; relative paths resolve
    /// against the working directory.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Get the article content root, resolved relative to the config file
    pub fn articles_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.articles)
    }

    /// Get the social image font file, resolved relative to the config file
    pub fn font_path(&self) -> Option<PathBuf> {
        self.paths.font.as_ref().map(|p| self.resolve_path(p))
    }

    /// Site base URL exactly as configured
    pub fn base_url(&self) -> &str {
        &self.site.url
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
