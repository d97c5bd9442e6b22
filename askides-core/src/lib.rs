//! # askides-core
//!
//! Core library for the askides blog.
//!
//! This crate reads the article directory (front-matter + markdown), renders
//! article bodies to HTML, and builds the page metadata, sitemap and robots
//! documents served by `askides-server`. Everything here is synchronous and
//! stateless: each call reads fresh from disk.

pub mod articles;
pub mod config;
pub mod escape;
pub mod frontmatter;
pub mod markdown;
pub mod meta;
pub mod models;
pub mod sitemap;
pub mod slug;

pub use articles::{ArticleError, ArticleRepository, ARTICLE_EXTENSION};
pub use config::Config;
pub use meta::{MetadataBuilder, MetadataEntry, MetadataOptions};
pub use models::{Article, ArticleAttributes, ArticlePreview};
pub use slug::InvalidSlug;
