//! Read-only access to the article directory.
//!
//! Every call walks and parses the content root again; nothing is cached, so
//! the files on disk are always the single source of truth.

use crate::{
    frontmatter::{parse_frontmatter, FrontmatterError},
    markdown::MarkdownProcessor,
    models::{Article, ArticleAttributes, ArticlePreview},
    slug::{slug_from_path, slug_from_rel, slug_to_rel, InvalidSlug},
};
use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File extension that marks a file as an article
pub const ARTICLE_EXTENSION: &str = "mdx";

#[derive(Error, Debug)]
pub enum ArticleError {
    #[error("Failed to walk article directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid front-matter in {}: {source}", path.display())]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },
}

/// Article store backed by a directory of front-matter + markdown files
pub struct ArticleRepository {
    root: PathBuf,
    processor: MarkdownProcessor,
}

impl ArticleRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            processor: MarkdownProcessor::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every article under the content root, newest first.
    ///
    /// Any walk, read or front-matter failure fails the whole listing.
    /// Symlinked files resolving outside the root and symlink loops are
    /// skipped with a warning.
    /// Articles whose date is missing or does not parse come last; articles
    /// with equal dates keep directory-walk order.
    pub fn list_articles(&self) -> Result<Vec<ArticlePreview>, ArticleError> {
        let files = self.discover_article_files()?;
        tracing::debug!(root = %self.root.display(), "Found {} article files", files.len());

        let mut previews = files
            .iter()
            .map(|path| self.read_preview(path))
            .collect::<Result<Vec<_>, _>>()?;

        sort_newest_first(&mut previews);
        Ok(previews)
    }

    /// Load and render a single article.
    ///
    /// Returns `Ok(None)` for every failure to read or parse the file, so
    /// callers can only tell "found" from "not found". The distinct cause is
    /// logged. A slug that would resolve outside the content root is an
    /// `Err`.
    pub fn get_article(&self, slug: &str) -> Result<Option<Article>, InvalidSlug> {
        let rel = slug_to_rel(slug, ARTICLE_EXTENSION)?;
        let slug = slug_from_rel(&rel).ok_or(InvalidSlug::Empty)?;

        let Some(path) = self.contained_path(&rel, &slug)? else {
            return Ok(None);
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(%slug, path = %path.display(), error = %e, "Failed to read article");
                return Ok(None);
            }
        };

        let (attributes, body) = match parse_frontmatter(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(%slug, path = %path.display(), error = %e, "Invalid article front-matter");
                return Ok(None);
            }
        };

        let content = self.processor.convert(body);

        Ok(Some(Article {
            preview: ArticlePreview { slug, attributes },
            content,
        }))
    }

    /// Resolve `rel` under the root, following symlinks, and check the real
    /// location is still inside the root.
    fn contained_path(&self, rel: &Path, slug: &str) -> Result<Option<PathBuf>, InvalidSlug> {
        let root = match fs::canonicalize(&self.root) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(root = %self.root.display(), error = %e, "Article root is not accessible");
                return Ok(None);
            }
        };

        let path = match fs::canonicalize(root.join(rel)) {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(%slug, "Article not found");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(%slug, error = %e, "Failed to resolve article path");
                return Ok(None);
            }
        };

        if !path.starts_with(&root) {
            tracing::warn!(%slug, path = %path.display(), "Rejected slug resolving outside the article root");
            return Err(InvalidSlug::OutsideRoot(slug.to_string()));
        }

        Ok(Some(path))
    }

    /// Discover all article files, depth first, in file-name order.
    ///
    /// Symlinks are followed, but files whose real location is outside the
    /// root are skipped so that every listed slug passes `get_article`.
    /// Symlink loops are skipped as well.
    fn discover_article_files(&self) -> Result<Vec<PathBuf>, ArticleError> {
        // A missing root fails the walk below
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    tracing::warn!(error = %e, "Skipping symlink loop in article root");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if !entry.file_type().is_file() || !is_article_file(entry.path()) {
                continue;
            }

            let real = fs::canonicalize(entry.path()).map_err(|source| ArticleError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
            if !real.starts_with(&root) {
                tracing::warn!(
                    path = %entry.path().display(),
                    target = %real.display(),
                    "Skipping article resolving outside the article root"
                );
                continue;
            }

            files.push(entry.into_path());
        }

        Ok(files)
    }

    fn read_preview(&self, path: &Path) -> Result<ArticlePreview, ArticleError> {
        let raw = fs::read_to_string(path).map_err(|source| ArticleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (attributes, _body) =
            parse_frontmatter(&raw).map_err(|source| ArticleError::Frontmatter {
                path: path.to_path_buf(),
                source,
            })?;

        // Discovered files always live under the root
        let slug = slug_from_path(&self.root, path).unwrap_or_default();

        Ok(ArticlePreview { slug, attributes })
    }
}

fn is_article_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ARTICLE_EXTENSION)
}

/// Stable sort: dated previews newest first, then undated ones
fn sort_newest_first(previews: &mut [ArticlePreview]) {
    previews.sort_by_cached_key(|preview| Reverse(preview_date(&preview.attributes)));
}

fn preview_date(attributes: &ArticleAttributes) -> Option<i64> {
    attributes.parsed_date().map(|dt| dt.timestamp_millis())
}
