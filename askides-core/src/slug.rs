//! Slug derivation and validation.
//!
//! A slug is the article's path relative to the content root, joined with
//! `/` and without the file extension: `<root>/tech/foo.mdx` is `tech/foo`
//! on every platform.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// A slug that cannot name a file inside the content root
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSlug {
    #[error("empty slug")]
    Empty,

    #[error("invalid path component in slug: {0}")]
    Component(String),

    #[error("slug escapes the content root: {0}")]
    OutsideRoot(String),
}

/// Derive the slug of `path`, a file somewhere under `root`.
///
/// Returns `None` when `path` is not under `root`.
pub fn slug_from_path(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root).ok().and_then(slug_from_rel)
}

/// Derive the slug of a path relative to the content root.
pub fn slug_from_rel(rel: &Path) -> Option<String> {
    let rel = rel.with_extension("");

    let parts: Vec<String> = rel
        .components()
        .filter_map(|comp| match comp {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Turn a slug into a relative file path with `extension`.
///
/// Only plain path segments are accepted; `..`, absolute paths, drive
/// prefixes and empty slugs are rejected.
pub fn slug_to_rel(slug: &str, extension: &str) -> Result<PathBuf, InvalidSlug> {
    let mut clean = PathBuf::new();

    for segment in slug.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(InvalidSlug::Component(segment.to_string())),
            _ => {}
        }

        // A single segment must still be one normal component on this host
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(s)), None) => clean.push(s),
            _ => return Err(InvalidSlug::Component(segment.to_string())),
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(InvalidSlug::Empty);
    }

    let mut file_name = clean
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or(InvalidSlug::Empty)?;
    file_name.push(".");
    file_name.push(extension);
    clean.set_file_name(file_name);

    Ok(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_from_nested_path() {
        let root = Path::new("/srv/articles");
        assert_eq!(
            slug_from_path(root, &root.join("tech").join("foo.mdx")),
            Some("tech/foo".to_string())
        );
        assert_eq!(
            slug_from_path(root, &root.join("hello-world.mdx")),
            Some("hello-world".to_string())
        );
    }

    #[test]
    fn test_slug_only_strips_last_extension() {
        let root = Path::new("/srv/articles");
        assert_eq!(
            slug_from_path(root, &root.join("v1.2-release.mdx")),
            Some("v1.2-release".to_string())
        );
    }

    #[test]
    fn test_slug_outside_root() {
        assert_eq!(
            slug_from_path(Path::new("/srv/articles"), Path::new("/etc/passwd")),
            None
        );
    }

    #[test]
    fn test_slug_to_rel() {
        assert_eq!(
            slug_to_rel("tech/foo", "mdx").unwrap(),
            Path::new("tech").join("foo.mdx")
        );
        assert_eq!(
            slug_to_rel("/hello/", "mdx").unwrap(),
            PathBuf::from("hello.mdx")
        );
        assert_eq!(
            slug_to_rel("v1.2-release", "mdx").unwrap(),
            PathBuf::from("v1.2-release.mdx")
        );
    }

    #[test]
    fn test_slug_to_rel_rejects_traversal() {
        assert_eq!(
            slug_to_rel("../secret", "mdx"),
            Err(InvalidSlug::Component("..".into()))
        );
        assert_eq!(
            slug_to_rel("tech/../../etc/passwd", "mdx"),
            Err(InvalidSlug::Component("..".into()))
        );
        assert_eq!(
            slug_to_rel("tech\\..\\secret", "mdx"),
            Err(InvalidSlug::Component("..".into()))
        );
    }

    #[test]
    fn test_slug_to_rel_rejects_empty() {
        assert_eq!(slug_to_rel("", "mdx"), Err(InvalidSlug::Empty));
        assert_eq!(slug_to_rel("/./", "mdx"), Err(InvalidSlug::Empty));
    }
}
