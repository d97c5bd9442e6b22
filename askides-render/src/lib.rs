//! # askides-render
//!
//! Page and e-mail rendering for askides.
//!
//! This crate handles HTML template rendering using Askama.

pub mod templates;

pub use templates::{
    ArticleTemplate, IndexTemplate, NotFoundTemplate, StoryEntry, SubscribeEmailTemplate,
};
