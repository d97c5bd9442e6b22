//! JSON endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use askides_core::{Article, ArticlePreview, MetadataEntry, MetadataOptions};

use crate::{error::AppError, server::AppState};

pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticlePreview>>, AppError> {
    let articles = state.articles.clone();
    let previews = tokio::task::spawn_blocking(move || articles.list_articles()).await??;
    Ok(Json(previews))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Article>, AppError> {
    let articles = state.articles.clone();
    let article = tokio::task::spawn_blocking(move || articles.get_article(&slug)).await??;
    article.map(Json).ok_or(AppError::NotFound)
}

#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    title: Option<String>,
    description: Option<String>,
    path: Option<String>,
    image: Option<String>,
}

/// Metadata entries for an arbitrary page; site defaults fill the gaps
pub async fn metadata(
    State(state): State<AppState>,
    Query(query): Query<MetadataQuery>,
) -> Json<Vec<MetadataEntry>> {
    let site = &state.config.site;
    let options = MetadataOptions {
        canonical_path: query.path,
        image_url: query.image,
    };

    Json(state.metadata.build(
        query.title.as_deref().unwrap_or(&site.title),
        query.description.as_deref().unwrap_or(&site.description),
        &options,
    ))
}
