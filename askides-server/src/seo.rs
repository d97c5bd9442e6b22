//! Crawler-facing documents and the social preview image.

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;

use askides_core::sitemap::{robots_txt, Sitemap};

use crate::{error::AppError, server::AppState};

pub async fn sitemap(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let articles = state.articles.clone();
    let previews = tokio::task::spawn_blocking(move || articles.list_articles()).await??;

    let xml = Sitemap::from_articles(state.config.base_url(), &previews, Utc::now()).to_xml();
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}

pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.config.robots),
    )
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    title: Option<String>,
}

pub async fn social_image(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let renderer = state.images.clone();
    let title = query
        .title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| renderer.fallback_title().to_string());

    let png = tokio::task::spawn_blocking(move || renderer.render_png(&title))
        .await?
        .context("rendering social image")?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        png,
    ))
}
