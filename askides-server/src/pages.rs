//! HTML pages.

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::SignedCookieJar;

use askides_core::{Config, MetadataOptions};
use askides_render::{ArticleTemplate, IndexTemplate, NotFoundTemplate};

use crate::{error::AppError, server::AppState};

/// Landing page: intro, stories and any flashed session values
pub async fn index(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let articles = state.articles.clone();
    let stories = tokio::task::spawn_blocking(move || articles.list_articles()).await??;

    let mut session = state.sessions.retrieve(&jar);
    let message = session.take_message();
    let error = session.take_error();

    let site = &state.config.site;
    let metadata = state
        .metadata
        .build(&site.title, &site.description, &MetadataOptions::default());
    let html = IndexTemplate::new(&state.config, &metadata, &stories, message, error)
        .render()
        .context("rendering index page")?;

    let jar = state.sessions.commit(jar, &session);
    Ok((jar, Html(html)))
}

pub async fn article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let articles = state.articles.clone();
    let article = tokio::task::spawn_blocking(move || articles.get_article(&slug)).await??;

    let Some(article) = article else {
        return not_found_page(&state.config);
    };

    let metadata = state.metadata.build(
        article.title(),
        article.description(),
        &MetadataOptions::canonical(article.preview.url()),
    );
    let html = ArticleTemplate::new(&state.config, &metadata, &article)
        .render()
        .context("rendering article page")?;

    Ok(Html(html).into_response())
}

/// Old `/articles/<path>` URLs moved to `/s/<name>`
pub async fn legacy_article(Path(slug): Path<String>) -> Result<Response, AppError> {
    let name = slug
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .ok_or(AppError::NotFound)?;

    Ok(found(&format!("/s/{}", urlencoding::encode(name))))
}

pub async fn not_found(State(state): State<AppState>) -> Result<Response, AppError> {
    not_found_page(&state.config)
}

fn not_found_page(config: &Config) -> Result<Response, AppError> {
    let html = NotFoundTemplate::new(config)
        .render()
        .context("rendering 404 page")?;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

/// 302 to `location`
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
