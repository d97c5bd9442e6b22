use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{FromRef, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::Key;
use tower_http::trace::TraceLayer;
use tracing::info;

use askides_core::{ArticleRepository, Config, MetadataBuilder};

use crate::{
    api,
    config::{AppConfig, SessionConfig},
    image::{ImageError, SocialImageRenderer},
    mailer::{Mailer, ResendMailer},
    pages,
    ratelimit::{RateLimitConfig, RateLimiter},
    seo,
    session::SessionStore,
    subscribe,
};

/// Rate limiter buckets idle for this long are dropped
const RATE_LIMIT_CLEANUP: Duration = Duration::from_secs(600);

/// Mail provider plus the addresses the subscription flow uses
#[derive(Clone)]
pub struct MailState {
    pub mailer: Arc<dyn Mailer>,
    pub from: String,
    pub audience_id: String,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub articles: Arc<ArticleRepository>,
    pub metadata: MetadataBuilder,
    pub sessions: SessionStore,
    /// `None` when the mail service is not configured
    pub mail: Option<MailState>,
    pub images: Arc<SocialImageRenderer>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        config: Config,
        session: &SessionConfig,
        mail: Option<MailState>,
        rate_limit: RateLimitConfig,
    ) -> Result<Self, ImageError> {
        let images = SocialImageRenderer::new(config.image.clone(), config.font_path().as_deref())?;

        Ok(Self {
            articles: Arc::new(ArticleRepository::new(config.articles_dir())),
            metadata: MetadataBuilder::from_config(&config),
            sessions: SessionStore::new(session),
            mail,
            images: Arc::new(images),
            rate_limiter: RateLimiter::new(rate_limit),
            config: Arc::new(config),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.key().clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/s/{*slug}", get(pages::article))
        .route("/articles/{*slug}", get(pages::legacy_article))
        .route("/api/articles", get(api::list_articles))
        .route("/api/articles/{*slug}", get(api::get_article))
        .route("/api/meta", get(api::metadata))
        .route(
            "/api/subscribe",
            get(subscribe::confirm).post(subscribe::subscribe),
        )
        .route("/image", get(seo::social_image))
        .route("/sitemap.xml", get(seo::sitemap))
        .route("/robots.txt", get(seo::robots))
        .route("/healthz", get(healthz))
        .fallback(pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), redirects))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: AppConfig) -> Result<()> {
    let site = Config::from_file(&config.config_path)
        .with_context(|| format!("loading {}", config.config_path.display()))?;
    info!(
        articles = %site.articles_dir().display(),
        site = %site.site.url,
        "Loaded site configuration"
    );

    let mail = match &config.mail {
        Some(mail) => Some(MailState {
            mailer: Arc::new(ResendMailer::new(mail)?),
            from: mail.from.clone(),
            audience_id: mail.audience_id.clone(),
        }),
        None => None,
    };

    let state = AppState::new(site, &config.session, mail, config.rate_limit.clone())?;
    state.rate_limiter.spawn_cleanup(RATE_LIMIT_CLEANUP);

    let app = router(state);

    info!(addr = %config.listen_addr, "askides listening");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Permanent redirects from the site config, checked before routing
async fn redirects(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(target) = state.config.redirects.get(request.uri().path()) {
        tracing::debug!(from = %request.uri().path(), to = %target, "Redirecting");
        return (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, target.clone())],
        )
            .into_response();
    }
    next.run(request).await
}
