//! Newsletter subscription with e-mail confirmation.
//!
//! `POST /api/subscribe` adds the address to the audience as an unsubscribed
//! contact and mails a confirmation link. Following the link hits
//! `GET /api/subscribe?id=` which marks the contact subscribed.

use std::sync::OnceLock;

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use regex::Regex;
use serde::{Deserialize, Serialize};

use askides_render::SubscribeEmailTemplate;

use crate::{error::AppError, pages::found, ratelimit::ClientAddr, server::AppState};

pub const CONFIRM_SUBJECT: &str = "[Action Required] Confirm Your Email!";

const INVALID_EMAIL: &str = "The provided email is invalid. Please try again.";
const NOT_CONFIGURED: &str = "The application is not configured to send emails.";
const INVALID_REQUEST: &str = "Invalid request.";
const CONFIRMED: &str = "Your email has been confirmed.";
const CONFIRM_FAILED: &str = "We could not confirm your email. Please try again later.";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_regex().is_match(email)
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    message: &'static str,
    id: String,
}

pub async fn subscribe(
    State(state): State<AppState>,
    ClientAddr(client): ClientAddr,
    payload: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, AppError> {
    state
        .rate_limiter
        .check(client)
        .await
        .map_err(|retry_after| AppError::RateLimited { retry_after })?;

    let email = match payload {
        Ok(Json(request)) if is_valid_email(request.email.trim()) => {
            request.email.trim().to_string()
        }
        Ok(_) => return Err(AppError::Validation(INVALID_EMAIL.into())),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected subscription payload");
            return Err(AppError::Validation(INVALID_EMAIL.into()));
        }
    };

    let mail = state
        .mail
        .as_ref()
        .ok_or_else(|| AppError::NotConfigured(NOT_CONFIGURED.into()))?;

    // Contacts stay unsubscribed until the link is followed
    let id = mail
        .mailer
        .create_contact(&email, &mail.audience_id, true)
        .await
        .context("creating contact")?;

    let html = SubscribeEmailTemplate {
        site_title: state.config.site.title.clone(),
        href: format!(
            "{}/api/subscribe?id={}",
            state.config.base_url(),
            urlencoding::encode(&id)
        ),
    }
    .render()
    .context("rendering confirmation e-mail")?;

    mail.mailer
        .send_email(&mail.from, &email, CONFIRM_SUBJECT, &html)
        .await
        .context("sending confirmation e-mail")?;

    tracing::info!(contact_id = %id, "Sent subscription confirmation");

    Ok(Json(SubscribeResponse {
        message: "Operation successful.",
        id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    id: Option<String>,
}

pub async fn confirm(
    State(state): State<AppState>,
    Query(query): Query<ConfirmQuery>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let (Some(id), Some(mail)) = (
        query.id.filter(|id| !id.trim().is_empty()),
        state.mail.as_ref(),
    ) else {
        return Err(AppError::Validation(INVALID_REQUEST.into()));
    };

    let mut session = state.sessions.retrieve(&jar);
    match mail.mailer.update_contact(&mail.audience_id, &id, false).await {
        Ok(()) => {
            tracing::info!(contact_id = %id, "Confirmed subscription");
            session.flash_message(CONFIRMED);
        }
        Err(e) => {
            tracing::warn!(contact_id = %id, error = %e, "Failed to confirm subscription");
            session.flash_error(CONFIRM_FAILED);
        }
    }

    let jar = state.sessions.commit(jar, &session);
    Ok((jar, found("/")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("steve.wozniak@gmail.com"));
        assert!(is_valid_email("a+tag@sub.example.co"));
        assert!(!is_valid_email("steve"));
        assert!(!is_valid_email("steve@localhost"));
        assert!(!is_valid_email("st eve@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }
}
