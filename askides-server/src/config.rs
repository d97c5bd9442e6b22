use std::path::PathBuf;

use crate::cli::Cli;
use crate::ratelimit::RateLimitConfig;

/// Session secret used when none is configured. Fine for local development
/// only.
pub const DEV_SECRET: &str = "s3cret1";

/// Credentials for the mail service
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: String,
    pub from: String,
    pub audience_id: String,
    pub base_url: String,
}

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub secure: bool,
    pub domain: Option<String>,
}

/// Runtime configuration derived from CLI/env.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub listen_addr: String,
    pub session: SessionConfig,
    /// `None` when any mail credential is missing
    pub mail: Option<MailConfig>,
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let secret = match cli.app_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!("APP_SECRET is not set, signing sessions with the development secret");
                DEV_SECRET.to_string()
            }
        };

        let session = SessionConfig {
            secret,
            secure: cli.production,
            domain: cli.cookie_domain.clone().filter(|_| cli.production),
        };

        let mail = match (
            non_empty(&cli.resend_api_key),
            non_empty(&cli.resend_from),
            non_empty(&cli.resend_audience_id),
        ) {
            (Some(api_key), Some(from), Some(audience_id)) => Some(MailConfig {
                api_key,
                from,
                audience_id,
                base_url: cli.resend_base_url.trim_end_matches('/').to_string(),
            }),
            _ => {
                tracing::warn!("Mail service credentials missing, subscriptions are disabled");
                None
            }
        };

        let rate_limit = RateLimitConfig {
            burst: cli.rate_burst,
            refill_rate: cli.rate_per_sec,
            enabled: cli.rate_limit,
            trust_forwarded_for: cli.trust_forwarded_for,
        };

        Self {
            config_path: cli.config.clone(),
            listen_addr: cli.listen_addr.clone(),
            session,
            mail,
            rate_limit,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}
