use std::path::PathBuf;

use clap::Parser;

/// HTTP server for the askides blog.
#[derive(Debug, Clone, Parser)]
#[command(name = "askides", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the site configuration file
    #[arg(long, env = "ASKIDES_CONFIG", default_value = "askides.yml")]
    pub config: PathBuf,

    /// Listen address for HTTP
    #[arg(long, env = "ASKIDES_ADDR", default_value = "127.0.0.1:3000")]
    pub listen_addr: String,

    /// Enable debug logging
    #[arg(long, short)]
    pub verbose: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Session options
    // ─────────────────────────────────────────────────────────────────────────

    /// Secret used to sign the session cookie.
    #[arg(long, env = "APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,

    /// Production mode: secure cookies, optional cookie domain.
    #[arg(long, env = "ASKIDES_PRODUCTION")]
    pub production: bool,

    /// Cookie domain, only applied in production mode.
    #[arg(long, env = "APP_DOMAIN")]
    pub cookie_domain: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Mail service options
    // ─────────────────────────────────────────────────────────────────────────

    /// Resend API key. Subscriptions are disabled without it.
    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// Sender address for confirmation e-mails.
    #[arg(long, env = "RESEND_FROM_EMAIL")]
    pub resend_from: Option<String>,

    /// Resend audience that subscribers are added to.
    #[arg(long, env = "RESEND_AUDIENCE_ID")]
    pub resend_audience_id: Option<String>,

    /// Resend API base URL.
    #[arg(long, env = "RESEND_BASE_URL", default_value = "https://api.resend.com")]
    pub resend_base_url: String,

    // ─────────────────────────────────────────────────────────────────────────
    // Rate limiting options
    // ─────────────────────────────────────────────────────────────────────────

    /// Enable rate limiting for subscription requests.
    #[arg(long, env = "ASKIDES_RATE_LIMIT", default_value = "true", action = clap::ArgAction::Set)]
    pub rate_limit: bool,

    /// Maximum burst size for rate limiting.
    #[arg(long, env = "ASKIDES_RATE_BURST", default_value = "5")]
    pub rate_burst: u32,

    /// Sustained requests per second for rate limiting.
    #[arg(long, env = "ASKIDES_RATE_PER_SEC", default_value = "0.1")]
    pub rate_per_sec: f64,

    /// Key rate limits by the first X-Forwarded-For hop. Enable only behind
    /// a reverse proxy that sets the header.
    #[arg(long, env = "ASKIDES_TRUST_PROXY", default_value = "false", action = clap::ArgAction::Set)]
    pub trust_forwarded_for: bool,
}
