//! Cookie-backed sessions with one-shot flash values.
//!
//! The whole session is serialized into a single signed cookie. Handlers
//! `retrieve` it from the request's cookie jar, mutate it, and `commit` it
//! back into the jar returned with the response.

use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::config::SessionConfig;

pub const SESSION_COOKIE: &str = "__session";

/// 30 days
const SESSION_MAX_AGE_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,

    #[serde(default)]
    flash: FlashData,
}

/// Values that survive exactly one read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct FlashData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub data: SessionData,
}

impl Session {
    pub fn flash_message(&mut self, message: impl Into<String>) {
        self.data.flash.message = Some(message.into());
    }

    pub fn flash_error(&mut self, error: impl Into<String>) {
        self.data.flash.error = Some(error.into());
    }

    /// Read and clear the flashed message
    pub fn take_message(&mut self) -> Option<String> {
        self.data.flash.message.take()
    }

    /// Read and clear the flashed error
    pub fn take_error(&mut self) -> Option<String> {
        self.data.flash.error.take()
    }
}

/// Signs, reads and writes the session cookie
#[derive(Clone)]
pub struct SessionStore {
    key: Key,
    secure: bool,
    domain: Option<String>,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> Self {
        // Stretch any secret to the 64 bytes the signing key needs
        let digest = Sha512::digest(config.secret.as_bytes());

        Self {
            key: Key::from(digest.as_slice()),
            secure: config.secure,
            domain: config.domain.clone(),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Load the session from the request cookies. Missing, tampered or
    /// unreadable cookies yield an empty session.
    pub fn retrieve(&self, jar: &SignedCookieJar) -> Session {
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Session::default();
        };

        let decoded = match urlencoding::decode(cookie.value()) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(error = %e, "Discarding undecodable session cookie");
                return Session::default();
            }
        };

        match serde_json::from_str(&decoded) {
            Ok(data) => Session { data },
            Err(e) => {
                tracing::debug!(error = %e, "Discarding malformed session cookie");
                Session::default()
            }
        }
    }

    /// Write the session into the jar; returning the jar from a handler
    /// emits the `Set-Cookie` header.
    pub fn commit(&self, jar: SignedCookieJar, session: &Session) -> SignedCookieJar {
        let json = match serde_json::to_string(&session.data) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize session");
                return jar;
            }
        };

        let mut cookie = Cookie::build((SESSION_COOKIE, urlencoding::encode(&json).into_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::days(SESSION_MAX_AGE_DAYS));
        if let Some(domain) = &self.domain {
            cookie = cookie.domain(domain.clone());
        }

        jar.add(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig {
            secret: "test-secret".into(),
            secure: false,
            domain: None,
        })
    }

    #[test]
    fn test_empty_jar_gives_empty_session() {
        let store = store();
        let jar = SignedCookieJar::new(store.key().clone());
        assert_eq!(store.retrieve(&jar), Session::default());
    }

    #[test]
    fn test_commit_then_retrieve() {
        let store = store();
        let mut session = Session::default();
        session.data.user_id = Some(7);
        session.data.user_email = Some("a@b.co".into());
        session.flash_message("Your email has been confirmed.");

        let jar = store.commit(SignedCookieJar::new(store.key().clone()), &session);
        let cookie = jar.get(SESSION_COOKIE).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));

        let mut restored = store.retrieve(&jar);
        assert_eq!(restored.data.user_id, Some(7));
        assert_eq!(
            restored.take_message().as_deref(),
            Some("Your email has been confirmed.")
        );
        // Flash values are gone after one read
        assert_eq!(restored.take_message(), None);
    }

    #[test]
    fn test_flash_error_is_one_shot() {
        let mut session = Session::default();
        session.flash_error("nope");
        assert_eq!(session.take_error().as_deref(), Some("nope"));
        assert_eq!(session.take_error(), None);
    }

    #[test]
    fn test_unsigned_cookie_is_ignored() {
        let store = store();
        let mut session = Session::default();
        session.flash_message("secret");
        let jar = store.commit(SignedCookieJar::new(store.key().clone()), &session);
        let cookie = jar.get(SESSION_COOKIE).unwrap();

        let other = SessionStore::new(&SessionConfig {
            secret: "another-secret".into(),
            secure: false,
            domain: None,
        });
        // Present the bare value without a valid signature
        let raw = format!("{}={}", SESSION_COOKIE, cookie.value());
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(axum::http::header::COOKIE, raw.parse().unwrap());
        let other_jar = SignedCookieJar::from_headers(&headers, other.key().clone());

        assert_eq!(other.retrieve(&other_jar), Session::default());
    }
}
