//! Mail service client.
//!
//! Subscriptions are stored as contacts in a Resend audience. A new contact
//! starts unsubscribed and is flipped once the confirmation link is visited.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },
}

/// Operations the subscription flow needs from a mail provider
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Add `email` to an audience and return the new contact id
    async fn create_contact(
        &self,
        email: &str,
        audience_id: &str,
        unsubscribed: bool,
    ) -> Result<String, MailError>;

    async fn update_contact(
        &self,
        audience_id: &str,
        id: &str,
        unsubscribed: bool,
    ) -> Result<(), MailError>;

    async fn send_email(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError>;
}

#[derive(Serialize)]
struct CreateContactRequest<'a> {
    email: &'a str,
    unsubscribed: bool,
}

#[derive(Serialize)]
struct UpdateContactRequest {
    unsubscribed: bool,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct CreatedResponse {
    id: String,
}

/// Resend REST client
pub struct ResendMailer {
    client: Client,
    api_key: String,
    base_url: Arc<str>,
}

impl ResendMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &MailConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MailError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status_code: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn create_contact(
        &self,
        email: &str,
        audience_id: &str,
        unsubscribed: bool,
    ) -> Result<String, MailError> {
        let url = self.url(&format!("/audiences/{}/contacts", audience_id));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&CreateContactRequest {
                email,
                unsubscribed,
            })
            .send()
            .await?;

        let created: CreatedResponse = Self::check(response).await?.json().await?;
        tracing::debug!(contact_id = %created.id, "Created contact");
        Ok(created.id)
    }

    async fn update_contact(
        &self,
        audience_id: &str,
        id: &str,
        unsubscribed: bool,
    ) -> Result<(), MailError> {
        let url = self.url(&format!("/audiences/{}/contacts/{}", audience_id, id));
        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_key)
            .json(&UpdateContactRequest { unsubscribed })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn send_email(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        html: &str,
    ) -> Result<(), MailError> {
        let response = self
            .client
            .post(self.url("/emails"))
            .bearer_auth(&self.api_key)
            .json(&SendEmailRequest {
                from,
                to: [to],
                subject,
                html,
            })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{patch, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    fn auth(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    /// Serve a minimal stand-in for the Resend API and return its base URL
    async fn spawn_api(calls: Calls) -> String {
        let app = Router::new()
            .route(
                "/audiences/{audience}/contacts",
                post(
                    |State(calls): State<Calls>,
                     Path(audience): Path<String>,
                     headers: HeaderMap,
                     Json(body): Json<Value>| async move {
                        calls
                            .lock()
                            .await
                            .push((format!("create {audience}"), auth(&headers), body));
                        Json(json!({ "object": "contact", "id": "contact_42" }))
                    },
                ),
            )
            .route(
                "/audiences/{audience}/contacts/{id}",
                patch(
                    |State(calls): State<Calls>,
                     Path((audience, id)): Path<(String, String)>,
                     headers: HeaderMap,
                     Json(body): Json<Value>| async move {
                        calls
                            .lock()
                            .await
                            .push((format!("update {audience} {id}"), auth(&headers), body));
                        if id == "missing" {
                            return Err((StatusCode::NOT_FOUND, "contact not found"));
                        }
                        Ok(Json(json!({ "id": id })))
                    },
                ),
            )
            .route(
                "/emails",
                post(
                    |State(calls): State<Calls>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        calls
                            .lock()
                            .await
                            .push(("email".to_string(), auth(&headers), body));
                        Json(json!({ "id": "email_1" }))
                    },
                ),
            )
            .with_state(calls);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn mailer(base_url: String) -> ResendMailer {
        ResendMailer::new(&MailConfig {
            api_key: "re_test".into(),
            from: "hello@askides.com".into(),
            audience_id: "aud_1".into(),
            base_url,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_contact_returns_id() {
        let calls = Calls::default();
        let mailer = mailer(spawn_api(calls.clone()).await);

        let id = mailer
            .create_contact("steve@example.com", "aud_1", true)
            .await
            .unwrap();
        assert_eq!(id, "contact_42");

        let calls = calls.lock().await;
        assert_eq!(calls[0].0, "create aud_1");
        assert_eq!(calls[0].1.as_deref(), Some("Bearer re_test"));
        assert_eq!(
            calls[0].2,
            json!({ "email": "steve@example.com", "unsubscribed": true })
        );
    }

    #[tokio::test]
    async fn test_send_email_payload() {
        let calls = Calls::default();
        let mailer = mailer(spawn_api(calls.clone()).await);

        mailer
            .send_email("hello@askides.com", "steve@example.com", "Hi", "<p>Hi</p>")
            .await
            .unwrap();

        let calls = calls.lock().await;
        assert_eq!(calls[0].0, "email");
        assert_eq!(calls[0].2["to"], json!(["steve@example.com"]));
        assert_eq!(calls[0].2["subject"], "Hi");
    }

    #[tokio::test]
    async fn test_api_error_carries_status() {
        let calls = Calls::default();
        let mailer = mailer(spawn_api(calls.clone()).await);

        mailer.update_contact("aud_1", "contact_42", false).await.unwrap();
        let err = mailer
            .update_contact("aud_1", "missing", false)
            .await
            .unwrap_err();

        match err {
            MailError::Api {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 404);
                assert_eq!(message, "contact not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.lock().await[0].2, json!({ "unsubscribed": false }));
    }
}
