//! Email provider trait and implementations.
//!
//! - [`ResendProvider`] posts JSON to the Resend HTTP API
//! - [`LogProvider`] only logs, for development and tests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storehub_db::DbError;
use tracing::info;
use uuid::Uuid;

use crate::config::{EmailConfig, EmailProviderKind};

/// Provider request timeout in seconds
pub const PROVIDER_TIMEOUT_SECS: u64 = 10;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Error while rendering or delivering an email.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Missing template variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Email provider rejected the message: {0}")]
    Provider(String),

    #[error("Email provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Trait for email delivery (testable).
///
/// Returns the provider's message id.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, message: &OutgoingEmail) -> Result<String, EmailError>;
}

/// Builds the provider named in the configuration.
pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn EmailProvider>, EmailError> {
    match config.provider {
        EmailProviderKind::Log => Ok(Arc::new(LogProvider)),
        EmailProviderKind::Resend => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| EmailError::Provider("email.api_key is not set".to_string()))?;
            Ok(Arc::new(ResendProvider::new(&config.api_base, api_key)?))
        }
    }
}

// =============================================================================
// Resend
// =============================================================================

/// Resend transactional email API.
pub struct ResendProvider {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl ResendProvider {
    pub fn new(api_base: &str, api_key: String) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()?;

        Ok(ResendProvider {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send(&self, message: &OutgoingEmail) -> Result<String, EmailError> {
        #[derive(Serialize)]
        struct SendRequest<'a> {
            from: &'a str,
            to: [&'a str; 1],
            subject: &'a str,
            html: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            text: Option<&'a str>,
        }

        #[derive(Deserialize)]
        struct SendResponse {
            id: String,
        }

        let response = self
            .http
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &message.from,
                to: [&message.to],
                subject: &message.subject,
                html: &message.html,
                text: message.text.as_deref(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(EmailError::Provider(format!("{}: {}", status, body)));
        }

        let sent = response.json::<SendResponse>().await?;
        Ok(sent.id)
    }
}

// =============================================================================
// Log
// =============================================================================

/// Logs messages instead of sending them.
pub struct LogProvider;

#[async_trait]
impl EmailProvider for LogProvider {
    async fn send(&self, message: &OutgoingEmail) -> Result<String, EmailError> {
        let id = format!("log-{}", Uuid::new_v4());
        info!(
            id = %id,
            to = %message.to,
            subject = %message.subject,
            "Email logged (not sent)"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> OutgoingEmail {
        OutgoingEmail {
            from: "StoreHub <no-reply@store.test>".to_string(),
            to: "owner@store.test".to_string(),
            subject: "Low stock".to_string(),
            html: "<p>Low</p>".to_string(),
            text: None,
        }
    }

    #[tokio::test]
    async fn test_resend_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_123"})))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ResendProvider::new(&server.uri(), "re_test".to_string()).unwrap();
        let id = provider.send(&message()).await.unwrap();
        assert_eq!(id, "msg_123");
    }

    #[tokio::test]
    async fn test_resend_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/emails"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid from"))
            .mount(&server)
            .await;

        let provider = ResendProvider::new(&server.uri(), "re_test".to_string()).unwrap();
        let err = provider.send(&message()).await.unwrap_err();
        assert!(matches!(err, EmailError::Provider(ref m) if m.contains("invalid from")));
    }

    #[tokio::test]
    async fn test_log_provider() {
        let id = LogProvider.send(&message()).await.unwrap();
        assert!(id.starts_with("log-"));
    }

    #[test]
    fn test_from_config() {
        let mut config = EmailConfig::default();
        assert!(from_config(&config).is_ok());

        config.provider = EmailProviderKind::Resend;
        assert!(from_config(&config).is_err());

        config.api_key = Some("re_test".to_string());
        assert!(from_config(&config).is_ok());
    }
}
