//! Template rendering plus delivery, with every attempt logged.

use std::collections::HashMap;
use std::sync::Arc;

use storehub_core::template::{render_email, RenderedEmail};
use storehub_core::{EmailLog, EmailStatus};
use storehub_db::{Database, NewEmailLog};
use tracing::{debug, warn};

use super::provider::{EmailError, EmailProvider, OutgoingEmail};

/// Sends template-based email through the configured provider.
#[derive(Clone)]
pub struct EmailService {
    db: Database,
    provider: Arc<dyn EmailProvider>,
    from_address: String,
}

impl EmailService {
    pub fn new(db: Database, provider: Arc<dyn EmailProvider>, from_address: String) -> Self {
        EmailService {
            db,
            provider,
            from_address,
        }
    }

    /// Renders an active template without sending it.
    pub async fn preview(
        &self,
        template_name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<RenderedEmail, EmailError> {
        let template = self.db.email().active_template(template_name).await?;
        Ok(render_email(
            &template.subject,
            &template.html_body,
            template.text_body.as_deref(),
            variables,
        ))
    }

    /// Renders and delivers a template.
    ///
    /// A render with missing variables is logged as failed and never reaches
    /// the provider.
    pub async fn send(
        &self,
        template_name: &str,
        to: &str,
        variables: &HashMap<String, String>,
    ) -> Result<EmailLog, EmailError> {
        let rendered = self.preview(template_name, variables).await?;

        if !rendered.missing_variables.is_empty() {
            let err = EmailError::MissingVariables(rendered.missing_variables.clone());
            self.log_attempt(template_name, to, &rendered.subject, Err(&err))
                .await?;
            return Err(err);
        }

        let message = OutgoingEmail {
            from: self.from_address.clone(),
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html_body,
            text: rendered.text_body,
        };

        debug!(template = %template_name, to = %to, "Sending email");

        match self.provider.send(&message).await {
            Ok(message_id) => {
                self.log_attempt(template_name, to, &message.subject, Ok(&message_id))
                    .await
            }
            Err(err) => {
                self.log_attempt(template_name, to, &message.subject, Err(&err))
                    .await?;
                Err(err)
            }
        }
    }

    /// Best-effort send for notifications triggered by other operations.
    /// Failures are logged and swallowed.
    pub async fn notify(&self, template_name: &str, to: &str, variables: HashMap<String, String>) {
        if let Err(e) = self.send(template_name, to, &variables).await {
            warn!(template = %template_name, to = %to, error = %e, "Notification not delivered");
        }
    }

    async fn log_attempt(
        &self,
        template_name: &str,
        to: &str,
        subject: &str,
        outcome: Result<&str, &EmailError>,
    ) -> Result<EmailLog, EmailError> {
        let error = outcome.err().map(ToString::to_string);
        let entry = NewEmailLog {
            recipient: to,
            template_name: Some(template_name),
            subject,
            status: if outcome.is_ok() {
                EmailStatus::Sent
            } else {
                EmailStatus::Failed
            },
            provider_message_id: outcome.ok(),
            error: error.as_deref(),
        };

        Ok(self.db.email().insert_log(&entry).await?)
    }
}
