//! Email templates and the delivery log.

use chrono::Utc;
use sqlx::SqlitePool;
use storehub_core::{EmailLog, EmailStatus, EmailTemplate, EmailTemplateUpdate, NewEmailTemplate, Page};
use tracing::debug;

use super::{clean, new_id};
use crate::error::{DbError, DbResult};

const TEMPLATE_COLUMNS: &str =
    "id, name, subject, html_body, text_body, is_active, created_at, updated_at";

const LOG_COLUMNS: &str =
    "id, recipient, template_name, subject, status, provider_message_id, error, created_at";

/// Fields of one delivery attempt.
#[derive(Debug, Clone)]
pub struct NewEmailLog<'a> {
    pub recipient: &'a str,
    pub template_name: Option<&'a str>,
    pub subject: &'a str,
    pub status: EmailStatus,
    pub provider_message_id: Option<&'a str>,
    pub error: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct EmailRepository {
    pool: SqlitePool,
}

impl EmailRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmailRepository { pool }
    }

    pub async fn templates(&self) -> DbResult<Vec<EmailTemplate>> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM email_templates ORDER BY name");

        let templates = sqlx::query_as::<_, EmailTemplate>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(templates)
    }

    pub async fn template(&self, id: &str) -> DbResult<EmailTemplate> {
        let sql = format!("SELECT {TEMPLATE_COLUMNS} FROM email_templates WHERE id = ?1");

        sqlx::query_as::<_, EmailTemplate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Email template", id))
    }

    /// Looks up an active template by its slug.
    pub async fn active_template(&self, name: &str) -> DbResult<EmailTemplate> {
        let sql = format!(
            "SELECT {TEMPLATE_COLUMNS} FROM email_templates WHERE name = ?1 AND is_active = 1"
        );

        sqlx::query_as::<_, EmailTemplate>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Email template", name))
    }

    pub async fn create_template(&self, input: &NewEmailTemplate) -> DbResult<EmailTemplate> {
        debug!(name = %input.name, "Inserting email template");

        let now = Utc::now();
        let template = EmailTemplate {
            id: new_id(),
            name: input.name.trim().to_string(),
            subject: input.subject.clone(),
            html_body: input.html_body.clone(),
            text_body: clean(input.text_body.as_deref()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO email_templates (id, name, subject, html_body, text_body, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.html_body)
        .bind(&template.text_body)
        .bind(template.is_active)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("name", &template.name),
            other => other,
        })?;

        Ok(template)
    }

    pub async fn update_template(
        &self,
        id: &str,
        update: &EmailTemplateUpdate,
    ) -> DbResult<EmailTemplate> {
        let mut template = self.template(id).await?;
        if let Some(subject) = &update.subject {
            template.subject = subject.clone();
        }
        if let Some(html) = &update.html_body {
            template.html_body = html.clone();
        }
        if let Some(text) = &update.text_body {
            template.text_body = clean(Some(text));
        }
        if let Some(active) = update.is_active {
            template.is_active = active;
        }
        template.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE email_templates SET subject = ?2, html_body = ?3, text_body = ?4, is_active = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&template.id)
        .bind(&template.subject)
        .bind(&template.html_body)
        .bind(&template.text_body)
        .bind(template.is_active)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(template)
    }

    /// Removes a template. Log rows keep the name as plain text.
    pub async fn delete_template(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM email_templates WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Email template", id));
        }
        Ok(())
    }

    pub async fn insert_log(&self, entry: &NewEmailLog<'_>) -> DbResult<EmailLog> {
        let log = EmailLog {
            id: new_id(),
            recipient: entry.recipient.to_string(),
            template_name: entry.template_name.map(str::to_string),
            subject: entry.subject.to_string(),
            status: entry.status,
            provider_message_id: entry.provider_message_id.map(str::to_string),
            error: entry.error.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO email_logs (id, recipient, template_name, subject, status, provider_message_id, error, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&log.id)
        .bind(&log.recipient)
        .bind(&log.template_name)
        .bind(&log.subject)
        .bind(log.status)
        .bind(&log.provider_message_id)
        .bind(&log.error)
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(log)
    }

    /// Delivery attempts newest first.
    pub async fn logs(&self, page: Page) -> DbResult<Vec<EmailLog>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM email_logs ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        );

        let logs = sqlx::query_as::<_, EmailLog>(&sql)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(logs)
    }
}
