//! Email templates, preview, manual send and the delivery log.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use storehub_core::template::RenderedEmail;
use storehub_core::validation::{validate_email, validate_name, validate_template_name};
use storehub_core::{
    EmailLog, EmailTemplate, EmailTemplateUpdate, NewEmailTemplate, Page, Role, ValidationError,
};

use super::Listing;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub template: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct SendRequest {
    pub template: String,
    pub to: String,
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_new_template(input: &NewEmailTemplate) -> Result<(), ValidationError> {
    validate_template_name(&input.name)?;
    validate_name("subject", &input.subject, 500)?;
    if input.html_body.trim().is_empty() {
        return Err(ValidationError::required("html_body"));
    }
    Ok(())
}

fn validate_template_update(update: &EmailTemplateUpdate) -> Result<(), ValidationError> {
    if let Some(subject) = &update.subject {
        validate_name("subject", subject, 500)?;
    }
    if matches!(&update.html_body, Some(body) if body.trim().is_empty()) {
        return Err(ValidationError::required("html_body"));
    }
    Ok(())
}

/// GET /email/templates
async fn list_templates(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<EmailTemplate>>, ApiError> {
    user.require(Role::Manager)?;
    Ok(Json(state.db.email().templates().await?))
}

/// POST /email/templates
async fn create_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewEmailTemplate>,
) -> Result<(StatusCode, Json<EmailTemplate>), ApiError> {
    user.require(Role::Manager)?;
    validate_new_template(&req)?;

    let template = state.db.email().create_template(&req).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /email/templates/{id}
async fn get_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<EmailTemplate>, ApiError> {
    user.require(Role::Manager)?;
    Ok(Json(state.db.email().template(&id).await?))
}

/// PUT /email/templates/{id}
async fn update_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<EmailTemplateUpdate>,
) -> Result<Json<EmailTemplate>, ApiError> {
    user.require(Role::Manager)?;
    validate_template_update(&req)?;
    Ok(Json(state.db.email().update_template(&id, &req).await?))
}

/// DELETE /email/templates/{id}
async fn delete_template(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Manager)?;
    state.db.email().delete_template(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /email/preview - render only; missing variables are reported, not rejected
async fn preview(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<RenderedEmail>, ApiError> {
    let rendered = state.email.preview(&req.template, &req.variables).await?;
    Ok(Json(rendered))
}

/// POST /email/send
async fn send(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<SendRequest>,
) -> Result<Json<EmailLog>, ApiError> {
    user.require(Role::Manager)?;
    let to = req.to.trim();
    validate_email(to)?;

    let log = state.email.send(&req.template, to, &req.variables).await?;
    Ok(Json(log))
}

/// GET /email/logs - newest first
async fn list_logs(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<PageQuery>,
) -> Result<Json<Listing<EmailLog>>, ApiError> {
    user.require(Role::Manager)?;
    let page = Page::new(params.limit, params.offset);
    let logs = state.db.email().logs(page).await?;
    Ok(Json(Listing::new(logs, page)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/email/templates", get(list_templates).post(create_template))
        .route(
            "/email/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/email/preview", post(preview))
        .route("/email/send", post(send))
        .route("/email/logs", get(list_logs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_template() {
        let mut input = NewEmailTemplate {
            name: "welcome_customer".into(),
            subject: "Welcome {{ name }}".into(),
            html_body: "<p>Hi</p>".into(),
            text_body: None,
        };
        assert!(validate_new_template(&input).is_ok());

        input.name = "Welcome Customer".into();
        assert!(validate_new_template(&input).is_err());

        input.name = "welcome".into();
        input.html_body = "   ".into();
        assert!(validate_new_template(&input).is_err());
    }
}
