//! Supplier endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use storehub_core::validation::{validate_email, validate_name, validate_search_query};
use storehub_core::{NewSupplier, Page, Role, Supplier, SupplierUpdate, ValidationError};

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct SupplierQuery {
    pub q: Option<String>,
    pub include_inactive: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_contact(email: Option<&str>) -> Result<(), ValidationError> {
    match non_blank(email) {
        Some(email) => validate_email(email),
        None => Ok(()),
    }
}

/// GET /suppliers
async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<SupplierQuery>,
) -> Result<Json<Listing<Supplier>>, ApiError> {
    let q = match non_blank(params.q.as_deref()) {
        Some(q) => Some(validate_search_query(q)?),
        None => None,
    };
    let page = Page::new(params.limit, params.offset);

    let suppliers = state
        .db
        .suppliers()
        .list(q.as_deref(), params.include_inactive.unwrap_or(false), page)
        .await?;
    Ok(Json(Listing::new(suppliers, page)))
}

/// POST /suppliers
async fn create_supplier(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewSupplier>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    user.require(Role::Manager)?;
    validate_name("name", &req.name, 200)?;
    validate_contact(req.email.as_deref())?;

    let supplier = state.db.suppliers().create(&req).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// GET /suppliers/{id}
async fn get_supplier(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Supplier>, ApiError> {
    Ok(Json(state.db.suppliers().get(&id).await?))
}

/// PUT /suppliers/{id}
async fn update_supplier(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SupplierUpdate>,
) -> Result<Json<Supplier>, ApiError> {
    user.require(Role::Manager)?;
    if let Some(name) = &req.name {
        validate_name("name", name, 200)?;
    }
    validate_contact(req.email.as_deref())?;

    let supplier = state.db.suppliers().update(&id, &req).await?;
    Ok(Json(supplier))
}

/// DELETE /suppliers/{id} - deactivates
async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Manager)?;
    state.db.suppliers().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_email_optional() {
        assert!(validate_contact(None).is_ok());
        assert!(validate_contact(Some("  ")).is_ok());
        assert!(validate_contact(Some("orders@acme.test")).is_ok());
        assert!(validate_contact(Some("not an email")).is_err());
    }
}
