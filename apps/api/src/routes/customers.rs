//! Customer endpoints. Creating a customer opens their loyalty account.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use storehub_core::validation::{validate_email, validate_name, validate_search_query};
use storehub_core::{Customer, CustomerUpdate, NewCustomer, Page, Role, Sale, ValidationError};
use storehub_db::SaleFilter;

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
    pub include_inactive: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_optional_email(email: Option<&str>) -> Result<(), ValidationError> {
    match non_blank(email) {
        Some(email) => validate_email(email),
        None => Ok(()),
    }
}

fn validate_new_customer(input: &NewCustomer) -> Result<(), ValidationError> {
    validate_name("first_name", &input.first_name, 100)?;
    if !input.last_name.trim().is_empty() {
        validate_name("last_name", &input.last_name, 100)?;
    }
    validate_optional_email(input.email.as_deref())
}

fn validate_customer_update(update: &CustomerUpdate) -> Result<(), ValidationError> {
    if let Some(first) = &update.first_name {
        validate_name("first_name", first, 100)?;
    }
    validate_optional_email(update.email.as_deref())
}

/// GET /customers - search by name, email or phone
async fn search_customers(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<CustomerQuery>,
) -> Result<Json<Listing<Customer>>, ApiError> {
    let q = match non_blank(params.q.as_deref()) {
        Some(q) => Some(validate_search_query(q)?),
        None => None,
    };
    let page = Page::new(params.limit, params.offset);

    let customers = state
        .db
        .customers()
        .search(q.as_deref(), params.include_inactive.unwrap_or(false), page)
        .await?;
    Ok(Json(Listing::new(customers, page)))
}

/// POST /customers
async fn create_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(req): Json<NewCustomer>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    validate_new_customer(&req)?;
    let customer = state.db.customers().create(&req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/{id}
async fn get_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(state.db.customers().get(&id).await?))
}

/// PUT /customers/{id}
async fn update_customer(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<CustomerUpdate>,
) -> Result<Json<Customer>, ApiError> {
    validate_customer_update(&req)?;
    Ok(Json(state.db.customers().update(&id, &req).await?))
}

/// DELETE /customers/{id} - soft delete
async fn delete_customer(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Manager)?;
    state.db.customers().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /customers/{id}/sales - purchase history, newest first
async fn customer_sales(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Listing<Sale>>, ApiError> {
    let customer = state.db.customers().get(&id).await?;
    let page = Page::new(params.limit, params.offset);

    let filter = SaleFilter {
        customer_id: Some(customer.id),
        ..Default::default()
    };
    let sales = state.db.sales().list(&filter, page).await?;
    Ok(Json(Listing::new(sales, page)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", get(search_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/sales", get(customer_sales))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_customer() {
        let mut input = NewCustomer {
            first_name: "Jamie".into(),
            last_name: String::new(),
            email: None,
            phone: Some("555-0100".into()),
            notes: None,
            marketing_opt_in: false,
        };
        assert!(validate_new_customer(&input).is_ok());

        input.email = Some("jamie-at-example".into());
        assert!(validate_new_customer(&input).is_err());

        input.email = None;
        input.first_name = " ".into();
        assert!(validate_new_customer(&input).is_err());
    }
}
