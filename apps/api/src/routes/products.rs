//! Product catalog endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use storehub_core::validation::{
    validate_amount, validate_name, validate_search_query, validate_sku,
    validate_stock_quantity, validate_tax_rate_bps,
};
use storehub_core::{NewProduct, Page, Product, ProductUpdate, Role, ValidationError};
use storehub_db::ProductFilter;

use super::{non_blank, Listing};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub include_inactive: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub code: String,
}

fn validate_new_product(input: &NewProduct) -> Result<(), ValidationError> {
    validate_sku(&input.sku)?;
    validate_name("name", &input.name, 200)?;
    validate_amount("price_cents", input.price_cents)?;
    if let Some(cost) = input.cost_cents {
        validate_amount("cost_cents", cost)?;
    }
    validate_tax_rate_bps(input.tax_rate_bps)?;
    validate_stock_quantity("initial_quantity", input.initial_quantity)?;
    validate_stock_quantity("reorder_level", input.reorder_level)?;
    Ok(())
}

fn validate_product_update(update: &ProductUpdate) -> Result<(), ValidationError> {
    if let Some(sku) = &update.sku {
        validate_sku(sku)?;
    }
    if let Some(name) = &update.name {
        validate_name("name", name, 200)?;
    }
    if let Some(price) = update.price_cents {
        validate_amount("price_cents", price)?;
    }
    if let Some(cost) = update.cost_cents {
        validate_amount("cost_cents", cost)?;
    }
    if let Some(bps) = update.tax_rate_bps {
        validate_tax_rate_bps(bps)?;
    }
    Ok(())
}

/// GET /products - list or search
async fn list_products(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<ProductQuery>,
) -> Result<Json<Listing<Product>>, ApiError> {
    let q = match non_blank(params.q.as_deref()) {
        Some(q) => Some(validate_search_query(q)?),
        None => None,
    };
    let filter = ProductFilter {
        q,
        category: non_blank(params.category.as_deref()).map(str::to_string),
        include_inactive: params.include_inactive.unwrap_or(false),
    };
    let page = Page::new(params.limit, params.offset);

    let products = state.db.products().list(&filter, page).await?;
    Ok(Json(Listing::new(products, page)))
}

/// GET /products/lookup?code= - exact barcode or SKU
async fn lookup_product(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(params): Query<LookupQuery>,
) -> Result<Json<Product>, ApiError> {
    let code = params.code.trim();
    if code.is_empty() {
        return Err(ValidationError::required("code").into());
    }

    state
        .db
        .products()
        .lookup(code)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No product with barcode or SKU '{}'", code)))
}

/// POST /products
async fn create_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require(Role::Manager)?;
    validate_new_product(&req)?;

    let product = state
        .db
        .products()
        .create(&req, Some(&user.employee_id))
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products/{id}
async fn get_product(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.db.products().get(&id).await?;
    Ok(Json(product))
}

/// PUT /products/{id} - partial update
async fn update_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    user.require(Role::Manager)?;
    validate_product_update(&req)?;

    let product = state.db.products().update(&id, &req).await?;
    Ok(Json(product))
}

/// DELETE /products/{id} - soft delete
async fn delete_product(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Manager)?;
    state.db.products().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/lookup", get(lookup_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}
