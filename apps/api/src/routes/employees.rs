//! Employee management endpoints.
//!
//! Admins manage everyone. Any employee may read their own record and
//! change their own name, phone and password.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use serde::Deserialize;
use storehub_core::validation::{
    validate_amount, validate_email, validate_name, validate_password,
};
use storehub_core::{CoreError, Employee, EmployeeUpdate, NewEmployee, Page, Role, ValidationError};

use super::Listing;
use crate::auth::{hash_password, AuthUser};
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct EmployeeQuery {
    pub include_inactive: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_new_employee(input: &NewEmployee) -> Result<(), ValidationError> {
    validate_email(&input.email)?;
    validate_name("full_name", &input.full_name, 200)?;
    validate_password(&input.password)?;
    if let Some(rate) = input.hourly_rate_cents {
        validate_amount("hourly_rate_cents", rate)?;
    }
    Ok(())
}

fn validate_employee_update(update: &EmployeeUpdate) -> Result<(), ValidationError> {
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(name) = &update.full_name {
        validate_name("full_name", name, 200)?;
    }
    if let Some(password) = &update.password {
        validate_password(password)?;
    }
    if let Some(rate) = update.hourly_rate_cents {
        validate_amount("hourly_rate_cents", rate)?;
    }
    Ok(())
}

/// Admins may not lock themselves out.
fn check_self_update(user: &AuthUser, id: &str, update: &EmployeeUpdate) -> Result<(), CoreError> {
    if !user.is_self(id) {
        return Ok(());
    }
    if update.is_active == Some(false) {
        return Err(CoreError::SelfAction(
            "You cannot deactivate your own account".to_string(),
        ));
    }
    if matches!(update.role, Some(role) if role != user.role) {
        return Err(CoreError::SelfAction(
            "You cannot change your own role".to_string(),
        ));
    }
    Ok(())
}

/// GET /employees
async fn list_employees(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(params): Query<EmployeeQuery>,
) -> Result<Json<Listing<Employee>>, ApiError> {
    user.require(Role::Manager)?;
    let page = Page::new(params.limit, params.offset);

    let employees = state
        .db
        .employees()
        .list(params.include_inactive.unwrap_or(false), page)
        .await?;
    Ok(Json(Listing::new(employees, page)))
}

/// GET /employees/{id} - manager+ or self
async fn get_employee(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    if !user.is_self(&id) {
        user.require(Role::Manager)?;
    }
    Ok(Json(state.db.employees().get(&id).await?))
}

/// POST /employees
async fn create_employee(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    user.require(Role::Admin)?;
    validate_new_employee(&req)?;

    let hash = hash_password(&req.password)?;
    let employee = state.db.employees().create(&req, &hash).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// PUT /employees/{id}
async fn update_employee(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<EmployeeUpdate>,
) -> Result<Json<Employee>, ApiError> {
    let self_service = user.is_self(&id) && req.is_self_service();
    if !self_service {
        user.require(Role::Admin)?;
    }
    check_self_update(&user, &id, &req)?;
    validate_employee_update(&req)?;

    let hash = match req.password.as_deref() {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let employee = state
        .db
        .employees()
        .update(&id, &req, hash.as_deref())
        .await?;
    Ok(Json(employee))
}

/// DELETE /employees/{id} - deactivates
async fn delete_employee(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Role::Admin)?;
    if user.is_self(&id) {
        return Err(CoreError::SelfAction("You cannot deactivate your own account".to_string()).into());
    }

    state.db.employees().deactivate(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AuthUser {
        AuthUser {
            employee_id: "admin-1".into(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_admin_cannot_deactivate_self() {
        let update = EmployeeUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(check_self_update(&admin(), "admin-1", &update).is_err());
        assert!(check_self_update(&admin(), "someone-else", &update).is_ok());
    }

    #[test]
    fn test_admin_cannot_demote_self() {
        let update = EmployeeUpdate {
            role: Some(Role::Cashier),
            ..Default::default()
        };
        assert!(check_self_update(&admin(), "admin-1", &update).is_err());

        let same = EmployeeUpdate {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert!(check_self_update(&admin(), "admin-1", &same).is_ok());
    }

    #[test]
    fn test_validate_new_employee() {
        let mut input = NewEmployee {
            email: "sam@store.test".into(),
            full_name: "Sam".into(),
            role: Role::Cashier,
            password: "long-enough".into(),
            phone: None,
            hourly_rate_cents: Some(1_600),
            hired_at: None,
        };
        assert!(validate_new_employee(&input).is_ok());

        input.password = "short".into();
        assert!(validate_new_employee(&input).is_err());
    }
}
