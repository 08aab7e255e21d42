//! # Employee Repository
//!
//! Staff accounts. Password hashes are produced by the caller (the API's
//! auth module) and never leave this module except through
//! [`EmployeeRepository::find_credentials`].

use chrono::Utc;
use sqlx::SqlitePool;
use storehub_core::{Employee, EmployeeUpdate, NewEmployee, Page};
use tracing::{debug, info};

use super::{clean, new_id};
use crate::error::{DbError, DbResult};

const EMPLOYEE_COLUMNS: &str = "id, email, full_name, role, phone, hourly_rate_cents, \
     is_active, hired_at, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn list(&self, include_inactive: bool, page: Page) -> DbResult<Vec<Employee>> {
        let sql = format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees
            WHERE ?1 = 1 OR is_active = 1
            ORDER BY full_name
            LIMIT ?2 OFFSET ?3
            "#
        );

        let employees = sqlx::query_as::<_, Employee>(&sql)
            .bind(include_inactive)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(employees)
    }

    pub async fn get(&self, id: &str) -> DbResult<Employee> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1");

        sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Employee", id))
    }

    /// Looks up an employee and their password hash for login.
    ///
    /// Email comparison is case-insensitive (the column is `COLLATE NOCASE`).
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<(Employee, String)>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?1");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        let Some(employee) = employee else {
            return Ok(None);
        };

        let hash: String = sqlx::query_scalar("SELECT password_hash FROM employees WHERE id = ?1")
            .bind(&employee.id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some((employee, hash)))
    }

    /// Inserts an employee with an already hashed password.
    pub async fn create(&self, input: &NewEmployee, password_hash: &str) -> DbResult<Employee> {
        info!(role = input.role.as_str(), "Creating employee");

        let now = Utc::now();
        let employee = Employee {
            id: new_id(),
            email: input.email.trim().to_lowercase(),
            full_name: input.full_name.trim().to_string(),
            role: input.role,
            phone: clean(input.phone.as_deref()),
            hourly_rate_cents: input.hourly_rate_cents,
            is_active: true,
            hired_at: input.hired_at,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, email, full_name, role, password_hash, phone,
                hourly_rate_cents, is_active, hired_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.email)
        .bind(&employee.full_name)
        .bind(employee.role)
        .bind(password_hash)
        .bind(&employee.phone)
        .bind(employee.hourly_rate_cents)
        .bind(employee.is_active)
        .bind(employee.hired_at)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &employee.email),
            other => other,
        })?;

        Ok(employee)
    }

    /// Applies a partial update. `password_hash` replaces the stored hash
    /// when given; the plain password in `update` is ignored here.
    pub async fn update(
        &self,
        id: &str,
        update: &EmployeeUpdate,
        password_hash: Option<&str>,
    ) -> DbResult<Employee> {
        debug!(id = %id, "Updating employee");

        let mut employee = self.get(id).await?;
        if let Some(email) = &update.email {
            employee.email = email.trim().to_lowercase();
        }
        if let Some(name) = &update.full_name {
            employee.full_name = name.trim().to_string();
        }
        if let Some(role) = update.role {
            employee.role = role;
        }
        if let Some(phone) = &update.phone {
            employee.phone = clean(Some(phone));
        }
        if let Some(rate) = update.hourly_rate_cents {
            employee.hourly_rate_cents = Some(rate);
        }
        if let Some(active) = update.is_active {
            employee.is_active = active;
        }
        employee.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE employees SET
                email = ?2, full_name = ?3, role = ?4, phone = ?5,
                hourly_rate_cents = ?6, is_active = ?7, updated_at = ?8,
                password_hash = COALESCE(?9, password_hash)
            WHERE id = ?1
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.email)
        .bind(&employee.full_name)
        .bind(employee.role)
        .bind(&employee.phone)
        .bind(employee.hourly_rate_cents)
        .bind(employee.is_active)
        .bind(employee.updated_at)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &employee.email),
            other => other,
        })?;

        Ok(employee)
    }

    /// Deactivates an employee. Their history keeps the reference.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        info!(id = %id, "Deactivating employee");

        let result = sqlx::query("UPDATE employees SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }
        Ok(())
    }

    /// Number of employees, active or not. Zero means the store needs a
    /// bootstrap admin.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
