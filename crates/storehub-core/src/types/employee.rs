//! Employees and their roles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Access level of an employee.
///
/// ## Role Ladder
/// ```text
/// admin    ── everything, including employee management
///   ▲
/// manager  ── catalog, purchasing, adjustments, reports, email
///   ▲
/// cashier  ── sales, customers, loyalty earn/redeem, own drawer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Cashier,
    Manager,
    Admin,
}

impl Role {
    fn rank(&self) -> u8 {
        match self {
            Role::Cashier => 0,
            Role::Manager => 1,
            Role::Admin => 2,
        }
    }

    /// True when this role meets or exceeds `required`.
    pub fn allows(&self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cashier => "cashier",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cashier" => Ok(Role::Cashier),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(crate::ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["cashier".into(), "manager".into(), "admin".into()],
            }),
        }
    }
}

/// A staff member. The password hash lives only in the database layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub is_active: bool,
    #[ts(as = "Option<String>")]
    pub hired_at: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEmployee {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub password: String,
    pub phone: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    #[ts(as = "Option<String>")]
    pub hired_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub hourly_rate_cents: Option<i64>,
    pub is_active: Option<bool>,
}

impl EmployeeUpdate {
    /// Fields an employee may change on their own record.
    pub fn is_self_service(&self) -> bool {
        self.email.is_none()
            && self.role.is_none()
            && self.hourly_rate_cents.is_none()
            && self.is_active.is_none()
    }
}
