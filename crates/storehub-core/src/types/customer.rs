use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::product::non_empty;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub marketing_opt_in: bool,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub marketing_opt_in: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub marketing_opt_in: Option<bool>,
}

impl CustomerUpdate {
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(v) = &self.first_name {
            customer.first_name = v.trim().to_string();
        }
        if let Some(v) = &self.last_name {
            customer.last_name = v.trim().to_string();
        }
        if let Some(v) = &self.email {
            customer.email = non_empty(v).map(|e| e.to_lowercase());
        }
        if let Some(v) = &self.phone {
            customer.phone = non_empty(v);
        }
        if let Some(v) = &self.notes {
            customer.notes = non_empty(v);
        }
        if let Some(v) = self.marketing_opt_in {
            customer.marketing_opt_in = v;
        }
    }
}
