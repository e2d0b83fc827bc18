use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// An entry on the service menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: u32,
}

impl ServiceInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("service name is required".to_string()));
        }
        if self.price.is_sign_negative() {
            return Err(AppError::Validation(format!(
                "service price must not be negative, got {}",
                self.price
            )));
        }
        if self.duration_minutes == 0 {
            return Err(AppError::Validation(
                "service duration must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_service(self, id: i64) -> Service {
        Service {
            id,
            name: self.name,
            category: self.category,
            description: self.description,
            price: self.price,
            duration_minutes: self.duration_minutes,
        }
    }
}
