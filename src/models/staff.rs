use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::models::Schedule;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub schedule: Schedule,
}

impl StaffMember {
    pub fn has_role(&self, roles: &[String]) -> bool {
        let role = self.role.trim().to_lowercase();
        roles.iter().any(|r| *r == role)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaffInput {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub schedule: Schedule,
}

impl StaffInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("staff name is required".to_string()));
        }
        Ok(())
    }

    pub fn into_staff(self, id: i64) -> StaffMember {
        StaffMember {
            id,
            name: self.name,
            role: self.role,
            email: self.email,
            phone: self.phone,
            schedule: self.schedule,
        }
    }
}
