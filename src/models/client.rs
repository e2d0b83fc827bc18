use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub preferences: Option<String>,
    pub notes: Option<String>,
}

impl Client {
    /// Name and email match case-insensitively, phone by plain substring.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        let lowered = term.to_lowercase();
        self.name.to_lowercase().contains(&lowered)
            || self.phone.contains(term)
            || self
                .email
                .as_deref()
                .is_some_and(|e| e.to_lowercase().contains(&lowered))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInput {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub preferences: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ClientInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(AppError::Validation(
                "client name and phone are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_client(self, id: i64) -> Client {
        Client {
            id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            preferences: self.preferences,
            notes: self.notes,
        }
    }
}
