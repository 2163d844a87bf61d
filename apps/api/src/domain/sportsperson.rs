use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::RegistrationError;

/// Athlete known to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sportsperson {
    pub id: Uuid,
    pub full_name: String,
    /// Federation number printed on start lists
    pub external_number: Option<String>,
    pub city: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Details of a sportsperson an operator registers for the first time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportspersonDraft {
    pub full_name: String,
    #[serde(default)]
    pub external_number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl SportspersonDraft {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            external_number: None,
            city: None,
            birth_date: None,
        }
    }

    /// Validates the draft and assigns an identity
    pub fn into_sportsperson(self) -> Result<Sportsperson, RegistrationError> {
        let full_name = self.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(RegistrationError::validation(
                "Sportsperson name cannot be empty",
            ));
        }

        Ok(Sportsperson {
            id: Uuid::new_v4(),
            full_name,
            external_number: non_blank(self.external_number),
            city: non_blank(self.city),
            birth_date: self.birth_date,
            created_at: Utc::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
