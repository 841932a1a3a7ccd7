use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const DEFAULT_TIMEZONE: &str = "America/Los_Angeles";

/// Tenant boundary. Everything else carries a `company_id` pointing here.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Company {
    pub fn new(name: impl Into<String>, timezone: impl Into<String>) -> Result<Self, ValidationError> {
        let company = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timezone: timezone.into(),
        };
        company.tz()?;
        Ok(company)
    }

    /// The operating timezone used for calendar boundaries (today, year start).
    pub fn tz(&self) -> Result<Tz, ValidationError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ValidationError::InvalidTimezone(self.timezone.clone()))
    }
}
