use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAYMENT_TERMS_DAYS: u32 = 30;

fn default_terms() -> u32 {
    DEFAULT_PAYMENT_TERMS_DAYS
}

fn default_active() -> bool {
    true
}

/// A billing client of one company.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Client {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    /// Free-text billing address; may span several lines.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default = "default_terms")]
    pub payment_terms_days: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}
