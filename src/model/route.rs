use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// One dated rate for a route. `effective_to` is inclusive when present.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PriceEntry {
    pub amount: Money,
    pub effective_from: NaiveDate,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl PriceEntry {
    pub fn new(amount: Money, effective_from: NaiveDate) -> Self {
        Self {
            amount,
            effective_from,
            effective_to: None,
        }
    }

    pub fn until(mut self, effective_to: NaiveDate) -> Self {
        self.effective_to = Some(effective_to);
        self
    }

    pub fn covers(&self, at: NaiveDate) -> bool {
        self.effective_from <= at && self.effective_to.map_or(true, |to| to >= at)
    }
}

/// A rate preset: a named lane agreed with one client, with its price history.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub company_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description_template: Option<String>,
    #[serde(default)]
    pub pickup_city: Option<String>,
    #[serde(default)]
    pub delivery_city: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
}

fn default_active() -> bool {
    true
}

impl Route {
    /// Text used as the invoice description when the caller gives none.
    pub fn invoice_description(&self) -> &str {
        match self.description_template.as_deref().map(str::trim) {
            Some(template) if !template.is_empty() => template,
            _ => self.name.trim(),
        }
    }
}
