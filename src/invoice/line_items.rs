use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::InvoiceLine;
use crate::money::Money;

/// A line item as the caller entered it. Either half may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LineItemInput {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<Money>,
}

impl LineItemInput {
    pub fn new(description: impl Into<String>, amount: Money) -> Self {
        Self {
            description: Some(description.into()),
            amount: Some(amount),
        }
    }

    fn trimmed_description(&self) -> &str {
        self.description.as_deref().map(str::trim).unwrap_or("")
    }

    /// Missing and non-positive amounts count as zero.
    fn effective_amount(&self) -> Money {
        self.amount.filter(|a| a.is_positive()).unwrap_or(Money::ZERO)
    }

    fn is_active(&self) -> bool {
        !self.trimmed_description().is_empty() || self.effective_amount().is_positive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Kept items, in input order. The first input item is flagged primary.
    pub active_items: Vec<InvoiceLine>,
    pub total: Money,
    /// Trimmed description of the first input item, active or not.
    pub primary_description: String,
    pub has_any_description: bool,
}

/// Folds the primary item and any extra rows into one total.
///
/// Rows with neither a description nor a positive amount are dropped, so a
/// form can hand over blank placeholder rows.
pub fn aggregate(items: &[LineItemInput]) -> Result<Aggregation, ValidationError> {
    let primary_description = items
        .first()
        .map(|i| i.trimmed_description().to_string())
        .unwrap_or_default();

    let active_items: Vec<InvoiceLine> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_active())
        .map(|(idx, item)| InvoiceLine {
            description: item.trimmed_description().to_string(),
            amount: item.effective_amount(),
            primary: idx == 0,
        })
        .collect();

    let total = Money::checked_sum(active_items.iter().map(|l| l.amount))
        .ok_or(ValidationError::AmountTooLarge)?;
    let has_any_description = active_items.iter().any(|l| !l.description.is_empty());

    Ok(Aggregation {
        active_items,
        total,
        primary_description,
        has_any_description,
    })
}
