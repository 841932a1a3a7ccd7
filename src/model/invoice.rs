use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    #[default]
    Outstanding,
    Paid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Outstanding => "outstanding",
            InvoiceStatus::Paid => "paid",
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InvoiceLine {
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub primary: bool,
}

/// Settlement details, present only while an invoice is paid.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Payment {
    pub paid_date: NaiveDate,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Invoice {
    pub id: Uuid,
    pub company_id: Uuid,
    pub client_id: Uuid,
    #[serde(default)]
    pub route_id: Option<Uuid>,
    pub invoice_number: String,
    #[serde(default)]
    pub load_ref: Option<String>,
    pub description: String,
    pub amount: Money,
    pub invoice_date: NaiveDate,
    /// Fixed at creation from the client's terms; never recomputed.
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "first_version")]
    pub version: u64,
    #[serde(default)]
    pub payment: Option<Payment>,
    #[serde(default)]
    pub line_items: Vec<InvoiceLine>,
}

fn first_version() -> u64 {
    1
}

impl Invoice {
    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.payment.as_ref().map(|p| p.paid_date)
    }
}
