//! Persistence boundary.
//!
//! Every read and write names the owning company; implementations never
//! return a record whose `company_id` differs from the one asked for.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::{Dataset, MemoryStore};

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{BillingError, ValidationError};
use crate::model::{Client, Company, Invoice, InvoiceStatus, Route};
use crate::money::Money;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("invoice total overflows")]
    Overflow,
}

impl From<StoreError> for BillingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => BillingError::Conflict(msg),
            StoreError::Unavailable(msg) => BillingError::Dependency(msg),
            StoreError::Overflow => BillingError::Validation(ValidationError::AmountTooLarge),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvoiceOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filter, ordering and limit for invoice reads and aggregates.
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    pub status: Option<InvoiceStatus>,
    pub number: Option<String>,
    /// Matched against invoice number, load reference and description.
    pub text: Option<Regex>,
    /// Half-open `[start, end)` window on the paid date.
    pub paid_between: Option<(NaiveDate, NaiveDate)>,
    pub order: InvoiceOrder,
    pub limit: Option<usize>,
}

impl InvoiceQuery {
    pub fn with_status(status: InvoiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        if self.status.is_some_and(|s| s != invoice.status) {
            return false;
        }
        if self
            .number
            .as_deref()
            .is_some_and(|n| n != invoice.invoice_number)
        {
            return false;
        }
        if let Some((start, end)) = self.paid_between {
            match invoice.paid_date() {
                Some(d) if d >= start && d < end => {}
                _ => return false,
            }
        }
        if let Some(re) = &self.text {
            let hit = re.is_match(&invoice.invoice_number)
                || invoice.load_ref.as_deref().is_some_and(|r| re.is_match(r))
                || re.is_match(&invoice.description);
            if !hit {
                return false;
            }
        }
        true
    }

    /// Sorts by invoice date and truncates to the limit.
    pub fn arrange(&self, mut invoices: Vec<Invoice>) -> Vec<Invoice> {
        match self.order {
            InvoiceOrder::NewestFirst => invoices.sort_by(|a, b| {
                b.invoice_date
                    .cmp(&a.invoice_date)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            }),
            InvoiceOrder::OldestFirst => invoices.sort_by(|a, b| {
                a.invoice_date
                    .cmp(&b.invoice_date)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            }),
        }
        if let Some(limit) = self.limit {
            invoices.truncate(limit);
        }
        invoices
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub total: Money,
    pub count: u64,
}

pub trait Store {
    fn company(&self, id: Uuid) -> StoreResult<Option<Company>>;
    fn insert_company(&mut self, company: Company) -> StoreResult<()>;

    fn client(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Client>>;
    fn clients(&self, company_id: Uuid, active_only: bool) -> StoreResult<Vec<Client>>;
    fn insert_client(&mut self, client: Client) -> StoreResult<()>;
    /// Replaces the stored client with the same id and company. Returns false if none.
    fn update_client(&mut self, client: &Client) -> StoreResult<bool>;

    fn route(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Route>>;
    fn routes(
        &self,
        company_id: Uuid,
        client_id: Option<Uuid>,
        active_only: bool,
    ) -> StoreResult<Vec<Route>>;
    fn insert_route(&mut self, route: Route) -> StoreResult<()>;
    fn update_route(&mut self, route: &Route) -> StoreResult<bool>;

    fn invoice(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Invoice>>;
    fn invoices(&self, company_id: Uuid, query: &InvoiceQuery) -> StoreResult<Vec<Invoice>>;
    /// Fails with `Duplicate` if the company already has this invoice number.
    fn insert_invoice(&mut self, invoice: Invoice) -> StoreResult<()>;
    fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<bool>;
    fn delete_invoice(&mut self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Invoice>>;
    fn aggregate_invoices(&self, company_id: Uuid, query: &InvoiceQuery) -> StoreResult<Aggregate>;
}
