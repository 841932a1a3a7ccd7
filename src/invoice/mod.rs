mod assembler;
mod kpi;
mod lifecycle;
mod line_items;
mod pricing;
mod search;

pub use assembler::{create_invoice, due_date, generate_invoice_number, InvoiceLines, NewInvoice};
pub use kpi::{compute_kpis, year_window, Kpis};
pub use lifecycle::{
    delete_invoice, find_by_number, get_invoice, list_outstanding, mark_paid, reopen, MarkPaid,
};
pub use line_items::{aggregate, Aggregation, LineItemInput};
pub use pricing::resolve_effective_price;
pub use search::{literal_pattern, search_invoices, SEARCH_LIMIT};

use chrono::NaiveDate;

use crate::error::{BillingError, Result, ValidationError};
use crate::model::Company;
use crate::session::Session;
use crate::store::Store;

/// The session's own company record.
pub(crate) fn require_company<S: Store + ?Sized>(store: &S, session: &Session) -> Result<Company> {
    store
        .company(session.company_id)?
        .ok_or_else(|| BillingError::not_found("Company", session.company_id))
}

/// Parse a `YYYY-MM-DD` date, naming the field on failure.
pub fn parse_date(field: &'static str, value: &str) -> std::result::Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}
