//! Status transitions: outstanding -> paid -> outstanding, and deletion.
//!
//! Lookups are always by id and company together, so an id belonging to
//! another company reads exactly like an id that does not exist.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{BillingError, Result, ValidationError};
use crate::model::{Invoice, InvoiceStatus, Payment};
use crate::session::Session;
use crate::store::{InvoiceOrder, InvoiceQuery, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct MarkPaid {
    pub paid_date: NaiveDate,
    pub method: Option<String>,
    pub reference: Option<String>,
    /// When set, the update only applies if the stored version still matches.
    pub expected_version: Option<u64>,
}

impl MarkPaid {
    pub fn on(paid_date: NaiveDate) -> Self {
        Self {
            paid_date,
            method: None,
            reference: None,
            expected_version: None,
        }
    }
}

pub fn get_invoice<S: Store + ?Sized>(store: &S, session: &Session, id: Uuid) -> Result<Invoice> {
    store
        .invoice(session.company_id, id)?
        .ok_or_else(|| BillingError::not_found("Invoice", id))
}

pub fn find_by_number<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    number: &str,
) -> Result<Invoice> {
    let query = InvoiceQuery {
        number: Some(number.to_string()),
        ..InvoiceQuery::default()
    };
    store
        .invoices(session.company_id, &query)?
        .into_iter()
        .next()
        .ok_or_else(|| BillingError::not_found("Invoice", number))
}

/// Unpaid backlog, oldest invoice first.
pub fn list_outstanding<S: Store + ?Sized>(store: &S, session: &Session) -> Result<Vec<Invoice>> {
    let query = InvoiceQuery {
        order: InvoiceOrder::OldestFirst,
        ..InvoiceQuery::with_status(InvoiceStatus::Outstanding)
    };
    Ok(store.invoices(session.company_id, &query)?)
}

fn check_version(invoice: &Invoice, expected: Option<u64>) -> Result<()> {
    match expected {
        Some(v) if v != invoice.version => Err(BillingError::Conflict(format!(
            "invoice {} is at version {}, expected {}",
            invoice.invoice_number, invoice.version, v
        ))),
        _ => Ok(()),
    }
}

fn save<S: Store + ?Sized>(store: &mut S, mut invoice: Invoice) -> Result<Invoice> {
    invoice.version += 1;
    if !store.update_invoice(&invoice)? {
        return Err(BillingError::not_found("Invoice", invoice.id));
    }
    Ok(invoice)
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Records payment. Marking an already paid invoice again overwrites the
/// payment details.
pub fn mark_paid<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    id: Uuid,
    payment: MarkPaid,
) -> Result<Invoice> {
    let mut invoice = get_invoice(&*store, session, id)?;
    check_version(&invoice, payment.expected_version)?;

    if invoice.status == InvoiceStatus::Draft {
        return Err(ValidationError::InvalidTransition {
            status: invoice.status,
            action: "mark paid",
        }
        .into());
    }

    invoice.status = InvoiceStatus::Paid;
    invoice.payment = Some(Payment {
        paid_date: payment.paid_date,
        method: clean(payment.method),
        reference: clean(payment.reference),
    });
    let invoice = save(store, invoice)?;

    tracing::info!(
        company = %session.company_id,
        number = %invoice.invoice_number,
        paid_date = %payment.paid_date,
        "marked invoice paid"
    );
    Ok(invoice)
}

/// Moves a paid invoice back to outstanding and forgets the payment.
/// Reopening an outstanding invoice changes nothing.
pub fn reopen<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    id: Uuid,
    expected_version: Option<u64>,
) -> Result<Invoice> {
    let mut invoice = get_invoice(&*store, session, id)?;
    check_version(&invoice, expected_version)?;

    match invoice.status {
        InvoiceStatus::Outstanding => return Ok(invoice),
        InvoiceStatus::Draft => {
            return Err(ValidationError::InvalidTransition {
                status: invoice.status,
                action: "reopen",
            }
            .into())
        }
        InvoiceStatus::Paid => {}
    }

    invoice.status = InvoiceStatus::Outstanding;
    invoice.payment = None;
    let invoice = save(store, invoice)?;

    tracing::info!(
        company = %session.company_id,
        number = %invoice.invoice_number,
        "reopened invoice"
    );
    Ok(invoice)
}

/// Removes the invoice for good. Clients and routes are untouched.
pub fn delete_invoice<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    id: Uuid,
) -> Result<Invoice> {
    let removed = store
        .delete_invoice(session.company_id, id)?
        .ok_or_else(|| BillingError::not_found("Invoice", id))?;

    tracing::info!(
        company = %session.company_id,
        number = %removed.invoice_number,
        "deleted invoice"
    );
    Ok(removed)
}
