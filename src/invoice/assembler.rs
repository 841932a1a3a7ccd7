use chrono::{Days, NaiveDate, Utc};
use rand::Rng;
use uuid::Uuid;

use super::line_items::{aggregate, LineItemInput};
use super::pricing::resolve_effective_price;
use crate::config::InvoiceSettings;
use crate::error::{BillingError, Result, ValidationError};
use crate::model::{Client, Invoice, InvoiceLine, InvoiceStatus, Route};
use crate::money::Money;
use crate::session::Session;
use crate::store::Store;

/// How the caller wants the invoice priced and described.
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceLines {
    /// Manual entry. Either part left out falls back to the route.
    Explicit {
        description: Option<String>,
        amount: Option<Money>,
    },
    /// Primary item first, then any extras.
    LineItems(Vec<LineItemInput>),
    /// Everything comes from the route's template and price history.
    RouteDerived,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub client_id: Uuid,
    pub route_id: Option<Uuid>,
    pub invoice_date: NaiveDate,
    pub load_ref: Option<String>,
    pub invoice_number: Option<String>,
    pub draft: bool,
    pub lines: InvoiceLines,
}

impl NewInvoice {
    pub fn new(client_id: Uuid, invoice_date: NaiveDate, lines: InvoiceLines) -> Self {
        Self {
            client_id,
            route_id: None,
            invoice_date,
            load_ref: None,
            invoice_number: None,
            draft: false,
            lines,
        }
    }

    pub fn route(mut self, route_id: Uuid) -> Self {
        self.route_id = Some(route_id);
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    pub fn load_ref(mut self, load_ref: impl Into<String>) -> Self {
        self.load_ref = Some(load_ref.into());
        self
    }
}

/// `{prefix}-{YYYYMM}-{NNNN}` with a random four-digit suffix.
pub fn generate_invoice_number(prefix: &str, today: NaiveDate, rng: &mut impl Rng) -> String {
    let suffix: u16 = rng.gen_range(1000..=9999);
    format!("{}-{}-{suffix}", prefix, today.format("%Y%m"))
}

pub fn due_date(invoice_date: NaiveDate, terms_days: u32) -> Result<NaiveDate> {
    invoice_date
        .checked_add_days(Days::new(u64::from(terms_days)))
        .ok_or_else(|| {
            ValidationError::InvalidDate {
                field: "invoice date",
                value: invoice_date.to_string(),
            }
            .into()
        })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn active_client<S: Store + ?Sized>(store: &S, session: &Session, id: Uuid) -> Result<Client> {
    store
        .client(session.company_id, id)?
        .filter(|c| c.active)
        .ok_or_else(|| ValidationError::UnknownClient(id.to_string()).into())
}

fn active_route<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    client: &Client,
    id: Uuid,
) -> Result<Route> {
    let route = store
        .route(session.company_id, id)?
        .filter(|r| r.active)
        .ok_or_else(|| ValidationError::UnknownRoute(id.to_string()))?;
    if route.client_id != client.id {
        return Err(ValidationError::RouteClientMismatch {
            route: route.id,
            client: client.id,
        }
        .into());
    }
    Ok(route)
}

/// Builds and stores a new invoice.
///
/// Amount precedence: positive explicit amount, then the line item total,
/// then the route price on the invoice date. Description precedence:
/// explicit text, then the primary line item, then the route.
///
/// A taken invoice number comes back as `BillingError::Conflict`; resubmit
/// with another number or none.
pub fn create_invoice<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    settings: &InvoiceSettings,
    input: NewInvoice,
) -> Result<Invoice> {
    let company = super::require_company(&*store, session)?;
    let tz = company.tz()?;

    let client = active_client(&*store, session, input.client_id)?;
    let route = input
        .route_id
        .map(|id| active_route(&*store, session, &client, id))
        .transpose()?;

    let route_price = route
        .as_ref()
        .and_then(|r| resolve_effective_price(&r.prices, input.invoice_date));
    let route_description = route
        .as_ref()
        .map(|r| r.invoice_description().to_string())
        .filter(|d| !d.is_empty());

    let (explicit_description, explicit_amount, lines) = match input.lines {
        InvoiceLines::Explicit {
            description,
            amount,
        } => (non_empty(description), amount, None),
        InvoiceLines::LineItems(items) => (None, None, Some(aggregate(&items)?)),
        InvoiceLines::RouteDerived => (None, None, None),
    };

    let line_total = lines.as_ref().map(|l| l.total).filter(|t| t.is_positive());
    let (amount, from_lines) = if let Some(a) = explicit_amount.filter(|a| a.is_positive()) {
        (a, false)
    } else if let Some(total) = line_total {
        (total, true)
    } else if let Some(price) = route_price {
        (price, false)
    } else if let Some(a) = explicit_amount {
        return Err(ValidationError::NonPositiveAmount(a.cents()).into());
    } else {
        return Err(ValidationError::MissingAmount(input.invoice_date).into());
    };
    if !amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount(amount.cents()).into());
    }

    let description = explicit_description
        .or_else(|| {
            lines
                .as_ref()
                .map(|l| l.primary_description.clone())
                .filter(|d| !d.is_empty())
        })
        .or(route_description)
        .ok_or(ValidationError::MissingDescription)?;

    let line_items: Vec<InvoiceLine> = match lines {
        Some(agg) if from_lines => agg.active_items,
        _ => Vec::new(),
    };

    let invoice_number = match non_empty(input.invoice_number) {
        Some(n) => n,
        None => {
            let today = Utc::now().with_timezone(&tz).date_naive();
            generate_invoice_number(&settings.number_prefix, today, &mut rand::thread_rng())
        }
    };

    let invoice = Invoice {
        id: Uuid::new_v4(),
        company_id: session.company_id,
        client_id: client.id,
        route_id: route.as_ref().map(|r| r.id),
        invoice_number,
        load_ref: non_empty(input.load_ref),
        description,
        amount,
        invoice_date: input.invoice_date,
        due_date: due_date(input.invoice_date, client.payment_terms_days)?,
        status: if input.draft {
            InvoiceStatus::Draft
        } else {
            InvoiceStatus::Outstanding
        },
        created_by: session.user_id,
        created_at: Utc::now(),
        version: 1,
        payment: None,
        line_items,
    };

    if let Err(e) = store.insert_invoice(invoice.clone()) {
        tracing::warn!(
            company = %session.company_id,
            number = %invoice.invoice_number,
            error = %e,
            "invoice not stored"
        );
        return Err(BillingError::from(e));
    }

    tracing::info!(
        company = %session.company_id,
        number = %invoice.invoice_number,
        amount = invoice.amount.cents(),
        status = %invoice.status,
        "created invoice"
    );
    Ok(invoice)
}
