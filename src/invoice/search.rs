use regex::{Regex, RegexBuilder};

use crate::error::{Result, ValidationError};
use crate::model::Invoice;
use crate::session::Session;
use crate::store::{InvoiceOrder, InvoiceQuery, Store};

pub const SEARCH_LIMIT: usize = 200;

/// Case-insensitive pattern matching `query` literally, surrounding spaces
/// included. Blank queries match everything.
pub fn literal_pattern(query: &str) -> Result<Option<Regex>> {
    if query.trim().is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|_| ValidationError::InvalidSearch(query.to_string()).into())
}

/// Substring search over invoice number, load reference and description,
/// newest invoice first.
pub fn search_invoices<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    query: &str,
) -> Result<Vec<Invoice>> {
    let query = InvoiceQuery {
        text: literal_pattern(query)?,
        order: InvoiceOrder::NewestFirst,
        limit: Some(SEARCH_LIMIT),
        ..InvoiceQuery::default()
    };
    let hits = store.invoices(session.company_id, &query)?;
    tracing::debug!(company = %session.company_id, hits = hits.len(), "invoice search");
    Ok(hits)
}
