use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::model::InvoiceStatus;
use crate::money::Money;
use crate::session::Session;
use crate::store::{InvoiceQuery, Store};

/// Cash-basis dashboard figures for one company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    /// All outstanding invoices, whatever their date.
    pub outstanding_total: Money,
    pub outstanding_count: u64,
    /// Paid invoices whose paid date falls in the current calendar year.
    pub ytd_income: Money,
}

/// `[Jan 1, next Jan 1)` of the year `as_of` falls in, read in `tz`.
pub fn year_window(as_of: DateTime<Utc>, tz: Tz) -> Result<(NaiveDate, NaiveDate)> {
    let year = as_of.with_timezone(&tz).year();
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(ValidationError::InvalidDate {
            field: "as-of date",
            value: as_of.to_rfc3339(),
        }
        .into()),
    }
}

pub fn compute_kpis<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    as_of: DateTime<Utc>,
) -> Result<Kpis> {
    let company = super::require_company(store, session)?;
    let window = year_window(as_of, company.tz()?)?;

    let outstanding = store.aggregate_invoices(
        session.company_id,
        &InvoiceQuery::with_status(InvoiceStatus::Outstanding),
    )?;
    let paid = store.aggregate_invoices(
        session.company_id,
        &InvoiceQuery {
            paid_between: Some(window),
            ..InvoiceQuery::with_status(InvoiceStatus::Paid)
        },
    )?;

    tracing::debug!(
        company = %session.company_id,
        year_start = %window.0,
        outstanding = outstanding.count,
        paid = paid.count,
        "computed kpis"
    );
    Ok(Kpis {
        outstanding_total: outstanding.total,
        outstanding_count: outstanding.count,
        ytd_income: paid.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn year_boundary_follows_company_zone() {
        // 2025-01-01 03:00 UTC is still New Year's Eve in Los Angeles.
        let as_of = Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap();

        let (start, end) = year_window(as_of, chrono_tz::America::Los_Angeles).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        let (start, _) = year_window(as_of, chrono_tz::UTC).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
