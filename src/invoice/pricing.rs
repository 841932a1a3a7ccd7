use chrono::NaiveDate;

use crate::model::PriceEntry;
use crate::money::Money;

/// Picks the rate in force on `at` from a route's price history.
///
/// Among entries whose window contains `at`, the one with the latest
/// `effective_from` wins. `None` means no rate applies and the caller has to
/// supply an amount; it never means zero.
pub fn resolve_effective_price(prices: &[PriceEntry], at: NaiveDate) -> Option<Money> {
    let mut winner: Option<&PriceEntry> = None;

    for entry in prices.iter().filter(|p| p.covers(at)) {
        winner = match winner {
            Some(current) if entry.effective_from < current.effective_from => Some(current),
            Some(current) if entry.effective_from == current.effective_from => {
                tracing::warn!(
                    effective_from = %entry.effective_from,
                    kept = entry.amount.cents(),
                    dropped = current.amount.cents(),
                    "two prices start on the same day; using the later entry"
                );
                Some(entry)
            }
            _ => Some(entry),
        };
    }

    winner.map(|p| p.amount)
}
