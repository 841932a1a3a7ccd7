use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::model::InvoiceStatus;
use crate::money::Money;

/// Caller-caused rejections. Each variant names the precondition that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid client '{0}'")]
    UnknownClient(String),

    #[error("Invalid route '{0}'")]
    UnknownRoute(String),

    #[error("Route '{route}' does not belong to client '{client}'")]
    RouteClientMismatch { route: Uuid, client: Uuid },

    #[error("Description is required (give one explicitly, on the first line item, or via a route)")]
    MissingDescription,

    #[error("Amount is required: no explicit amount, no line item total and no route price effective on {0}")]
    MissingAmount(chrono::NaiveDate),

    #[error("Amount must be at least one cent (got {0} cents)")]
    NonPositiveAmount(i64),

    #[error("Invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid amount '{0}': expected dollars such as 1150 or 1,150.50")]
    InvalidAmount(String),

    #[error("Name is required")]
    MissingName,

    #[error("Price entry ending {to} starts after it ends ({from})")]
    InvertedPriceWindow {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },

    #[error("Route already has a price effective from {0}")]
    DuplicatePriceStart(chrono::NaiveDate),

    #[error("Unknown timezone '{0}'")]
    InvalidTimezone(String),

    #[error("Cannot {action} an invoice that is {status}")]
    InvalidTransition {
        status: InvoiceStatus,
        action: &'static str,
    },

    #[error("Search text '{0}' is too long")]
    InvalidSearch(String),

    #[error("Invalid line item '{0}'. Expected 'description=amount' (e.g., 'Detention=50.00')")]
    InvalidLineItemFormat(String),

    #[error("Total is too large: amounts add up past {}", Money::from_cents(i64::MAX))]
    AmountTooLarge,
}

#[derive(Error, Debug)]
pub enum BillingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness constraint or version check failed; resubmitting is safe.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {0}")]
    Dependency(String),

    #[error("No company in session. Set [session].company_id in config.toml or run 'haulbill init'.")]
    Unauthenticated,

    #[error("Config directory not found at {0}. Run 'haulbill init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BillingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        BillingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the caller may resubmit the same request and expect a different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
