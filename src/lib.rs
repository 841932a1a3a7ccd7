pub mod catalog;
pub mod config;
pub mod error;
pub mod invoice;
pub mod model;
pub mod money;
pub mod session;
pub mod store;

pub use config::{Config, InvoiceSettings};
pub use error::{BillingError, Result, ValidationError};
pub use invoice::{
    compute_kpis, create_invoice, delete_invoice, mark_paid, reopen, resolve_effective_price,
    search_invoices, InvoiceLines, Kpis, MarkPaid, NewInvoice,
};
pub use model::{Client, Company, Invoice, InvoiceLine, InvoiceStatus, PriceEntry, Route};
pub use money::Money;
pub use session::{Identity, Role, Session};
pub use store::{FileStore, MemoryStore, Store};
