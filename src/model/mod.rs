mod client;
mod company;
mod invoice;
mod route;

pub use client::{Client, DEFAULT_PAYMENT_TERMS_DAYS};
pub use company::{Company, DEFAULT_TIMEZONE};
pub use invoice::{Invoice, InvoiceLine, InvoiceStatus, Payment};
pub use route::{PriceEntry, Route};
