use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_PAYMENT_TERMS_DAYS;
use crate::session::Identity;

/// Contents of `config.toml`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session: Identity,
    #[serde(default)]
    pub invoice: InvoiceSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoiceSettings {
    /// Leading part of generated invoice numbers, e.g. `UPL` in `UPL-202403-4821`.
    #[serde(default = "default_prefix")]
    pub number_prefix: String,
    /// Terms given to new clients when none are specified.
    #[serde(default = "default_terms")]
    pub default_terms_days: u32,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            number_prefix: default_prefix(),
            default_terms_days: default_terms(),
        }
    }
}

fn default_prefix() -> String {
    "UPL".to_string()
}

fn default_terms() -> u32 {
    DEFAULT_PAYMENT_TERMS_DAYS
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    /// Ledger file name, relative to the config directory unless absolute.
    #[serde(default = "default_ledger")]
    pub ledger: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            ledger: default_ledger(),
        }
    }
}

fn default_ledger() -> String {
    "ledger.toml".to_string()
}
