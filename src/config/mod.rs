mod settings;

pub use settings::{Config, InvoiceSettings, StoreSettings};

use crate::error::{BillingError, Result};
use crate::model::Company;
use crate::store::{FileStore, Store};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Get the config directory path (XDG config dir, or ~/.haulbill/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "haulbill") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".haulbill"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    if !config_dir.exists() {
        return Err(BillingError::ConfigNotFound(config_dir.to_path_buf()));
    }
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(BillingError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillingError::ConfigParse { path, source: e })
}

/// Save config.toml
pub fn save_config(config_dir: &Path, config: &Config) -> Result<()> {
    let path = config_dir.join("config.toml");
    let content = toml::to_string_pretty(config).map_err(|e| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })?;
    fs::write(path, format!("{CONFIG_HEADER}{content}"))?;
    Ok(())
}

/// Resolve the ledger path from config, relative to the config directory
pub fn ledger_path(config_dir: &Path, settings: &StoreSettings) -> PathBuf {
    let path = expand_path(&settings.ledger);
    if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    }
}

/// Open the ledger named by the config
pub fn open_store(config_dir: &Path, config: &Config) -> Result<FileStore> {
    Ok(FileStore::open(ledger_path(config_dir, &config.store))?)
}

/// Create `config_dir` with config.toml, a ledger holding `company` and a
/// preset template.
///
/// The directory is assembled under a hidden staging name next to it and
/// renamed into place last, so a failed init leaves nothing behind.
pub fn init_config_dir(config_dir: &Path, config: &Config, company: Company) -> Result<()> {
    if config_dir.exists() {
        return Err(BillingError::AlreadyInitialized(config_dir.to_path_buf()));
    }

    let parent = config_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent)?;
    let name = config_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "haulbill".to_string());
    let staging = parent.join(format!(".{name}.init-{}", Uuid::new_v4().simple()));
    fs::create_dir(&staging)?;

    let result = populate(&staging, config, company)
        .and_then(|_| fs::rename(&staging, config_dir).map_err(BillingError::from));
    if result.is_err() {
        if let Err(e) = fs::remove_dir_all(&staging) {
            tracing::warn!(path = %staging.display(), error = %e, "could not remove staging directory");
        }
    }
    result
}

fn populate(dir: &Path, config: &Config, company: Company) -> Result<()> {
    let mut store = FileStore::open(ledger_path(dir, &config.store))?;
    store.insert_company(company)?;
    save_config(dir, config)?;
    fs::write(dir.join("presets.example.toml"), PRESETS_TEMPLATE)?;
    Ok(())
}

const CONFIG_HEADER: &str = r#"# haulbill configuration
#
# [session] identifies who is acting: every command is scoped to company_id.
# [invoice] controls generated invoice numbers ({number_prefix}-{YYYYMM}-{NNNN})
# and the payment terms given to new clients.
# [store] names the ledger file holding clients, routes and invoices.

"#;

/// Template for a preset file accepted by `haulbill import`.
pub const PRESETS_TEMPLATE: &str = r#"# Clients and their rate presets. Amounts are integer cents.
#
#   haulbill import presets.toml

[[clients]]
name = "Example Distribution Co."
address = """
971 25th St
San Francisco, CA 94107"""
emails = ["ap@example.com"]
payment_terms_days = 30

[[clients.routes]]
name = "SSF to SF"
description = "South San Francisco, CA to San Francisco, CA"
pickup_city = "South San Francisco, CA"
delivery_city = "San Francisco, CA"
price = 100000
effective_from = "2024-01-01"
"#;
