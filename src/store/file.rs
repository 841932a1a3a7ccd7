use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{Aggregate, Dataset, InvoiceQuery, MemoryStore, Store, StoreError, StoreResult};
use crate::model::{Client, Company, Invoice, Route};

/// A `MemoryStore` mirrored to a TOML ledger file after every write.
///
/// Each write takes an exclusive lock on a sibling `.lock` file, re-reads the
/// ledger, applies the change to that fresh copy and renames a temp file over
/// the ledger before releasing the lock. Uniqueness is therefore checked
/// against what is on disk, not against what this process loaded earlier.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{}: {err}", path.display()))
}

fn read_dataset(path: &Path) -> StoreResult<Dataset> {
    if !path.exists() {
        return Ok(Dataset::default());
    }
    let content = fs::read_to_string(path).map_err(|e| unavailable(path, e))?;
    toml::from_str(&content).map_err(|e| unavailable(path, e))
}

fn write_dataset(path: &Path, data: &Dataset) -> StoreResult<()> {
    let content = toml::to_string_pretty(data)
        .map_err(|e| StoreError::Unavailable(format!("serialize ledger: {e}")))?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, content)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| unavailable(path, e))
}

impl FileStore {
    /// Loads the ledger at `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let data = read_dataset(&path)?;
        tracing::debug!(path = %path.display(), invoices = data.invoices.len(), "opened ledger");

        Ok(Self {
            path,
            inner: MemoryStore::from_dataset(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> StoreResult<RwLock<File>> {
        let lock_path = self.path.with_extension("toml.lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| unavailable(&lock_path, e))?;
        Ok(RwLock::new(file))
    }

    fn commit<T>(&mut self, op: impl FnOnce(&mut MemoryStore) -> StoreResult<T>) -> StoreResult<T> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write().map_err(|e| unavailable(&self.path, e))?;

        let mut current = MemoryStore::from_dataset(read_dataset(&self.path)?);
        let out = match op(&mut current) {
            Ok(out) => out,
            Err(e) => {
                self.inner = current;
                return Err(e);
            }
        };
        if let Err(e) = write_dataset(&self.path, current.dataset()) {
            tracing::error!(error = %e, "ledger write failed, nothing changed");
            return Err(e);
        }

        self.inner = current;
        Ok(out)
    }
}

impl Store for FileStore {
    fn company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        self.inner.company(id)
    }

    fn insert_company(&mut self, company: Company) -> StoreResult<()> {
        self.commit(|s| s.insert_company(company))
    }

    fn client(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Client>> {
        self.inner.client(company_id, id)
    }

    fn clients(&self, company_id: Uuid, active_only: bool) -> StoreResult<Vec<Client>> {
        self.inner.clients(company_id, active_only)
    }

    fn insert_client(&mut self, client: Client) -> StoreResult<()> {
        self.commit(|s| s.insert_client(client))
    }

    fn update_client(&mut self, client: &Client) -> StoreResult<bool> {
        self.commit(|s| s.update_client(client))
    }

    fn route(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Route>> {
        self.inner.route(company_id, id)
    }

    fn routes(
        &self,
        company_id: Uuid,
        client_id: Option<Uuid>,
        active_only: bool,
    ) -> StoreResult<Vec<Route>> {
        self.inner.routes(company_id, client_id, active_only)
    }

    fn insert_route(&mut self, route: Route) -> StoreResult<()> {
        self.commit(|s| s.insert_route(route))
    }

    fn update_route(&mut self, route: &Route) -> StoreResult<bool> {
        self.commit(|s| s.update_route(route))
    }

    fn invoice(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Invoice>> {
        self.inner.invoice(company_id, id)
    }

    fn invoices(&self, company_id: Uuid, query: &InvoiceQuery) -> StoreResult<Vec<Invoice>> {
        self.inner.invoices(company_id, query)
    }

    fn insert_invoice(&mut self, invoice: Invoice) -> StoreResult<()> {
        self.commit(|s| s.insert_invoice(invoice))
    }

    fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<bool> {
        self.commit(|s| s.update_invoice(invoice))
    }

    fn delete_invoice(&mut self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Invoice>> {
        self.commit(|s| s.delete_invoice(company_id, id))
    }

    fn aggregate_invoices(&self, company_id: Uuid, query: &InvoiceQuery) -> StoreResult<Aggregate> {
        self.inner.aggregate_invoices(company_id, query)
    }
}
