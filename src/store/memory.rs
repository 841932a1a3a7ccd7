use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Aggregate, InvoiceQuery, Store, StoreError, StoreResult};
use crate::model::{Client, Company, Invoice, Route};

/// Every record the store holds, in insertion order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(data: Dataset) -> Self {
        Self { data }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }
}

impl Store for MemoryStore {
    fn company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.data.companies.iter().find(|c| c.id == id).cloned())
    }

    fn insert_company(&mut self, company: Company) -> StoreResult<()> {
        if self.data.companies.iter().any(|c| c.id == company.id) {
            return Err(StoreError::Duplicate(format!(
                "company {} already exists",
                company.id
            )));
        }
        self.data.companies.push(company);
        Ok(())
    }

    fn client(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Client>> {
        Ok(self
            .data
            .clients
            .iter()
            .find(|c| c.company_id == company_id && c.id == id)
            .cloned())
    }

    fn clients(&self, company_id: Uuid, active_only: bool) -> StoreResult<Vec<Client>> {
        Ok(self
            .data
            .clients
            .iter()
            .filter(|c| c.company_id == company_id && (c.active || !active_only))
            .cloned()
            .collect())
    }

    fn insert_client(&mut self, client: Client) -> StoreResult<()> {
        let taken = self.data.clients.iter().any(|c| {
            c.company_id == client.company_id && c.active && c.name == client.name
        });
        if taken {
            return Err(StoreError::Duplicate(format!(
                "client '{}' already exists",
                client.name
            )));
        }
        self.data.clients.push(client);
        Ok(())
    }

    fn update_client(&mut self, client: &Client) -> StoreResult<bool> {
        match self
            .data
            .clients
            .iter_mut()
            .find(|c| c.company_id == client.company_id && c.id == client.id)
        {
            Some(slot) => {
                *slot = client.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn route(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Route>> {
        Ok(self
            .data
            .routes
            .iter()
            .find(|r| r.company_id == company_id && r.id == id)
            .cloned())
    }

    fn routes(
        &self,
        company_id: Uuid,
        client_id: Option<Uuid>,
        active_only: bool,
    ) -> StoreResult<Vec<Route>> {
        Ok(self
            .data
            .routes
            .iter()
            .filter(|r| r.company_id == company_id)
            .filter(|r| client_id.map_or(true, |id| r.client_id == id))
            .filter(|r| r.active || !active_only)
            .cloned()
            .collect())
    }

    fn insert_route(&mut self, route: Route) -> StoreResult<()> {
        let taken = self.data.routes.iter().any(|r| {
            r.company_id == route.company_id
                && r.client_id == route.client_id
                && r.active
                && r.name == route.name
        });
        if taken {
            return Err(StoreError::Duplicate(format!(
                "route '{}' already exists for this client",
                route.name
            )));
        }
        self.data.routes.push(route);
        Ok(())
    }

    fn update_route(&mut self, route: &Route) -> StoreResult<bool> {
        match self
            .data
            .routes
            .iter_mut()
            .find(|r| r.company_id == route.company_id && r.id == route.id)
        {
            Some(slot) => {
                *slot = route.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn invoice(&self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Invoice>> {
        Ok(self
            .data
            .invoices
            .iter()
            .find(|i| i.company_id == company_id && i.id == id)
            .cloned())
    }

    fn invoices(&self, company_id: Uuid, query: &InvoiceQuery) -> StoreResult<Vec<Invoice>> {
        let hits = self
            .data
            .invoices
            .iter()
            .filter(|i| i.company_id == company_id && query.matches(i))
            .cloned()
            .collect();
        Ok(query.arrange(hits))
    }

    fn insert_invoice(&mut self, invoice: Invoice) -> StoreResult<()> {
        let taken = self.data.invoices.iter().any(|i| {
            i.company_id == invoice.company_id && i.invoice_number == invoice.invoice_number
        });
        if taken {
            return Err(StoreError::Duplicate(format!(
                "invoice number '{}' is already in use",
                invoice.invoice_number
            )));
        }
        self.data.invoices.push(invoice);
        Ok(())
    }

    fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<bool> {
        match self
            .data
            .invoices
            .iter_mut()
            .find(|i| i.company_id == invoice.company_id && i.id == invoice.id)
        {
            Some(slot) => {
                *slot = invoice.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_invoice(&mut self, company_id: Uuid, id: Uuid) -> StoreResult<Option<Invoice>> {
        let position = self
            .data
            .invoices
            .iter()
            .position(|i| i.company_id == company_id && i.id == id);
        Ok(position.map(|idx| self.data.invoices.remove(idx)))
    }

    fn aggregate_invoices(&self, company_id: Uuid, query: &InvoiceQuery) -> StoreResult<Aggregate> {
        self.data
            .invoices
            .iter()
            .filter(|i| i.company_id == company_id && query.matches(i))
            .try_fold(Aggregate::default(), |acc, i| -> StoreResult<Aggregate> {
                Ok(Aggregate {
                    total: acc.total.checked_add(i.amount).ok_or(StoreError::Overflow)?,
                    count: acc.count + 1,
                })
            })
    }
}
