//! Clients and their rate presets (routes).
//!
//! Neither is ever physically removed: deactivation hides them from pickers
//! while invoices that reference them keep their meaning.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::InvoiceSettings;
use crate::error::{BillingError, Result, ValidationError};
use crate::invoice::require_company;
use crate::model::{Client, PriceEntry, Route};
use crate::money::Money;
use crate::session::Session;
use crate::store::Store;

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub address: String,
    pub emails: Vec<String>,
    pub payment_terms_days: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct NewRoute {
    pub client_id: Uuid,
    pub name: String,
    pub description_template: Option<String>,
    pub pickup_city: Option<String>,
    pub delivery_city: Option<String>,
    pub base_amount: Money,
    /// Defaults to today in the company's timezone.
    pub effective_from: Option<NaiveDate>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn company_today<S: Store + ?Sized>(store: &S, session: &Session) -> Result<NaiveDate> {
    let tz = require_company(store, session)?.tz()?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

pub fn create_client<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    settings: &InvoiceSettings,
    input: NewClient,
) -> Result<Client> {
    require_company(&*store, session)?;

    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::MissingName.into());
    }

    let client = Client {
        id: Uuid::new_v4(),
        company_id: session.company_id,
        name,
        address: input.address.trim().to_string(),
        emails: input
            .emails
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        payment_terms_days: input
            .payment_terms_days
            .unwrap_or(settings.default_terms_days),
        active: true,
    };
    store.insert_client(client.clone())?;

    tracing::info!(company = %session.company_id, client = %client.name, "created client");
    Ok(client)
}

/// Active clients, by name.
pub fn list_clients<S: Store + ?Sized>(store: &S, session: &Session) -> Result<Vec<Client>> {
    let mut clients = store.clients(session.company_id, true)?;
    clients.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(clients)
}

/// Finds an active client by id or, failing that, by case-insensitive name.
pub fn resolve_client<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    reference: &str,
) -> Result<Client> {
    if let Ok(id) = reference.parse::<Uuid>() {
        if let Some(client) = store.client(session.company_id, id)?.filter(|c| c.active) {
            return Ok(client);
        }
    }
    store
        .clients(session.company_id, true)?
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(reference.trim()))
        .ok_or_else(|| BillingError::not_found("Client", reference))
}

pub fn deactivate_client<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    id: Uuid,
) -> Result<Client> {
    let mut client = store
        .client(session.company_id, id)?
        .filter(|c| c.active)
        .ok_or_else(|| BillingError::not_found("Client", id))?;
    client.active = false;
    if !store.update_client(&client)? {
        return Err(BillingError::not_found("Client", id));
    }

    tracing::info!(company = %session.company_id, client = %client.name, "deactivated client");
    Ok(client)
}

fn validate_price(entry: &PriceEntry) -> Result<()> {
    if !entry.amount.is_positive() {
        return Err(ValidationError::NonPositiveAmount(entry.amount.cents()).into());
    }
    if let Some(to) = entry.effective_to {
        if to < entry.effective_from {
            return Err(ValidationError::InvertedPriceWindow {
                from: entry.effective_from,
                to,
            }
            .into());
        }
    }
    Ok(())
}

pub fn create_route<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    input: NewRoute,
) -> Result<Route> {
    let today = company_today(&*store, session)?;

    let client = store
        .client(session.company_id, input.client_id)?
        .filter(|c| c.active)
        .ok_or_else(|| ValidationError::UnknownClient(input.client_id.to_string()))?;

    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::MissingName.into());
    }

    let price = PriceEntry::new(input.base_amount, input.effective_from.unwrap_or(today));
    validate_price(&price)?;

    let route = Route {
        id: Uuid::new_v4(),
        company_id: session.company_id,
        client_id: client.id,
        name,
        description_template: clean(input.description_template),
        pickup_city: clean(input.pickup_city),
        delivery_city: clean(input.delivery_city),
        active: true,
        prices: vec![price],
    };
    store.insert_route(route.clone())?;

    tracing::info!(
        company = %session.company_id,
        client = %client.name,
        route = %route.name,
        "created route"
    );
    Ok(route)
}

/// Active routes of one client, by name.
pub fn list_routes<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    client_id: Uuid,
) -> Result<Vec<Route>> {
    let mut routes = store.routes(session.company_id, Some(client_id), true)?;
    routes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(routes)
}

/// Finds an active route by id, or by case-insensitive name within a client.
pub fn resolve_route<S: Store + ?Sized>(
    store: &S,
    session: &Session,
    client_id: Option<Uuid>,
    reference: &str,
) -> Result<Route> {
    if let Ok(id) = reference.parse::<Uuid>() {
        if let Some(route) = store.route(session.company_id, id)?.filter(|r| r.active) {
            return Ok(route);
        }
    }
    let mut matches: Vec<Route> = store
        .routes(session.company_id, client_id, true)?
        .into_iter()
        .filter(|r| r.name.eq_ignore_ascii_case(reference.trim()))
        .collect();
    // Without a client, a name shared by several clients' routes is ambiguous.
    if matches.len() == 1 {
        Ok(matches.remove(0))
    } else {
        Err(BillingError::not_found("Route", reference))
    }
}

/// Appends a dated rate to the route's history. Earlier entries are kept.
pub fn add_route_price<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    route_id: Uuid,
    entry: PriceEntry,
) -> Result<Route> {
    let mut route = store
        .route(session.company_id, route_id)?
        .ok_or_else(|| BillingError::not_found("Route", route_id))?;

    validate_price(&entry)?;
    if route
        .prices
        .iter()
        .any(|p| p.effective_from == entry.effective_from)
    {
        return Err(ValidationError::DuplicatePriceStart(entry.effective_from).into());
    }

    route.prices.push(entry);
    if !store.update_route(&route)? {
        return Err(BillingError::not_found("Route", route_id));
    }

    tracing::info!(company = %session.company_id, route = %route.name, "added route price");
    Ok(route)
}

pub fn deactivate_route<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    id: Uuid,
) -> Result<Route> {
    let mut route = store
        .route(session.company_id, id)?
        .filter(|r| r.active)
        .ok_or_else(|| BillingError::not_found("Route", id))?;
    route.active = false;
    if !store.update_route(&route)? {
        return Err(BillingError::not_found("Route", id));
    }

    tracing::info!(company = %session.company_id, route = %route.name, "deactivated route");
    Ok(route)
}

/// A preset file: clients with their routes, amounts in cents.
#[derive(Debug, Default, Deserialize)]
pub struct PresetFile {
    #[serde(default)]
    pub clients: Vec<PresetClient>,
}

#[derive(Debug, Deserialize)]
pub struct PresetClient {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub payment_terms_days: Option<u32>,
    #[serde(default)]
    pub routes: Vec<PresetRoute>,
}

#[derive(Debug, Deserialize)]
pub struct PresetRoute {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pickup_city: Option<String>,
    #[serde(default)]
    pub delivery_city: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub clients_created: usize,
    pub clients_reused: usize,
    pub routes_created: usize,
    pub routes_skipped: usize,
}

/// Loads clients and routes, reusing clients that already exist by name and
/// skipping routes that exist or have no price.
pub fn import_presets<S: Store + ?Sized>(
    store: &mut S,
    session: &Session,
    settings: &InvoiceSettings,
    presets: PresetFile,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for preset in presets.clients {
        let existing = store
            .clients(session.company_id, true)?
            .into_iter()
            .find(|c| c.name == preset.name.trim());
        let client = match existing {
            Some(client) => {
                summary.clients_reused += 1;
                client
            }
            None => {
                summary.clients_created += 1;
                create_client(
                    store,
                    session,
                    settings,
                    NewClient {
                        name: preset.name,
                        address: preset.address,
                        emails: preset.emails,
                        payment_terms_days: preset.payment_terms_days,
                    },
                )?
            }
        };

        let mut known: Vec<String> = store
            .routes(session.company_id, Some(client.id), true)?
            .into_iter()
            .map(|r| r.name)
            .collect();

        for route in preset.routes {
            if known.iter().any(|n| n == route.name.trim()) {
                summary.routes_skipped += 1;
                continue;
            }
            let Some(price) = route.price else {
                tracing::warn!(client = %client.name, route = %route.name, "preset route has no price, skipped");
                summary.routes_skipped += 1;
                continue;
            };
            let name = route.name.trim().to_string();
            create_route(
                store,
                session,
                NewRoute {
                    client_id: client.id,
                    name: name.clone(),
                    description_template: route.description,
                    pickup_city: route.pickup_city,
                    delivery_city: route.delivery_city,
                    base_amount: price,
                    effective_from: route.effective_from,
                },
            )?;
            known.push(name);
            summary.routes_created += 1;
        }
    }

    Ok(summary)
}
