use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use haulbill::catalog::{self, NewClient, NewRoute, PresetFile};
use haulbill::config::{config_dir, init_config_dir, load_config, open_store, Config};
use haulbill::invoice::{
    self, parse_date, resolve_effective_price, InvoiceLines, LineItemInput, MarkPaid, NewInvoice,
};
use haulbill::model::DEFAULT_TIMEZONE;
use haulbill::store::{FileStore, InvoiceQuery, Store};
use haulbill::{
    BillingError, Company, Invoice, InvoiceStatus, Money, Result, Role, Session, ValidationError,
};

#[derive(Parser)]
#[command(name = "haulbill")]
#[command(version, about = "Invoicing for trucking and logistics outfits", long_about = None)]
struct Cli {
    /// Path to config directory (default: XDG config dir or ~/.haulbill)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory, company and ledger
    Init {
        /// Company name printed on invoices
        #[arg(long, default_value = "My Trucking Co")]
        company: String,

        /// IANA timezone used for "today" and year boundaries
        #[arg(long, default_value = DEFAULT_TIMEZONE)]
        timezone: String,
    },

    /// Show company, ledger and counts
    Status,

    /// Manage billing clients
    Client {
        #[command(subcommand)]
        command: ClientCommand,
    },

    /// Manage rate presets (routes)
    Route {
        #[command(subcommand)]
        command: RouteCommand,
    },

    /// Load clients and routes from a preset TOML file
    Import {
        /// Preset file (see presets.example.toml in the config directory)
        file: PathBuf,
    },

    /// Create an invoice
    Create {
        /// Client name or id
        #[arg(short, long)]
        client: String,

        /// Route name or id; supplies price and description when not given
        #[arg(short, long)]
        route: Option<String>,

        /// Invoice date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Load / reference number
        #[arg(long)]
        load_ref: Option<String>,

        /// Invoice number (default: generated)
        #[arg(long)]
        number: Option<String>,

        /// Description (overrides the route's)
        #[arg(short, long)]
        description: Option<String>,

        /// Amount in dollars (overrides the route price)
        #[arg(short, long)]
        amount: Option<String>,

        /// Line items as "description=amount"; the first is the primary line (repeatable)
        #[arg(short, long, value_name = "DESC=AMOUNT", conflicts_with_all = ["description", "amount"])]
        item: Vec<String>,

        /// Save as draft instead of outstanding
        #[arg(long)]
        draft: bool,
    },

    /// Show one invoice
    Show {
        /// Invoice number or id
        invoice: String,
    },

    /// List outstanding invoices, oldest first
    Outstanding,

    /// Record payment of an invoice
    MarkPaid {
        /// Invoice number or id
        invoice: String,

        /// Paid date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,

        /// Payment method, e.g. ACH or check
        #[arg(long)]
        method: Option<String>,

        /// Payment reference, e.g. check number
        #[arg(long)]
        reference: Option<String>,

        /// Only apply if the invoice is still at this version
        #[arg(long)]
        if_version: Option<u64>,
    },

    /// Return a paid invoice to outstanding
    Reopen {
        /// Invoice number or id
        invoice: String,

        /// Only apply if the invoice is still at this version
        #[arg(long)]
        if_version: Option<u64>,
    },

    /// Permanently delete an invoice
    Delete {
        /// Invoice number or id
        invoice: String,
    },

    /// Search invoices by number, load reference or description
    Search {
        /// Text to look for (default: list everything)
        query: Option<String>,
    },

    /// Outstanding backlog and year-to-date income
    Kpis,
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Add a client
    Add {
        #[arg(short, long)]
        name: String,

        /// Billing address; use \n for line breaks
        #[arg(long, default_value = "")]
        address: String,

        /// Notification email (repeatable)
        #[arg(long)]
        email: Vec<String>,

        /// Payment terms in days (default from config)
        #[arg(long)]
        terms: Option<u32>,
    },

    /// List active clients
    List,

    /// Deactivate a client
    Remove {
        /// Client name or id
        client: String,
    },
}

#[derive(Subcommand)]
enum RouteCommand {
    /// Add a route with its first price
    Add {
        /// Client name or id
        #[arg(short, long)]
        client: String,

        #[arg(short, long)]
        name: String,

        /// Price in dollars
        #[arg(short, long)]
        amount: String,

        /// First day the price applies (default: today)
        #[arg(long)]
        from: Option<String>,

        /// Invoice description used with this route
        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        pickup: Option<String>,

        #[arg(long)]
        delivery: Option<String>,
    },

    /// List a client's active routes
    List {
        /// Client name or id
        #[arg(short, long)]
        client: String,
    },

    /// Add a new price to a route's history
    Price {
        /// Route name or id
        route: String,

        /// Client name or id, to disambiguate route names
        #[arg(short, long)]
        client: Option<String>,

        /// Price in dollars
        #[arg(short, long)]
        amount: String,

        /// First day the price applies (default: today)
        #[arg(long)]
        from: Option<String>,

        /// Last day the price applies
        #[arg(long)]
        to: Option<String>,
    },

    /// Deactivate a route
    Remove {
        /// Route name or id
        route: String,

        /// Client name or id, to disambiguate route names
        #[arg(short, long)]
        client: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("HAULBILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if let Commands::Init { company, timezone } = &cli.command {
        return cmd_init(&cfg_dir, company, timezone);
    }

    let mut ctx = Context::open(&cfg_dir)?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Status => cmd_status(&ctx),
        Commands::Client { command } => match command {
            ClientCommand::Add {
                name,
                address,
                email,
                terms,
            } => cmd_client_add(&mut ctx, name, address, email, terms),
            ClientCommand::List => cmd_client_list(&ctx),
            ClientCommand::Remove { client } => cmd_client_remove(&mut ctx, &client),
        },
        Commands::Route { command } => match command {
            RouteCommand::Add {
                client,
                name,
                amount,
                from,
                description,
                pickup,
                delivery,
            } => cmd_route_add(
                &mut ctx,
                &client,
                NewRouteArgs {
                    name,
                    amount,
                    from,
                    description,
                    pickup,
                    delivery,
                },
            ),
            RouteCommand::List { client } => cmd_route_list(&ctx, &client),
            RouteCommand::Price {
                route,
                client,
                amount,
                from,
                to,
            } => cmd_route_price(&mut ctx, &route, client.as_deref(), &amount, from, to),
            RouteCommand::Remove { route, client } => {
                cmd_route_remove(&mut ctx, &route, client.as_deref())
            }
        },
        Commands::Import { file } => cmd_import(&mut ctx, &file),
        Commands::Create {
            client,
            route,
            date,
            load_ref,
            number,
            description,
            amount,
            item,
            draft,
        } => cmd_create(
            &mut ctx,
            CreateArgs {
                client,
                route,
                date,
                load_ref,
                number,
                description,
                amount,
                items: item,
                draft,
            },
        ),
        Commands::Show { invoice } => cmd_show(&ctx, &invoice),
        Commands::Outstanding => cmd_outstanding(&ctx),
        Commands::MarkPaid {
            invoice,
            date,
            method,
            reference,
            if_version,
        } => cmd_mark_paid(&mut ctx, &invoice, date, method, reference, if_version),
        Commands::Reopen {
            invoice,
            if_version,
        } => cmd_reopen(&mut ctx, &invoice, if_version),
        Commands::Delete { invoice } => cmd_delete(&mut ctx, &invoice),
        Commands::Search { query } => cmd_search(&ctx, query.as_deref().unwrap_or("")),
        Commands::Kpis => cmd_kpis(&ctx),
    }
}

/// Everything a command needs: config, the caller's session and the ledger.
struct Context {
    dir: PathBuf,
    config: Config,
    session: Session,
    store: FileStore,
}

impl Context {
    fn open(cfg_dir: &Path) -> Result<Self> {
        let config = load_config(cfg_dir)?;
        let session = Session::from_identity(&config.session)?;
        let store = open_store(cfg_dir, &config)?;
        Ok(Self {
            dir: cfg_dir.to_path_buf(),
            config,
            session,
            store,
        })
    }

    fn company(&self) -> Result<Company> {
        self.store
            .company(self.session.company_id)?
            .ok_or_else(|| BillingError::not_found("Company", self.session.company_id))
    }

    fn today(&self) -> Result<NaiveDate> {
        let tz = self.company()?.tz()?;
        Ok(Utc::now().with_timezone(&tz).date_naive())
    }

    fn date_or_today(&self, field: &'static str, value: Option<String>) -> Result<NaiveDate> {
        match value {
            Some(v) => Ok(parse_date(field, &v)?),
            None => self.today(),
        }
    }

    /// Invoice by id or number, within the session's company.
    fn invoice(&self, reference: &str) -> Result<Invoice> {
        match reference.parse::<Uuid>() {
            Ok(id) => invoice::get_invoice(&self.store, &self.session, id),
            Err(_) => invoice::find_by_number(&self.store, &self.session, reference),
        }
    }

    fn client_names(&self) -> Result<HashMap<Uuid, String>> {
        Ok(self
            .store
            .clients(self.session.company_id, false)?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }
}

fn parse_money(value: &str) -> Result<Money> {
    Ok(value.parse::<Money>()?)
}

/// Parse "description=amount"; the amount may be left empty.
fn parse_line_item(input: &str) -> Result<LineItemInput> {
    let (description, amount) = input
        .rsplit_once('=')
        .ok_or_else(|| ValidationError::InvalidLineItemFormat(input.to_string()))?;
    let amount = match amount.trim() {
        "" => None,
        a => Some(parse_money(a)?),
    };
    Ok(LineItemInput {
        description: Some(description.to_string()),
        amount,
    })
}

/// Initialize config directory, company record and ledger
fn cmd_init(cfg_dir: &Path, company_name: &str, timezone: &str) -> Result<()> {
    if cfg_dir.exists() {
        return Err(BillingError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    let company = Company::new(company_name, timezone)?;

    let mut config = Config::default();
    config.session.company_id = Some(company.id);
    config.session.user_id = Some(Uuid::new_v4());
    config.session.role = Role::Admin;

    init_config_dir(cfg_dir, &config, company.clone())?;

    println!("Initialized haulbill config at: {}", cfg_dir.display());
    println!("  Company:  {} ({})", company.name, company.timezone);
    println!();
    println!("Next steps:");
    println!("  1. Add a client:   haulbill client add --name \"Acme\" --terms 30");
    println!("  2. Add a route:    haulbill route add --client \"Acme\" --name \"SSF to SF\" --amount 1000");
    println!(
        "     or import:     haulbill import {}/presets.example.toml",
        cfg_dir.display()
    );
    println!("  3. Invoice a load: haulbill create --client \"Acme\" --route \"SSF to SF\" --load-ref L123");

    Ok(())
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let company = ctx.company()?;
    let clients = ctx.store.clients(ctx.session.company_id, true)?;
    let routes = ctx.store.routes(ctx.session.company_id, None, true)?;
    let invoices = ctx
        .store
        .invoices(ctx.session.company_id, &InvoiceQuery::default())?;
    let count = |status: InvoiceStatus| invoices.iter().filter(|i| i.status == status).count();

    println!("haulbill status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", ctx.dir.display());
    println!("Ledger:           {}", ctx.store.path().display());
    println!("Company:          {} ({})", company.name, company.timezone);
    println!("Role:             {}", ctx.session.role);
    println!("Clients:          {}", clients.len());
    println!("Routes:           {}", routes.len());
    println!(
        "Invoices:         {} ({} outstanding, {} paid, {} draft)",
        invoices.len(),
        count(InvoiceStatus::Outstanding),
        count(InvoiceStatus::Paid),
        count(InvoiceStatus::Draft)
    );

    Ok(())
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TERMS")]
    terms: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "RATE TODAY")]
    rate: String,
    #[tabled(rename = "LANE")]
    lane: String,
    #[tabled(rename = "PRICES")]
    prices: usize,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "LOAD")]
    load: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "STATUS")]
    status: String,
}

fn invoice_table(ctx: &Context, invoices: &[Invoice]) -> Result<String> {
    let names = ctx.client_names()?;
    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|i| InvoiceRow {
            number: i.invoice_number.clone(),
            date: i.invoice_date.to_string(),
            due: i.due_date.to_string(),
            client: names.get(&i.client_id).cloned().unwrap_or_default(),
            load: i.load_ref.clone().unwrap_or_default(),
            amount: i.amount.to_string(),
            status: i.status.to_string().to_uppercase(),
        })
        .collect();
    Ok(Table::new(rows).with(Style::rounded()).to_string())
}

fn cmd_client_add(
    ctx: &mut Context,
    name: String,
    address: String,
    emails: Vec<String>,
    terms: Option<u32>,
) -> Result<()> {
    let client = catalog::create_client(
        &mut ctx.store,
        &ctx.session,
        &ctx.config.invoice,
        NewClient {
            name,
            address: address.replace("\\n", "\n"),
            emails,
            payment_terms_days: terms,
        },
    )?;

    println!("Added client {}", client.name);
    println!("  Terms: Net {} days", client.payment_terms_days);
    println!("  Id:    {}", client.id);
    Ok(())
}

fn cmd_client_list(ctx: &Context) -> Result<()> {
    let clients = catalog::list_clients(&ctx.store, &ctx.session)?;

    if clients.is_empty() {
        println!("No clients yet.");
        println!("Add one with: haulbill client add --name <name>");
        return Ok(());
    }

    let rows: Vec<ClientRow> = clients
        .iter()
        .map(|c| ClientRow {
            name: c.name.clone(),
            terms: format!("Net {}", c.payment_terms_days),
            email: c.emails.join(", "),
            id: c.id.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn cmd_client_remove(ctx: &mut Context, reference: &str) -> Result<()> {
    let client = catalog::resolve_client(&ctx.store, &ctx.session, reference)?;
    let client = catalog::deactivate_client(&mut ctx.store, &ctx.session, client.id)?;
    println!("Deactivated client {}", client.name);
    Ok(())
}

struct NewRouteArgs {
    name: String,
    amount: String,
    from: Option<String>,
    description: Option<String>,
    pickup: Option<String>,
    delivery: Option<String>,
}

fn cmd_route_add(ctx: &mut Context, client_ref: &str, args: NewRouteArgs) -> Result<()> {
    let client = catalog::resolve_client(&ctx.store, &ctx.session, client_ref)?;
    let base_amount = parse_money(&args.amount)?;
    let effective_from = args
        .from
        .map(|f| parse_date("--from", &f))
        .transpose()?;

    let route = catalog::create_route(
        &mut ctx.store,
        &ctx.session,
        NewRoute {
            client_id: client.id,
            name: args.name,
            description_template: args.description,
            pickup_city: args.pickup,
            delivery_city: args.delivery,
            base_amount,
            effective_from,
        },
    )?;

    println!("Added route {} for {}", route.name, client.name);
    println!("  Rate: {} from {}", base_amount, route.prices[0].effective_from);
    println!("  Id:   {}", route.id);
    Ok(())
}

fn cmd_route_list(ctx: &Context, client_ref: &str) -> Result<()> {
    let client = catalog::resolve_client(&ctx.store, &ctx.session, client_ref)?;
    let routes = catalog::list_routes(&ctx.store, &ctx.session, client.id)?;

    if routes.is_empty() {
        println!("No routes for {}.", client.name);
        return Ok(());
    }

    let today = ctx.today()?;
    let rows: Vec<RouteRow> = routes
        .iter()
        .map(|r| RouteRow {
            name: r.name.clone(),
            rate: resolve_effective_price(&r.prices, today)
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            lane: match (&r.pickup_city, &r.delivery_city) {
                (Some(p), Some(d)) => format!("{p} -> {d}"),
                (Some(p), None) => p.clone(),
                (None, Some(d)) => d.clone(),
                (None, None) => String::new(),
            },
            prices: r.prices.len(),
            id: r.id.to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn client_id_for(ctx: &Context, client_ref: Option<&str>) -> Result<Option<Uuid>> {
    client_ref
        .map(|c| catalog::resolve_client(&ctx.store, &ctx.session, c).map(|c| c.id))
        .transpose()
}

fn cmd_route_price(
    ctx: &mut Context,
    route_ref: &str,
    client_ref: Option<&str>,
    amount: &str,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let client_id = client_id_for(ctx, client_ref)?;
    let route = catalog::resolve_route(&ctx.store, &ctx.session, client_id, route_ref)?;

    let mut entry = haulbill::PriceEntry::new(
        parse_money(amount)?,
        ctx.date_or_today("--from", from)?,
    );
    if let Some(to) = to {
        entry = entry.until(parse_date("--to", &to)?);
    }

    let route = catalog::add_route_price(&mut ctx.store, &ctx.session, route.id, entry.clone())?;
    println!(
        "Route {} now {} from {}",
        route.name, entry.amount, entry.effective_from
    );
    Ok(())
}

fn cmd_route_remove(ctx: &mut Context, route_ref: &str, client_ref: Option<&str>) -> Result<()> {
    let client_id = client_id_for(ctx, client_ref)?;
    let route = catalog::resolve_route(&ctx.store, &ctx.session, client_id, route_ref)?;
    let route = catalog::deactivate_route(&mut ctx.store, &ctx.session, route.id)?;
    println!("Deactivated route {}", route.name);
    Ok(())
}

fn cmd_import(ctx: &mut Context, file: &Path) -> Result<()> {
    if !file.exists() {
        return Err(BillingError::ConfigFileNotFound(file.to_path_buf()));
    }
    let content = fs::read_to_string(file)?;
    let presets: PresetFile = toml::from_str(&content).map_err(|e| BillingError::ConfigParse {
        path: file.to_path_buf(),
        source: e,
    })?;

    let summary =
        catalog::import_presets(&mut ctx.store, &ctx.session, &ctx.config.invoice, presets)?;

    println!("Imported {}", file.display());
    println!(
        "  Clients: {} new, {} existing",
        summary.clients_created, summary.clients_reused
    );
    println!(
        "  Routes:  {} new, {} skipped",
        summary.routes_created, summary.routes_skipped
    );
    Ok(())
}

struct CreateArgs {
    client: String,
    route: Option<String>,
    date: Option<String>,
    load_ref: Option<String>,
    number: Option<String>,
    description: Option<String>,
    amount: Option<String>,
    items: Vec<String>,
    draft: bool,
}

fn cmd_create(ctx: &mut Context, args: CreateArgs) -> Result<()> {
    let client = catalog::resolve_client(&ctx.store, &ctx.session, &args.client)?;
    let route = args
        .route
        .as_deref()
        .map(|r| catalog::resolve_route(&ctx.store, &ctx.session, Some(client.id), r))
        .transpose()?;
    let invoice_date = ctx.date_or_today("--date", args.date)?;

    let lines = if !args.items.is_empty() {
        InvoiceLines::LineItems(
            args.items
                .iter()
                .map(|i| parse_line_item(i))
                .collect::<Result<Vec<_>>>()?,
        )
    } else if args.description.is_some() || args.amount.is_some() {
        InvoiceLines::Explicit {
            description: args.description,
            amount: args.amount.as_deref().map(parse_money).transpose()?,
        }
    } else {
        InvoiceLines::RouteDerived
    };

    let input = NewInvoice {
        client_id: client.id,
        route_id: route.as_ref().map(|r| r.id),
        invoice_date,
        load_ref: args.load_ref,
        invoice_number: args.number,
        draft: args.draft,
        lines,
    };
    let invoice = invoice::create_invoice(
        &mut ctx.store,
        &ctx.session,
        &ctx.config.invoice,
        input,
    )?;

    println!("Created {}", invoice.invoice_number);
    println!("  Client: {}", client.name);
    println!("  Total:  {}", invoice.amount);
    println!("  Due:    {}", invoice.due_date);
    println!("  Status: {}", invoice.status);
    Ok(())
}

fn cmd_show(ctx: &Context, reference: &str) -> Result<()> {
    let inv = ctx.invoice(reference)?;
    let names = ctx.client_names()?;

    println!("Invoice {}", inv.invoice_number);
    println!("{}", "-".repeat(50));
    println!(
        "Client:      {}",
        names.get(&inv.client_id).map(String::as_str).unwrap_or("?")
    );
    if let Some(load) = &inv.load_ref {
        println!("Load:        {load}");
    }
    println!("Date:        {}", inv.invoice_date);
    println!("Due:         {}", inv.due_date);
    println!("Status:      {} (version {})", inv.status, inv.version);
    if let Some(p) = &inv.payment {
        println!("Paid:        {}", p.paid_date);
        if let Some(m) = &p.method {
            println!("Method:      {m}");
        }
        if let Some(r) = &p.reference {
            println!("Reference:   {r}");
        }
    }
    println!("Description: {}", inv.description);
    for line in &inv.line_items {
        println!(
            "  {} {:<40} {:>14}",
            if line.primary { "*" } else { " " },
            line.description,
            line.amount.to_string()
        );
    }
    println!("Total:       {}", inv.amount);
    Ok(())
}

fn cmd_outstanding(ctx: &Context) -> Result<()> {
    let invoices = invoice::list_outstanding(&ctx.store, &ctx.session)?;

    if invoices.is_empty() {
        println!("No outstanding invoices.");
        return Ok(());
    }

    println!("{}", invoice_table(ctx, &invoices)?);
    let total = Money::checked_sum(invoices.iter().map(|i| i.amount))
        .ok_or(ValidationError::AmountTooLarge)?;
    println!();
    println!("Outstanding: {} across {} invoice(s)", total, invoices.len());
    Ok(())
}

fn cmd_mark_paid(
    ctx: &mut Context,
    reference: &str,
    date: Option<String>,
    method: Option<String>,
    payment_ref: Option<String>,
    if_version: Option<u64>,
) -> Result<()> {
    let target = ctx.invoice(reference)?;
    let paid_date = ctx.date_or_today("--date", date)?;

    let inv = invoice::mark_paid(
        &mut ctx.store,
        &ctx.session,
        target.id,
        MarkPaid {
            paid_date,
            method,
            reference: payment_ref,
            expected_version: if_version,
        },
    )?;

    println!("Marked {} as paid on {}", inv.invoice_number, paid_date);
    Ok(())
}

fn cmd_reopen(ctx: &mut Context, reference: &str, if_version: Option<u64>) -> Result<()> {
    let target = ctx.invoice(reference)?;
    let inv = invoice::reopen(&mut ctx.store, &ctx.session, target.id, if_version)?;
    println!("Reopened {} ({})", inv.invoice_number, inv.status);
    Ok(())
}

fn cmd_delete(ctx: &mut Context, reference: &str) -> Result<()> {
    let target = ctx.invoice(reference)?;
    let removed = invoice::delete_invoice(&mut ctx.store, &ctx.session, target.id)?;
    println!("Deleted {}", removed.invoice_number);
    Ok(())
}

fn cmd_search(ctx: &Context, query: &str) -> Result<()> {
    let invoices = invoice::search_invoices(&ctx.store, &ctx.session, query)?;

    if invoices.is_empty() {
        println!("No invoices match '{query}'.");
        return Ok(());
    }

    println!("{}", invoice_table(ctx, &invoices)?);
    println!();
    println!("{} result(s)", invoices.len());
    Ok(())
}

fn cmd_kpis(ctx: &Context) -> Result<()> {
    let now = Utc::now();
    let kpis = invoice::compute_kpis(&ctx.store, &ctx.session, now)?;
    let year = now.with_timezone(&ctx.company()?.tz()?).year();

    println!("Outstanding:     {}", kpis.outstanding_total);
    println!("Open invoices:   {}", kpis.outstanding_count);
    println!("Income {year} YTD: {}", kpis.ytd_income);
    Ok(())
}
