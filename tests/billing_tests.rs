use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use haulbill::catalog::{self, NewClient, NewRoute, PresetFile};
use haulbill::invoice::{
    self, compute_kpis, create_invoice, delete_invoice, get_invoice, mark_paid, reopen,
    search_invoices, InvoiceLines, LineItemInput, MarkPaid, NewInvoice, SEARCH_LIMIT,
};
use haulbill::store::Store;
use haulbill::{
    BillingError, Client, Company, FileStore, InvoiceSettings, InvoiceStatus, MemoryStore, Money,
    PriceEntry, Route, Session, ValidationError,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn cents(c: i64) -> Money {
    Money::from_cents(c)
}

struct Fixture {
    store: MemoryStore,
    session: Session,
    settings: InvoiceSettings,
    client: Client,
}

impl Fixture {
    fn new() -> Self {
        let mut store = MemoryStore::new();
        let session = new_company(&mut store, "Bayline Trucking");
        let settings = InvoiceSettings::default();
        let client = catalog::create_client(
            &mut store,
            &session,
            &settings,
            NewClient {
                name: "Auto Chlor Branch 310".to_string(),
                address: "971 25th St\nSan Francisco, CA 94107".to_string(),
                emails: vec!["ap@autochlor.example".to_string()],
                payment_terms_days: Some(30),
            },
        )
        .unwrap();

        Self {
            store,
            session,
            settings,
            client,
        }
    }

    fn route(&mut self, name: &str, amount: i64, from: NaiveDate) -> Route {
        catalog::create_route(
            &mut self.store,
            &self.session,
            NewRoute {
                client_id: self.client.id,
                name: name.to_string(),
                description_template: Some(format!("{name} linehaul")),
                pickup_city: Some("South San Francisco, CA".to_string()),
                delivery_city: Some("San Francisco, CA".to_string()),
                base_amount: cents(amount),
                effective_from: Some(from),
            },
        )
        .unwrap()
    }

    fn create(&mut self, input: NewInvoice) -> haulbill::Result<haulbill::Invoice> {
        create_invoice(&mut self.store, &self.session, &self.settings, input)
    }

    fn explicit(&mut self, number: &str, description: &str, amount: i64, on: NaiveDate) -> haulbill::Invoice {
        let input = NewInvoice::new(
            self.client.id,
            on,
            InvoiceLines::Explicit {
                description: Some(description.to_string()),
                amount: Some(cents(amount)),
            },
        )
        .number(number);
        self.create(input).unwrap()
    }
}

fn new_company(store: &mut MemoryStore, name: &str) -> Session {
    let company = Company::new(name, "America/Los_Angeles").unwrap();
    let session = Session::new(company.id).with_user(Uuid::new_v4());
    store.insert_company(company).unwrap();
    session
}

#[test]
fn route_price_follows_history() {
    let mut fx = Fixture::new();
    let route = fx.route("SSF to SF", 1000, date(2024, 1, 1));
    catalog::add_route_price(
        &mut fx.store,
        &fx.session,
        route.id,
        PriceEntry::new(cents(1200), date(2024, 6, 1)),
    )
    .unwrap();

    let july = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 7, 1), InvoiceLines::RouteDerived).route(route.id))
        .unwrap();
    assert_eq!(july.amount, cents(1200));
    assert_eq!(july.description, "SSF to SF linehaul");
    assert_eq!(july.route_id, Some(route.id));
    assert!(july.line_items.is_empty());

    let march = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::RouteDerived).route(route.id))
        .unwrap();
    assert_eq!(march.amount, cents(1000));
}

#[test]
fn no_price_in_force_is_rejected_not_zero() {
    let mut fx = Fixture::new();
    let route = fx.route("SSF to SF", 1000, date(2025, 1, 1));

    let err = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 12, 31), InvoiceLines::RouteDerived).route(route.id))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::MissingAmount(d)) if d == date(2024, 12, 31)
    ));

    let all = search_invoices(&fx.store, &fx.session, "").unwrap();
    assert!(all.is_empty());
}

#[test]
fn line_items_drive_total_and_description() {
    let mut fx = Fixture::new();
    let items = vec![
        LineItemInput::new("Linehaul", cents(150_000)),
        LineItemInput::new("", Money::ZERO),
        LineItemInput::new("Detention", cents(5_000)),
    ];

    let inv = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::LineItems(items)).number("UPL-202403-1001"))
        .unwrap();

    assert_eq!(inv.amount, cents(155_000));
    assert_eq!(inv.description, "Linehaul");
    assert_eq!(inv.line_items.len(), 2);
    assert!(inv.line_items[0].primary);
    let sum = Money::checked_sum(inv.line_items.iter().map(|l| l.amount));
    assert_eq!(sum, Some(inv.amount));
}

#[test]
fn line_items_without_amounts_fall_back_to_route_price() {
    let mut fx = Fixture::new();
    let route = fx.route("SSF to SF", 100_000, date(2024, 1, 1));
    let items = vec![LineItemInput {
        description: Some("Custom lane note".to_string()),
        amount: None,
    }];

    let inv = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::LineItems(items)).route(route.id))
        .unwrap();
    assert_eq!(inv.amount, cents(100_000));
    assert_eq!(inv.description, "Custom lane note");
    assert!(inv.line_items.is_empty());
}

#[test]
fn blank_line_items_without_route_are_rejected() {
    let mut fx = Fixture::new();
    let items = vec![
        LineItemInput {
            description: None,
            amount: Some(cents(5_000)),
        },
    ];
    let err = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::LineItems(items)))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::MissingDescription)
    ));
}

#[test]
fn explicit_amount_beats_route_price() {
    let mut fx = Fixture::new();
    let route = fx.route("SSF to SF", 100_000, date(2024, 1, 1));

    let inv = fx
        .create(
            NewInvoice::new(
                fx.client.id,
                date(2024, 3, 1),
                InvoiceLines::Explicit {
                    description: None,
                    amount: Some(cents(123_456)),
                },
            )
            .route(route.id)
            .load_ref("LD-88"),
        )
        .unwrap();
    assert_eq!(inv.amount, cents(123_456));
    assert_eq!(inv.description, "SSF to SF linehaul");
    assert_eq!(inv.load_ref.as_deref(), Some("LD-88"));
}

#[test]
fn non_positive_explicit_amount_without_fallback_is_rejected() {
    let mut fx = Fixture::new();
    let err = fx
        .create(NewInvoice::new(
            fx.client.id,
            date(2024, 3, 1),
            InvoiceLines::Explicit {
                description: Some("Linehaul".to_string()),
                amount: Some(Money::ZERO),
            },
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::NonPositiveAmount(0))
    ));
}

#[test]
fn due_date_is_fixed_at_creation() {
    let mut fx = Fixture::new();
    let inv = fx.explicit("UPL-202403-1001", "Linehaul", 50_000, date(2024, 3, 1));
    assert_eq!(inv.due_date, date(2024, 3, 31));

    let mut client = fx.client.clone();
    client.payment_terms_days = 45;
    assert!(fx.store.update_client(&client).unwrap());

    let reloaded = get_invoice(&fx.store, &fx.session, inv.id).unwrap();
    assert_eq!(reloaded.due_date, date(2024, 3, 31));
}

#[test]
fn generated_numbers_use_prefix_and_month() {
    let mut fx = Fixture::new();
    fx.settings.number_prefix = "BAY".to_string();
    let inv = fx
        .create(NewInvoice::new(
            fx.client.id,
            date(2024, 3, 1),
            InvoiceLines::Explicit {
                description: Some("Linehaul".to_string()),
                amount: Some(cents(100)),
            },
        ))
        .unwrap();

    let parts: Vec<&str> = inv.invoice_number.split('-').collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "BAY");
    assert_eq!(parts[1].len(), 6);
    assert_eq!(parts[2].len(), 4);
    assert_eq!(inv.status, InvoiceStatus::Outstanding);
    assert_eq!(inv.created_by, fx.session.user_id);
}

#[test]
fn duplicate_number_is_a_retryable_conflict() {
    let mut fx = Fixture::new();
    fx.explicit("UPL-202403-1001", "Linehaul", 50_000, date(2024, 3, 1));

    let err = fx
        .create(
            NewInvoice::new(
                fx.client.id,
                date(2024, 3, 2),
                InvoiceLines::Explicit {
                    description: Some("Second load".to_string()),
                    amount: Some(cents(10_000)),
                },
            )
            .number("UPL-202403-1001"),
        )
        .unwrap_err();
    assert!(matches!(err, BillingError::Conflict(_)));
    assert!(err.is_retryable());

    let all = search_invoices(&fx.store, &fx.session, "").unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].description, "Linehaul");
}

#[test]
fn paid_round_trip() {
    let mut fx = Fixture::new();
    let inv = fx.explicit("UPL-202403-1001", "Linehaul", 50_000, date(2024, 3, 1));
    assert_eq!(inv.version, 1);

    let paid = mark_paid(
        &mut fx.store,
        &fx.session,
        inv.id,
        MarkPaid {
            paid_date: date(2024, 4, 1),
            method: Some("ACH".to_string()),
            reference: Some("TRX-99".to_string()),
            expected_version: Some(1),
        },
    )
    .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert_eq!(paid.paid_date(), Some(date(2024, 4, 1)));
    assert_eq!(paid.version, 2);

    let repaid = mark_paid(&mut fx.store, &fx.session, inv.id, MarkPaid::on(date(2024, 4, 3))).unwrap();
    assert_eq!(repaid.paid_date(), Some(date(2024, 4, 3)));
    assert_eq!(repaid.payment.as_ref().and_then(|p| p.method.clone()), None);

    let reopened = reopen(&mut fx.store, &fx.session, inv.id, None).unwrap();
    assert_eq!(reopened.status, InvoiceStatus::Outstanding);
    assert!(reopened.payment.is_none());

    let again = reopen(&mut fx.store, &fx.session, inv.id, None).unwrap();
    assert_eq!(again, reopened);
}

#[test]
fn stale_version_is_a_conflict() {
    let mut fx = Fixture::new();
    let inv = fx.explicit("UPL-202403-1001", "Linehaul", 50_000, date(2024, 3, 1));
    mark_paid(&mut fx.store, &fx.session, inv.id, MarkPaid::on(date(2024, 4, 1))).unwrap();

    let err = reopen(&mut fx.store, &fx.session, inv.id, Some(1)).unwrap_err();
    assert!(matches!(err, BillingError::Conflict(_)));
    let current = get_invoice(&fx.store, &fx.session, inv.id).unwrap();
    assert_eq!(current.status, InvoiceStatus::Paid);
}

#[test]
fn drafts_cannot_be_paid_or_reopened() {
    let mut fx = Fixture::new();
    let mut input = NewInvoice::new(
        fx.client.id,
        date(2024, 3, 1),
        InvoiceLines::Explicit {
            description: Some("Linehaul".to_string()),
            amount: Some(cents(100)),
        },
    );
    input.draft = true;
    let draft = fx.create(input).unwrap();
    assert_eq!(draft.status, InvoiceStatus::Draft);

    let err = mark_paid(&mut fx.store, &fx.session, draft.id, MarkPaid::on(date(2024, 4, 1))).unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::InvalidTransition { status: InvoiceStatus::Draft, .. })
    ));
    assert!(reopen(&mut fx.store, &fx.session, draft.id, None).is_err());

    let removed = delete_invoice(&mut fx.store, &fx.session, draft.id).unwrap();
    assert_eq!(removed.id, draft.id);
    assert!(matches!(
        get_invoice(&fx.store, &fx.session, draft.id),
        Err(BillingError::NotFound { .. })
    ));
}

#[test]
fn other_company_sees_nothing() {
    let mut fx = Fixture::new();
    let inv = fx.explicit("UPL-202403-1001", "Linehaul", 50_000, date(2024, 3, 1));
    let other = new_company(&mut fx.store, "Other Freight");

    assert!(search_invoices(&fx.store, &other, "").unwrap().is_empty());
    assert!(search_invoices(&fx.store, &other, "UPL").unwrap().is_empty());

    let kpis = compute_kpis(&fx.store, &other, Utc::now()).unwrap();
    assert_eq!(kpis.outstanding_count, 0);
    assert_eq!(kpis.outstanding_total, Money::ZERO);

    let not_found = |r: haulbill::Result<haulbill::Invoice>| matches!(r, Err(BillingError::NotFound { .. }));
    assert!(not_found(mark_paid(&mut fx.store, &other, inv.id, MarkPaid::on(date(2024, 4, 1)))));
    assert!(not_found(reopen(&mut fx.store, &other, inv.id, None)));
    assert!(not_found(delete_invoice(&mut fx.store, &other, inv.id)));
    assert!(not_found(get_invoice(&fx.store, &other, inv.id)));
    assert!(not_found(invoice::find_by_number(&fx.store, &other, "UPL-202403-1001")));

    let err = create_invoice(
        &mut fx.store,
        &other,
        &fx.settings,
        NewInvoice::new(
            fx.client.id,
            date(2024, 3, 1),
            InvoiceLines::Explicit {
                description: Some("Linehaul".to_string()),
                amount: Some(cents(100)),
            },
        ),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::UnknownClient(_))
    ));

    let still_there = get_invoice(&fx.store, &fx.session, inv.id).unwrap();
    assert_eq!(still_there.status, InvoiceStatus::Outstanding);
}

#[test]
fn unknown_company_is_not_found() {
    let mut fx = Fixture::new();
    let ghost = Session::new(Uuid::new_v4());
    let err = create_invoice(
        &mut fx.store,
        &ghost,
        &fx.settings,
        NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::RouteDerived),
    )
    .unwrap_err();
    assert!(matches!(err, BillingError::NotFound { entity: "Company", .. }));
}

#[test]
fn kpis_split_backlog_and_this_years_income() {
    let mut fx = Fixture::new();
    fx.explicit("UPL-1", "Open load", 500_000, date(2023, 11, 1));
    let this_year = fx.explicit("UPL-2", "Paid load", 300_000, date(2024, 1, 10));
    let last_year = fx.explicit("UPL-3", "Old load", 999_999, date(2023, 12, 1));
    let mut draft = NewInvoice::new(
        fx.client.id,
        date(2024, 5, 1),
        InvoiceLines::Explicit {
            description: Some("Draft load".to_string()),
            amount: Some(cents(77_700)),
        },
    );
    draft.draft = true;
    fx.create(draft).unwrap();

    mark_paid(&mut fx.store, &fx.session, this_year.id, MarkPaid::on(date(2024, 2, 1))).unwrap();
    mark_paid(&mut fx.store, &fx.session, last_year.id, MarkPaid::on(date(2023, 12, 31))).unwrap();

    let as_of = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let kpis = compute_kpis(&fx.store, &fx.session, as_of).unwrap();
    assert_eq!(kpis.outstanding_total, cents(500_000));
    assert_eq!(kpis.outstanding_count, 1);
    assert_eq!(kpis.ytd_income, cents(300_000));
}

#[test]
fn ytd_window_includes_new_year_and_excludes_next() {
    let mut fx = Fixture::new();
    let first_day = fx.explicit("UPL-1", "First day", 40_000, date(2023, 12, 20));
    let next_year = fx.explicit("UPL-2", "Next year", 70_000, date(2024, 12, 20));
    let last_day = fx.explicit("UPL-3", "Last day", 2_000, date(2024, 12, 1));

    mark_paid(&mut fx.store, &fx.session, first_day.id, MarkPaid::on(date(2024, 1, 1))).unwrap();
    mark_paid(&mut fx.store, &fx.session, next_year.id, MarkPaid::on(date(2025, 1, 1))).unwrap();
    mark_paid(&mut fx.store, &fx.session, last_day.id, MarkPaid::on(date(2024, 12, 31))).unwrap();

    let as_of = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    let kpis = compute_kpis(&fx.store, &fx.session, as_of).unwrap();
    assert_eq!(kpis.ytd_income, cents(42_000));
    assert_eq!(kpis.outstanding_count, 0);

    let in_2025 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let kpis = compute_kpis(&fx.store, &fx.session, in_2025).unwrap();
    assert_eq!(kpis.ytd_income, cents(70_000));
}

#[test]
fn kpi_totals_past_i64_are_rejected() {
    let mut fx = Fixture::new();
    fx.explicit("UPL-1", "Huge", i64::MAX, date(2024, 3, 1));
    fx.explicit("UPL-2", "Huge again", i64::MAX, date(2024, 3, 2));

    let err = compute_kpis(&fx.store, &fx.session, Utc::now()).unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::AmountTooLarge)
    ));
}

#[test]
fn line_item_totals_past_i64_are_rejected() {
    let mut fx = Fixture::new();
    let items = vec![
        LineItemInput::new("a", "92233720368547758.07".parse().unwrap()),
        LineItemInput::new("b", cents(1)),
    ];
    let err = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::LineItems(items)))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::AmountTooLarge)
    ));
    assert!(search_invoices(&fx.store, &fx.session, "").unwrap().is_empty());
}

#[test]
fn two_ledger_handles_report_a_taken_number() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ledger.toml");
    let settings = InvoiceSettings::default();

    let (session, client_id) = {
        let mut store = FileStore::open(&path).unwrap();
        let company = Company::new("Bayline Trucking", "America/Los_Angeles").unwrap();
        let session = Session::new(company.id);
        store.insert_company(company).unwrap();
        let client = catalog::create_client(
            &mut store,
            &session,
            &settings,
            NewClient {
                name: "Acme Foods".to_string(),
                ..NewClient::default()
            },
        )
        .unwrap();
        (session, client.id)
    };

    let mut first = FileStore::open(&path).unwrap();
    let mut second = FileStore::open(&path).unwrap();
    let load = |number: &str| {
        NewInvoice::new(
            client_id,
            date(2024, 3, 1),
            InvoiceLines::Explicit {
                description: Some("Linehaul".to_string()),
                amount: Some(cents(100_000)),
            },
        )
        .number(number)
    };

    create_invoice(&mut first, &session, &settings, load("A-1")).unwrap();
    let err = create_invoice(&mut second, &session, &settings, load("A-1")).unwrap_err();
    assert!(matches!(err, BillingError::Conflict(_)));
    assert!(err.is_retryable());
    create_invoice(&mut second, &session, &settings, load("A-2")).unwrap();

    let reopened = FileStore::open(&path).unwrap();
    let on_disk = search_invoices(&reopened, &session, "").unwrap();
    assert_eq!(on_disk.len(), 2);
}

#[test]
fn kpis_are_zero_for_empty_ledger() {
    let fx = Fixture::new();
    let kpis = compute_kpis(&fx.store, &fx.session, Utc::now()).unwrap();
    assert_eq!(kpis, haulbill::Kpis::default());
}

#[test]
fn search_treats_metacharacters_literally() {
    let mut fx = Fixture::new();
    fx.explicit("UPL-1", "A+B consolidated freight", 100, date(2024, 3, 1));
    fx.explicit("UPL-2", "AAB lane", 100, date(2024, 3, 2));
    fx.explicit("UPL-3", "AB lane", 100, date(2024, 3, 3));

    let hits = search_invoices(&fx.store, &fx.session, "a+b").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].invoice_number, "UPL-1");
}

#[test]
fn search_keeps_leading_space() {
    let mut fx = Fixture::new();
    fx.explicit("BA-1", "Linehaul", 100, date(2024, 3, 1));
    fx.explicit("UPL-2", "Reefer a lane", 100, date(2024, 3, 2));

    let hits = search_invoices(&fx.store, &fx.session, " a").unwrap();
    let numbers: Vec<&str> = hits.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, ["UPL-2"]);
}

#[test]
fn search_covers_number_load_and_description_newest_first() {
    let mut fx = Fixture::new();
    fx.explicit("UPL-202401-1111", "Linehaul", 100, date(2024, 1, 5));
    let with_load = fx
        .create(
            NewInvoice::new(
                fx.client.id,
                date(2024, 2, 5),
                InvoiceLines::Explicit {
                    description: Some("Reefer run".to_string()),
                    amount: Some(cents(100)),
                },
            )
            .number("UPL-202402-2222")
            .load_ref("BOL-7781"),
        )
        .unwrap();
    fx.explicit("UPL-202403-3333", "Empty totes return", 100, date(2024, 3, 5));

    let by_load = search_invoices(&fx.store, &fx.session, "bol-77").unwrap();
    assert_eq!(by_load.len(), 1);
    assert_eq!(by_load[0].id, with_load.id);

    let by_number = search_invoices(&fx.store, &fx.session, "202403").unwrap();
    assert_eq!(by_number[0].invoice_number, "UPL-202403-3333");

    let all = search_invoices(&fx.store, &fx.session, "").unwrap();
    let numbers: Vec<&str> = all.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, ["UPL-202403-3333", "UPL-202402-2222", "UPL-202401-1111"]);
}

#[test]
fn search_is_capped() {
    let mut fx = Fixture::new();
    for n in 0..(SEARCH_LIMIT + 5) {
        let day = date(2024, 1, 1) + chrono::Days::new(n as u64);
        fx.explicit(&format!("UPL-{n:04}"), "Linehaul", 100, day);
    }
    let all = search_invoices(&fx.store, &fx.session, "linehaul").unwrap();
    assert_eq!(all.len(), SEARCH_LIMIT);
    assert_eq!(all[0].invoice_number, format!("UPL-{:04}", SEARCH_LIMIT + 4));
}

#[test]
fn outstanding_list_is_oldest_first() {
    let mut fx = Fixture::new();
    fx.explicit("UPL-2", "Later", 100, date(2024, 3, 2));
    fx.explicit("UPL-1", "Earlier", 100, date(2024, 3, 1));
    let paid = fx.explicit("UPL-3", "Paid", 100, date(2024, 2, 1));
    mark_paid(&mut fx.store, &fx.session, paid.id, MarkPaid::on(date(2024, 3, 5))).unwrap();

    let open = invoice::list_outstanding(&fx.store, &fx.session).unwrap();
    let numbers: Vec<&str> = open.iter().map(|i| i.invoice_number.as_str()).collect();
    assert_eq!(numbers, ["UPL-1", "UPL-2"]);
}

#[test]
fn client_names_are_unique_among_active() {
    let mut fx = Fixture::new();
    let dup = catalog::create_client(
        &mut fx.store,
        &fx.session,
        &fx.settings,
        NewClient {
            name: "Auto Chlor Branch 310".to_string(),
            ..NewClient::default()
        },
    )
    .unwrap_err();
    assert!(matches!(dup, BillingError::Conflict(_)));

    catalog::deactivate_client(&mut fx.store, &fx.session, fx.client.id).unwrap();
    let again = catalog::create_client(
        &mut fx.store,
        &fx.session,
        &fx.settings,
        NewClient {
            name: "Auto Chlor Branch 310".to_string(),
            ..NewClient::default()
        },
    )
    .unwrap();
    assert_eq!(again.payment_terms_days, 30);
    assert_eq!(catalog::list_clients(&fx.store, &fx.session).unwrap().len(), 1);
}

#[test]
fn inactive_client_or_foreign_route_cannot_be_invoiced() {
    let mut fx = Fixture::new();
    let route = fx.route("SSF to SF", 1000, date(2024, 1, 1));
    let other_client = catalog::create_client(
        &mut fx.store,
        &fx.session,
        &fx.settings,
        NewClient {
            name: "BBI Logistics".to_string(),
            ..NewClient::default()
        },
    )
    .unwrap();

    let err = fx
        .create(NewInvoice::new(other_client.id, date(2024, 3, 1), InvoiceLines::RouteDerived).route(route.id))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::RouteClientMismatch { .. })
    ));

    catalog::deactivate_route(&mut fx.store, &fx.session, route.id).unwrap();
    let err = fx
        .create(NewInvoice::new(fx.client.id, date(2024, 3, 1), InvoiceLines::RouteDerived).route(route.id))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::UnknownRoute(_))
    ));

    catalog::deactivate_client(&mut fx.store, &fx.session, fx.client.id).unwrap();
    let err = fx
        .create(NewInvoice::new(
            fx.client.id,
            date(2024, 3, 1),
            InvoiceLines::Explicit {
                description: Some("Linehaul".to_string()),
                amount: Some(cents(100)),
            },
        ))
        .unwrap_err();
    assert!(matches!(
        err,
        BillingError::Validation(ValidationError::UnknownClient(_))
    ));
}

#[test]
fn route_price_history_rules() {
    let mut fx = Fixture::new();
    let route = fx.route("SSF to SF", 1000, date(2024, 1, 1));

    let same_day = catalog::add_route_price(
        &mut fx.store,
        &fx.session,
        route.id,
        PriceEntry::new(cents(1100), date(2024, 1, 1)),
    )
    .unwrap_err();
    assert!(matches!(
        same_day,
        BillingError::Validation(ValidationError::DuplicatePriceStart(_))
    ));

    let inverted = catalog::add_route_price(
        &mut fx.store,
        &fx.session,
        route.id,
        PriceEntry::new(cents(1100), date(2024, 5, 1)).until(date(2024, 4, 1)),
    )
    .unwrap_err();
    assert!(matches!(
        inverted,
        BillingError::Validation(ValidationError::InvertedPriceWindow { .. })
    ));

    let zero = catalog::add_route_price(
        &mut fx.store,
        &fx.session,
        route.id,
        PriceEntry::new(Money::ZERO, date(2024, 5, 1)),
    )
    .unwrap_err();
    assert!(matches!(
        zero,
        BillingError::Validation(ValidationError::NonPositiveAmount(0))
    ));

    let updated = catalog::add_route_price(
        &mut fx.store,
        &fx.session,
        route.id,
        PriceEntry::new(cents(1300), date(2024, 5, 1)),
    )
    .unwrap();
    assert_eq!(updated.prices.len(), 2);
    assert_eq!(updated.prices[0].amount, cents(1000));
}

#[test]
fn presets_import_is_idempotent() {
    let mut fx = Fixture::new();
    let presets = r#"
[[clients]]
name = "Auto Chlor Branch 310"

[[clients.routes]]
name = "SSF to SF"
description = "Auto Chlor Branch 370 (South San Francisco, CA) to Auto Chlor Branch 310 (San Francisco, CA)"
price = 100000
effective_from = "2024-01-01"

[[clients]]
name = "Auto Chlor Branch 330"
address = "3000 Academy Way Ste 100\nSacramento, CA 95815"

[[clients.routes]]
name = "SSF to Sacramento"
"#;

    let parsed: PresetFile = toml::from_str(presets).unwrap();
    let summary =
        catalog::import_presets(&mut fx.store, &fx.session, &fx.settings, parsed).unwrap();
    assert_eq!(summary.clients_created, 1);
    assert_eq!(summary.clients_reused, 1);
    assert_eq!(summary.routes_created, 1);
    assert_eq!(summary.routes_skipped, 1);

    let parsed: PresetFile = toml::from_str(presets).unwrap();
    let again = catalog::import_presets(&mut fx.store, &fx.session, &fx.settings, parsed).unwrap();
    assert_eq!(again.clients_created, 0);
    assert_eq!(again.routes_created, 0);

    let routes = catalog::list_routes(&fx.store, &fx.session, fx.client.id).unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].prices[0].amount, cents(100_000));
}

#[test]
fn presets_naming_a_route_twice_import_it_once() {
    let mut fx = Fixture::new();
    let presets = r#"
[[clients]]
name = "BBI Logistics"

[[clients.routes]]
name = "Oakland to Fresno"
price = 180000
effective_from = "2024-01-01"

[[clients.routes]]
name = "Oakland to Fresno"
price = 190000
effective_from = "2024-01-01"

[[clients.routes]]
name = "Fresno to Oakland"
price = 175000
effective_from = "2024-01-01"
"#;

    let parsed: PresetFile = toml::from_str(presets).unwrap();
    let summary =
        catalog::import_presets(&mut fx.store, &fx.session, &fx.settings, parsed).unwrap();
    assert_eq!(summary.clients_created, 1);
    assert_eq!(summary.routes_created, 2);
    assert_eq!(summary.routes_skipped, 1);

    let client = catalog::resolve_client(&fx.store, &fx.session, "BBI Logistics").unwrap();
    let routes = catalog::list_routes(&fx.store, &fx.session, client.id).unwrap();
    let names: Vec<&str> = routes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Fresno to Oakland", "Oakland to Fresno"]);
    assert_eq!(routes[1].prices[0].amount, cents(180_000));
}
