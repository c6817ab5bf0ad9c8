// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use folio_app::{
    ClientFormInput, ImportSource, Importer, InvestmentFormInput, InvestmentType, Modality,
    RecordSource,
};
use folio_db::{
    Store, StoreImporter, StoreRecordSource, export_json, import_checksum, validate_db_path,
};
use folio_testkit::{PortfolioFaker, reference_date, temp_db_path};
use time::macros::date;

fn bootstrapped() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

fn investment_for(store: &Store, client: &str) -> Result<InvestmentFormInput> {
    let client_id = store.create_client(&ClientFormInput {
        name: client.to_owned(),
        email: String::new(),
    })?;
    Ok(InvestmentFormInput {
        client_id,
        kind: InvestmentType::Cdb,
        modality: Modality::Prefixed,
        issuer: "Banco Inter".to_owned(),
        principal_cents: 1_000_000,
        annual_rate_bps: Some(1_000),
        start_date: date!(2025 - 01 - 01),
        maturity_date: Some(date!(2027 - 01 - 01)),
        notes: String::new(),
    })
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    let message = validate_db_path("file:test.db")
        .expect_err("file: paths are URIs")
        .to_string();
    assert!(message.contains("file: URI"), "{message}");
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path(":memory:").is_ok());
    assert!(validate_db_path("/tmp/folio.db").is_ok());
}

#[test]
fn bootstrap_is_idempotent_on_disk() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        store.seed_demo_data()?;
    }
    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.list_clients(false)?.len(), 3);
    assert_eq!(store.list_investments(false)?.len(), 6);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = bootstrapped()?;
    store.raw_connection().execute_batch(
        "
        DROP TABLE imports;
        CREATE TABLE imports (
          id INTEGER PRIMARY KEY,
          row_count INTEGER NOT NULL,
          imported_at TEXT NOT NULL
        );
        ",
    )?;

    let err = store
        .bootstrap()
        .expect_err("schema validation should fail");
    let message = err.to_string();
    assert!(message.contains("table `imports` lacks columns"));
    assert!(message.contains("checksum_sha256"));
    Ok(())
}

#[test]
fn bootstrap_rejects_foreign_database_and_restores_dropped_index() -> Result<()> {
    let store = bootstrapped()?;
    store
        .raw_connection()
        .execute_batch("DROP INDEX idx_investments_client_id;")?;
    store.bootstrap()?;
    let restored: i64 = store.raw_connection().query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_investments_client_id'",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(restored, 1);

    let foreign = Store::open_memory()?;
    foreign
        .raw_connection()
        .execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT);")?;
    let message = foreign
        .bootstrap()
        .expect_err("a database without folio tables should be refused")
        .to_string();
    assert!(message.contains("no `clients` table"), "{message}");
    Ok(())
}

#[test]
fn create_and_load_investment() -> Result<()> {
    let store = bootstrapped()?;
    let form = investment_for(&store, "Ana Souza")?;
    let id = store.create_investment(&form)?;

    let loaded = store.get_investment(id)?;
    assert_eq!(loaded.client_id, form.client_id);
    assert_eq!(loaded.kind, InvestmentType::Cdb);
    assert_eq!(loaded.start_date, date!(2025 - 01 - 01));
    assert_eq!(loaded.maturity_date, Some(date!(2027 - 01 - 01)));
    assert!(loaded.deleted_at.is_none());
    Ok(())
}

#[test]
fn create_investment_rejects_invalid_form() -> Result<()> {
    let store = bootstrapped()?;
    let mut form = investment_for(&store, "Ana Souza")?;
    form.principal_cents = 0;
    assert!(store.create_investment(&form).is_err());
    assert!(store.list_investments(true)?.is_empty());
    Ok(())
}

#[test]
fn soft_delete_hides_and_restore_returns() -> Result<()> {
    let store = bootstrapped()?;
    let id = store.create_investment(&investment_for(&store, "Ana Souza")?)?;

    store.soft_delete_investment(id)?;
    assert!(store.list_investments(false)?.is_empty());
    assert_eq!(store.list_investments(true)?.len(), 1);
    assert!(store.soft_delete_investment(id).is_err());

    store.restore_investment(id)?;
    assert_eq!(store.list_investments(false)?.len(), 1);
    assert!(store.restore_investment(id).is_err());
    Ok(())
}

#[test]
fn records_carry_client_name_and_accrual() -> Result<()> {
    let store = bootstrapped()?;
    let form = investment_for(&store, "Ana Souza")?;
    store.create_investment(&form)?;

    let records = store.list_investment_records(date!(2026 - 01 - 01))?;
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.client_name.as_deref(), Some("Ana Souza"));
    assert_eq!(record.days_held, 365);
    assert_eq!(record.current_value_cents, Some(1_100_000));
    assert_eq!(record.yield_cents, Some(100_000));
    Ok(())
}

#[test]
fn record_source_reloads_after_delete() -> Result<()> {
    let store = bootstrapped()?;
    store.seed_demo_data()?;

    let mut source = StoreRecordSource::new(&store, reference_date());
    assert!(source.current_records().is_empty());
    source.request_repopulate()?;
    assert_eq!(source.current_records().len(), 6);
    assert_eq!(source.client_directory().len(), 3);

    let target = source.current_records()[0].id();
    source.delete_record(target)?;
    assert_eq!(source.current_records().len(), 5);
    assert!(source.current_records().iter().all(|r| r.id() != target));
    assert!(source.delete_record(target).is_err());
    Ok(())
}

#[test]
fn delete_reports_success_when_only_the_reload_fails() -> Result<()> {
    let store = bootstrapped()?;
    store.seed_demo_data()?;
    let mut source = StoreRecordSource::new(&store, reference_date());
    source.request_repopulate()?;
    let target = source.current_records()[0].id();

    store.raw_connection().execute_batch(
        "
        INSERT INTO investments (
          client_id, kind, modality, issuer, principal_cents,
          start_date, created_at, updated_at
        ) VALUES (
          1, 'crypto', 'variable', 'Unknown', 100,
          '2025-01-01', '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z'
        );
        ",
    )?;
    assert!(store.list_investments(false).is_err());

    source.delete_record(target)?;
    assert_eq!(source.current_records().len(), 5);
    assert!(source.current_records().iter().all(|r| r.id() != target));

    let deleted: bool = store.raw_connection().query_row(
        "SELECT deleted_at IS NOT NULL FROM investments WHERE id = ?",
        [target.get()],
        |row| row.get(0),
    )?;
    assert!(deleted);
    Ok(())
}

#[test]
fn import_names_the_invalid_row_and_writes_nothing() -> Result<()> {
    let store = bootstrapped()?;
    let payload = r#"[
        {"client": "Ana Souza", "kind": "cdb", "modality": "prefixed", "issuer": "Inter",
         "principal_cents": 1000, "start_date": "2025-01-01"},
        {"client": "Bruno Lima", "client_email": "bruno", "kind": "cdb",
         "modality": "prefixed", "issuer": "Inter", "principal_cents": 1000,
         "start_date": "2025-01-01"}
    ]"#;

    let error = StoreImporter::new(&store)
        .import_records(&ImportSource::Inline(payload.to_owned()))
        .expect_err("second row has a bad email");
    let message = format!("{error:#}");
    assert!(message.contains("import row 2"), "{message}");
    assert!(message.contains("not an address"), "{message}");
    assert!(store.list_clients(true)?.is_empty());
    assert!(!store.import_checksum_exists(&import_checksum(payload.as_bytes()))?);
    Ok(())
}

#[test]
fn import_creates_missing_clients_once() -> Result<()> {
    let store = bootstrapped()?;
    store.create_client(&ClientFormInput {
        name: "Ana Souza".to_owned(),
        email: String::new(),
    })?;

    let mut faker = PortfolioFaker::new(7);
    let rows = vec![
        faker.imported_investment("Ana Souza"),
        faker.imported_investment("Bruno Lima"),
        faker.imported_investment("Bruno Lima"),
    ];
    let summary = store.import_investments(&rows, "checksum-a")?;
    assert_eq!(summary.imported, 3);
    assert_eq!(summary.clients_created, 1);
    assert_eq!(store.list_clients(false)?.len(), 2);
    assert_eq!(store.list_investments(false)?.len(), 3);
    Ok(())
}

#[test]
fn import_rejects_duplicate_payload() -> Result<()> {
    let store = bootstrapped()?;
    let payload = r#"[{"client": "Ana Souza", "kind": "lci", "modality": "postfixed",
        "issuer": "Caixa", "principal_cents": 250000, "annual_rate_bps": 900,
        "start_date": "2025-03-01", "maturity_date": "2026-03-01"}]"#;

    let mut importer = StoreImporter::new(&store);
    let source = ImportSource::Inline(payload.to_owned());
    assert_eq!(importer.import_records(&source)?.imported, 1);

    let err = importer
        .import_records(&source)
        .expect_err("same payload twice should fail");
    assert!(err.to_string().contains("already imported"));
    assert!(store.import_checksum_exists(&import_checksum(payload.as_bytes()))?);
    assert_eq!(store.list_investments(false)?.len(), 1);
    Ok(())
}

#[test]
fn import_with_invalid_row_writes_nothing() -> Result<()> {
    let store = bootstrapped()?;
    let mut faker = PortfolioFaker::new(11);
    let mut bad = faker.imported_investment("Bruno Lima");
    bad.principal_cents = -5;
    let rows = vec![faker.imported_investment("Ana Souza"), bad];

    assert!(store.import_investments(&rows, "checksum-b").is_err());
    assert!(store.list_clients(true)?.is_empty());
    assert!(store.list_investments(true)?.is_empty());
    assert!(!store.import_checksum_exists("checksum-b")?);
    Ok(())
}

#[test]
fn export_round_trips_through_import_file() -> Result<()> {
    let source_store = bootstrapped()?;
    source_store.seed_demo_data()?;
    let records = source_store.list_investment_records(reference_date())?;
    let clients = source_store.list_clients(false)?;
    let visible: Vec<_> = records.iter().take(4).collect();

    let (_dir, path) = temp_db_path()?;
    let export_path = path.with_file_name("export.json");
    let file = std::fs::File::create(&export_path)?;
    assert_eq!(export_json(&visible, &clients, file)?, 4);

    let target = bootstrapped()?;
    let summary = StoreImporter::new(&target).import_records(&ImportSource::Path(export_path))?;
    assert_eq!(summary.imported, 4);

    let imported = target.list_investment_records(reference_date())?;
    let mut expected: Vec<_> = visible
        .iter()
        .map(|r| (r.client_name.clone(), r.investment.issuer.clone(), r.investment.principal_cents))
        .collect();
    let mut actual: Vec<_> = imported
        .iter()
        .map(|r| (r.client_name.clone(), r.investment.issuer.clone(), r.investment.principal_cents))
        .collect();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
    Ok(())
}
