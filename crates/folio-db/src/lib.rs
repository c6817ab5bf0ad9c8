// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod accrual;
pub mod export;
pub mod source;

use anyhow::{Context, Result, anyhow, bail};
use folio_app::{
    Client, ClientFormInput, ClientId, ImportSummary, ImportedInvestment, Investment,
    InvestmentFormInput, InvestmentId, InvestmentRecord, InvestmentType, Modality,
};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::{date, format_description};
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

pub use export::{ExportedInvestment, export_json};
pub use source::{StoreImporter, StoreRecordSource};

pub const APP_NAME: &str = "folio";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "clients",
        &["id", "name", "email", "created_at", "updated_at", "deleted_at"],
    ),
    (
        "investments",
        &[
            "id",
            "client_id",
            "kind",
            "modality",
            "issuer",
            "principal_cents",
            "annual_rate_bps",
            "start_date",
            "maturity_date",
            "created_at",
            "updated_at",
            "deleted_at",
        ],
    ),
    (
        "imports",
        &["id", "checksum_sha256", "row_count", "imported_at"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_clients_name",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_clients_name ON clients (name);",
    },
    RequiredIndex {
        name: "idx_investments_client_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_investments_client_id ON investments (client_id);",
    },
    RequiredIndex {
        name: "idx_investments_deleted_at",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_investments_deleted_at ON investments (deleted_at);",
    },
    RequiredIndex {
        name: "idx_imports_checksum",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_imports_checksum ON imports (checksum_sha256);",
    },
];

const DEMO_CLIENTS: [(&str, &str); 3] = [
    ("Ana Souza", "ana@example.com"),
    ("Bruno Lima", "bruno@example.com"),
    ("Carla Rocha", ""),
];

struct DemoInvestment {
    client: usize,
    kind: InvestmentType,
    modality: Modality,
    issuer: &'static str,
    principal_cents: i64,
    annual_rate_bps: Option<i64>,
    start_date: Date,
    maturity_date: Option<Date>,
}

const DEMO_INVESTMENTS: [DemoInvestment; 6] = [
    DemoInvestment {
        client: 0,
        kind: InvestmentType::Cdb,
        modality: Modality::Prefixed,
        issuer: "Banco Inter",
        principal_cents: 1_500_000,
        annual_rate_bps: Some(1_250),
        start_date: date!(2024 - 03 - 15),
        maturity_date: Some(date!(2027 - 03 - 15)),
    },
    DemoInvestment {
        client: 0,
        kind: InvestmentType::TesouroDireto,
        modality: Modality::InflationLinked,
        issuer: "Tesouro Nacional",
        principal_cents: 800_000,
        annual_rate_bps: Some(650),
        start_date: date!(2023 - 08 - 01),
        maturity_date: Some(date!(2035 - 05 - 15)),
    },
    DemoInvestment {
        client: 1,
        kind: InvestmentType::Lci,
        modality: Modality::Postfixed,
        issuer: "Caixa",
        principal_cents: 2_000_000,
        annual_rate_bps: Some(1_050),
        start_date: date!(2025 - 01 - 10),
        maturity_date: Some(date!(2026 - 01 - 10)),
    },
    DemoInvestment {
        client: 1,
        kind: InvestmentType::Stock,
        modality: Modality::Variable,
        issuer: "Itaú",
        principal_cents: 350_000,
        annual_rate_bps: None,
        start_date: date!(2024 - 11 - 04),
        maturity_date: None,
    },
    DemoInvestment {
        client: 2,
        kind: InvestmentType::Fund,
        modality: Modality::Variable,
        issuer: "BTG Pactual",
        principal_cents: 1_200_000,
        annual_rate_bps: None,
        start_date: date!(2025 - 06 - 02),
        maturity_date: None,
    },
    DemoInvestment {
        client: 2,
        kind: InvestmentType::Lca,
        modality: Modality::Prefixed,
        issuer: "Banco do Brasil",
        principal_cents: 950_000,
        annual_rate_bps: Some(1_120),
        start_date: date!(2025 - 02 - 20),
        maturity_date: Some(date!(2027 - 02 - 20)),
    },
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        let tables = schema_objects(&self.conn, "table")?;
        if tables.is_empty() {
            info!("creating folio schema");
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        } else {
            validate_schema(&self.conn, &tables)?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn create_client(&self, client: &ClientFormInput) -> Result<ClientId> {
        client.validate()?;
        self.insert_client(client)
    }

    fn insert_client(&self, client: &ClientFormInput) -> Result<ClientId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO clients (name, email, created_at, updated_at)
                VALUES (?, ?, ?, ?)
                ",
                params![client.name.trim(), client.email, now, now],
            )
            .with_context(|| format!("insert client {:?}", client.name))?;
        Ok(ClientId::new(self.conn.last_insert_rowid()))
    }

    pub fn find_client_by_name(&self, name: &str) -> Result<Option<ClientId>> {
        self.conn
            .query_row(
                "SELECT id FROM clients WHERE name = ?",
                params![name.trim()],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .with_context(|| format!("look up client {name:?}"))
            .map(|id| id.map(ClientId::new))
    }

    pub fn list_clients(&self, include_deleted: bool) -> Result<Vec<Client>> {
        let mut sql = String::from(
            "
            SELECT id, name, email, created_at, updated_at, deleted_at
            FROM clients
            ",
        );
        if !include_deleted {
            sql.push_str("WHERE deleted_at IS NULL\n");
        }
        sql.push_str("ORDER BY name COLLATE NOCASE ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql).context("prepare clients query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(3)?;
                let updated_at_raw: String = row.get(4)?;
                let deleted_at_raw: Option<String> = row.get(5)?;
                Ok(Client {
                    id: ClientId::new(row.get(0)?),
                    name: row.get(1)?,
                    email: row.get(2)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                    updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
                    deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query clients")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect clients")
    }

    pub fn create_investment(&self, investment: &InvestmentFormInput) -> Result<InvestmentId> {
        investment.validate()?;
        self.insert_investment(investment)
    }

    fn insert_investment(&self, investment: &InvestmentFormInput) -> Result<InvestmentId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO investments (
                  client_id, kind, modality, issuer, principal_cents,
                  annual_rate_bps, start_date, maturity_date, notes,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    investment.client_id.get(),
                    investment.kind.as_str(),
                    investment.modality.as_str(),
                    investment.issuer.trim(),
                    investment.principal_cents,
                    investment.annual_rate_bps,
                    format_date(investment.start_date),
                    investment.maturity_date.map(format_date),
                    investment.notes,
                    now,
                    now,
                ],
            )
            .context("insert investment")?;

        Ok(InvestmentId::new(self.conn.last_insert_rowid()))
    }

    pub fn get_investment(&self, investment_id: InvestmentId) -> Result<Investment> {
        self.conn
            .query_row(
                &format!("{INVESTMENT_COLUMNS} WHERE id = ?"),
                params![investment_id.get()],
                investment_from_row,
            )
            .with_context(|| format!("load investment {investment_id}"))
    }

    pub fn list_investments(&self, include_deleted: bool) -> Result<Vec<Investment>> {
        let mut sql = String::from(INVESTMENT_COLUMNS);
        if !include_deleted {
            sql.push_str("\nWHERE deleted_at IS NULL");
        }
        sql.push_str("\nORDER BY id ASC");

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare investments query")?;
        let rows = stmt
            .query_map([], investment_from_row)
            .context("query investments")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect investments")
    }

    /// Live investments joined with client names and accrued values as of `as_of`.
    pub fn list_investment_records(&self, as_of: Date) -> Result<Vec<InvestmentRecord>> {
        let client_names: BTreeMap<ClientId, String> = self
            .list_clients(true)?
            .into_iter()
            .map(|client| (client.id, client.name))
            .collect();

        let records = self
            .list_investments(false)?
            .into_iter()
            .map(|investment| {
                let client_name = client_names.get(&investment.client_id).cloned();
                accrual::investment_record(investment, client_name, as_of)
            })
            .collect();
        Ok(records)
    }

    pub fn soft_delete_investment(&self, investment_id: InvestmentId) -> Result<()> {
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "UPDATE investments SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
                params![now, investment_id.get()],
            )
            .context("soft delete investment")?;
        if rows_affected == 0 {
            bail!("investment {investment_id} not found or already deleted");
        }
        debug!(%investment_id, "investment soft-deleted");
        Ok(())
    }

    pub fn restore_investment(&self, investment_id: InvestmentId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE investments SET deleted_at = NULL WHERE id = ? AND deleted_at IS NOT NULL",
                params![investment_id.get()],
            )
            .context("restore investment")?;
        if rows_affected == 0 {
            bail!("investment {investment_id} is not deleted -- nothing to restore");
        }
        Ok(())
    }

    pub fn import_checksum_exists(&self, checksum: &str) -> Result<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM imports WHERE checksum_sha256 = ?)",
                params![checksum],
                |row| row.get::<_, i64>(0),
            )
            .context("check import ledger")?;
        Ok(exists == 1)
    }

    /// Validates every row up front, then applies all of them or none.
    /// Unknown clients are created by name.
    pub fn import_investments(
        &self,
        rows: &[ImportedInvestment],
        checksum: &str,
    ) -> Result<ImportSummary> {
        if self.import_checksum_exists(checksum)? {
            bail!("this payload was already imported -- export a fresh file and retry");
        }
        for (index, row) in rows.iter().enumerate() {
            row.validate()
                .with_context(|| format!("import row {}", index + 1))?;
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin import transaction")?;
        let mut summary = ImportSummary::default();
        for row in rows {
            let client_id = match self.find_client_by_name(&row.client)? {
                Some(id) => id,
                None => {
                    summary.clients_created += 1;
                    self.insert_client(&ClientFormInput {
                        name: row.client.clone(),
                        email: row.client_email.clone(),
                    })?
                }
            };
            self.insert_investment(&InvestmentFormInput {
                client_id,
                kind: row.kind,
                modality: row.modality,
                issuer: row.issuer.clone(),
                principal_cents: row.principal_cents,
                annual_rate_bps: row.annual_rate_bps,
                start_date: row.start_date,
                maturity_date: row.maturity_date,
                notes: row.notes.clone(),
            })?;
            summary.imported += 1;
        }

        let row_count = i64::try_from(rows.len()).context("import row count overflow")?;
        self.conn
            .execute(
                "INSERT INTO imports (checksum_sha256, row_count, imported_at) VALUES (?, ?, ?)",
                params![checksum, row_count, now_rfc3339()?],
            )
            .context("record import")?;
        tx.commit().context("commit import")?;

        info!(
            imported = summary.imported,
            clients_created = summary.clients_created,
            "import applied"
        );
        Ok(summary)
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        let mut client_ids = Vec::with_capacity(DEMO_CLIENTS.len());
        for (name, email) in DEMO_CLIENTS {
            let id = match self.find_client_by_name(name)? {
                Some(id) => id,
                None => self.create_client(&ClientFormInput {
                    name: name.to_owned(),
                    email: email.to_owned(),
                })?,
            };
            client_ids.push(id);
        }

        for demo in &DEMO_INVESTMENTS {
            self.create_investment(&InvestmentFormInput {
                client_id: client_ids[demo.client],
                kind: demo.kind,
                modality: demo.modality,
                issuer: demo.issuer.to_owned(),
                principal_cents: demo.principal_cents,
                annual_rate_bps: demo.annual_rate_bps,
                start_date: demo.start_date,
                maturity_date: demo.maturity_date,
                notes: String::new(),
            })?;
        }
        Ok(())
    }
}

const INVESTMENT_COLUMNS: &str = "
    SELECT
      id, client_id, kind, modality, issuer, principal_cents,
      annual_rate_bps, start_date, maturity_date, notes,
      created_at, updated_at, deleted_at
    FROM investments";

fn investment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Investment> {
    let kind_raw: String = row.get(2)?;
    let kind = InvestmentType::parse(&kind_raw)
        .ok_or_else(|| invalid_column(2, format!("unknown investment type {kind_raw}")))?;
    let modality_raw: String = row.get(3)?;
    let modality = Modality::parse(&modality_raw)
        .ok_or_else(|| invalid_column(3, format!("unknown modality {modality_raw}")))?;

    let start_date_raw: String = row.get(7)?;
    let maturity_date_raw: Option<String> = row.get(8)?;
    let created_at_raw: String = row.get(10)?;
    let updated_at_raw: String = row.get(11)?;
    let deleted_at_raw: Option<String> = row.get(12)?;

    Ok(Investment {
        id: InvestmentId::new(row.get(0)?),
        client_id: ClientId::new(row.get(1)?),
        kind,
        modality,
        issuer: row.get(4)?,
        principal_cents: row.get(5)?,
        annual_rate_bps: row.get(6)?,
        start_date: parse_date(&start_date_raw).map_err(to_sql_error)?,
        maturity_date: parse_opt_date(maturity_date_raw).map_err(to_sql_error)?,
        notes: row.get(9)?,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_at_raw).map_err(to_sql_error)?,
        deleted_at: parse_opt_datetime(deleted_at_raw).map_err(to_sql_error)?,
    })
}

fn invalid_column(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message)),
    )
}

pub fn import_checksum(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut output = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("FOLIO_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set FOLIO_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("folio.db"))
}

/// Accepts `:memory:` or a plain filesystem path. URI forms are rejected
/// because the store opens paths without SQLite's URI parsing.
pub fn validate_db_path(path: &str) -> Result<()> {
    match path {
        "" => bail!("database path must not be empty"),
        ":memory:" => return Ok(()),
        _ => {}
    }

    if path.starts_with("file:") || path.contains("://") || path.contains('?') {
        bail!("database path {path:?} reads as a file: URI or URL -- pass a plain filesystem path");
    }
    Ok(())
}

/// Names of the non-internal objects of one kind (`table` or `index`).
fn schema_objects(conn: &Connection, kind: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = ? AND name NOT LIKE 'sqlite_%'")
        .with_context(|| format!("list {kind} names"))?;
    let names = stmt
        .query_map(params![kind], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("read {kind} names"))?;
    Ok(names)
}

/// Existing databases must carry every folio table and column; nothing is
/// migrated in place.
fn validate_schema(conn: &Connection, tables: &BTreeSet<String>) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !tables.contains(*table) {
            bail!(
                "database has no `{table}` table -- point FOLIO_DB_PATH at a folio database and retry"
            );
        }

        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .with_context(|| format!("inspect columns of {table}"))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()
            .with_context(|| format!("read columns of {table}"))?;

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` lacks columns {} -- recreate the database and retry",
                missing.join(", ")
            );
        }
    }
    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    let existing = schema_objects(conn, "index")?;
    for index in REQUIRED_INDEXES {
        if existing.contains(index.name) {
            continue;
        }
        debug!(index = index.name, "creating missing index");
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("create index `{}`", index.name))?;
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
        .context("enable foreign keys")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

/// Timestamps are always written as RFC 3339 by [`now_rfc3339`].
fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("timestamp {raw:?}"))
}

fn parse_date(raw: &str) -> Result<Date> {
    Date::parse(raw, &format_description!("[year]-[month]-[day]")).with_context(|| format!("date {raw:?}"))
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    invalid_column(0, error.to_string())
}

fn format_date(value: Date) -> String {
    // Four-digit years always fit the ISO layout.
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}
