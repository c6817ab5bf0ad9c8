// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use folio_app::{
    Client, ClientId, ImportSource, ImportSummary, ImportedInvestment, Importer, InternalEvent,
    Investment, InvestmentId, InvestmentRecord, InvestmentType, Modality, Notification,
    NotificationKind, NotificationSink, RecordSource, RefreshTicket, RefreshTimer,
};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;
use time::macros::date;
use time::{Date, OffsetDateTime};

const FIRST_NAMES: [&str; 16] = [
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Felipe", "Gabriela", "Heitor", "Isabela", "João",
    "Larissa", "Marcelo", "Natália", "Otávio", "Paula", "Rafael",
];
const LAST_NAMES: [&str; 14] = [
    "Souza", "Lima", "Oliveira", "Costa", "Pereira", "Almeida", "Ribeiro", "Carvalho", "Gomes",
    "Martins", "Rocha", "Barbosa", "Teixeira", "Moura",
];
const ISSUERS: [&str; 12] = [
    "Banco Inter",
    "Banco do Brasil",
    "Itaú",
    "Bradesco",
    "Caixa",
    "BTG Pactual",
    "XP",
    "Nubank",
    "Santander",
    "Tesouro Nacional",
    "Sicredi",
    "C6 Bank",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct PortfolioFaker {
    rng: DeterministicRng,
}

impl PortfolioFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn client_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    pub fn imported_investment(&mut self, client: &str) -> ImportedInvestment {
        let kind = InvestmentType::ALL[self.rng.int_n(InvestmentType::ALL.len())];
        let modality = match kind {
            InvestmentType::Stock | InvestmentType::Fund => Modality::Variable,
            InvestmentType::TesouroDireto => Modality::InflationLinked,
            _ => Modality::ALL[self.rng.int_n(3)],
        };
        let start_date = self.date_before_reference(900);
        let maturity_date = match modality {
            Modality::Variable => None,
            _ => Some(start_date + time::Duration::days(self.int_range(365, 1_825))),
        };
        let annual_rate_bps = match modality {
            Modality::Variable => None,
            _ => Some(self.int_range(600, 1_500)),
        };

        ImportedInvestment {
            client: client.to_owned(),
            client_email: String::new(),
            kind,
            modality,
            issuer: self.pick(&ISSUERS).to_owned(),
            principal_cents: self.int_range(1_000, 500_000) * 100,
            annual_rate_bps,
            start_date,
            maturity_date,
            notes: String::new(),
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }

    fn date_before_reference(&mut self, max_days: i64) -> Date {
        reference_date() - time::Duration::days(self.int_range(1, max_days))
    }
}

/// Fluent builder for records handed straight to the view model.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: InvestmentRecord,
}

impl RecordBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            record: InvestmentRecord {
                investment: Investment {
                    id: InvestmentId::new(id),
                    client_id: ClientId::new(1),
                    kind: InvestmentType::Cdb,
                    modality: Modality::Prefixed,
                    issuer: format!("Issuer {id}"),
                    principal_cents: 100_000,
                    annual_rate_bps: None,
                    start_date: reference_date(),
                    maturity_date: None,
                    notes: String::new(),
                    created_at: fixture_datetime(),
                    updated_at: fixture_datetime(),
                    deleted_at: None,
                },
                client_name: None,
                current_value_cents: None,
                yield_cents: None,
                days_held: 0,
            },
        }
    }

    pub fn client(mut self, id: i64, name: &str) -> Self {
        self.record.investment.client_id = ClientId::new(id);
        self.record.client_name = Some(name.to_owned());
        self
    }

    pub fn kind(mut self, kind: InvestmentType) -> Self {
        self.record.investment.kind = kind;
        self
    }

    pub fn modality(mut self, modality: Modality) -> Self {
        self.record.investment.modality = modality;
        self
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.record.investment.issuer = issuer.to_owned();
        self
    }

    pub fn principal(mut self, cents: i64) -> Self {
        self.record.investment.principal_cents = cents;
        self
    }

    pub fn rate(mut self, bps: i64) -> Self {
        self.record.investment.annual_rate_bps = Some(bps);
        self
    }

    pub fn current_value(mut self, cents: i64) -> Self {
        self.record.current_value_cents = Some(cents);
        self.record.yield_cents = Some(cents - self.record.investment.principal_cents);
        self
    }

    pub fn build(self) -> InvestmentRecord {
        self.record
    }
}

pub fn client(id: i64, name: &str) -> Client {
    Client {
        id: ClientId::new(id),
        name: name.to_owned(),
        email: String::new(),
        created_at: fixture_datetime(),
        updated_at: fixture_datetime(),
        deleted_at: None,
    }
}

/// In-memory record source. Repopulating swaps in the staged collection, if any.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub records: Vec<InvestmentRecord>,
    pub clients: Vec<Client>,
    pub staged: Option<Vec<InvestmentRecord>>,
    pub repopulate_calls: usize,
    pub fail_repopulate: bool,
    pub deleted: Vec<InvestmentId>,
    pub fail_delete: bool,
    pub remove_on_delete: bool,
}

impl MemorySource {
    pub fn with_records(records: Vec<InvestmentRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn stage(&mut self, records: Vec<InvestmentRecord>) {
        self.staged = Some(records);
    }
}

impl RecordSource for MemorySource {
    fn current_records(&self) -> &[InvestmentRecord] {
        &self.records
    }

    fn client_directory(&self) -> &[Client] {
        &self.clients
    }

    fn request_repopulate(&mut self) -> Result<()> {
        if self.fail_repopulate {
            bail!("record source unreachable");
        }
        self.repopulate_calls += 1;
        if let Some(staged) = self.staged.take() {
            self.records = staged;
        }
        Ok(())
    }

    fn delete_record(&mut self, id: InvestmentId) -> Result<()> {
        if self.fail_delete {
            bail!("investment {id} is locked");
        }
        self.deleted.push(id);
        if self.remove_on_delete {
            self.records.retain(|record| record.id() != id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub notifications: Vec<Notification>,
}

impl RecordingNotifier {
    pub fn count(&self, kind: NotificationKind) -> usize {
        self.notifications
            .iter()
            .filter(|notification| notification.kind == kind)
            .count()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Replays queued results in order; an empty queue fails.
#[derive(Debug, Default)]
pub struct ScriptedImporter {
    pub results: VecDeque<std::result::Result<ImportSummary, String>>,
    pub calls: Vec<ImportSource>,
}

impl ScriptedImporter {
    pub fn succeeding(imported: usize) -> Self {
        let mut importer = Self::default();
        importer.results.push_back(Ok(ImportSummary {
            imported,
            clients_created: 0,
        }));
        importer
    }

    pub fn failing(message: &str) -> Self {
        let mut importer = Self::default();
        importer.results.push_back(Err(message.to_owned()));
        importer
    }
}

impl Importer for ScriptedImporter {
    fn import_records(&mut self, source: &ImportSource) -> Result<ImportSummary> {
        self.calls.push(source.clone());
        match self.results.pop_front() {
            Some(Ok(summary)) => Ok(summary),
            Some(Err(message)) => Err(anyhow!(message)),
            None => bail!("no scripted import result left"),
        }
    }
}

/// Collects tickets instead of sleeping; tests fire them explicitly.
#[derive(Debug, Default)]
pub struct ManualTimer {
    pub scheduled: Vec<(RefreshTicket, Duration)>,
}

impl ManualTimer {
    /// Drains every scheduled ticket, dropping cancelled ones.
    pub fn fire_all(&mut self) -> Vec<InternalEvent> {
        self.scheduled
            .drain(..)
            .filter(|(ticket, _)| !ticket.is_cancelled())
            .map(|(ticket, _)| ticket.elapsed_event())
            .collect()
    }
}

impl RefreshTimer for ManualTimer {
    fn schedule(&mut self, ticket: RefreshTicket, after: Duration) {
        self.scheduled.push((ticket, after));
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("folio.db");
    Ok((dir, db_path))
}

pub fn reference_date() -> Date {
    date!(2026 - 01 - 01)
}

pub fn fixture_datetime() -> OffsetDateTime {
    reference_date().midnight().assume_utc()
}
