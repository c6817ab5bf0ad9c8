// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use folio_app::{
    Client, ImportSource, ImportSummary, ImportedInvestment, Importer, InvestmentId,
    InvestmentRecord, RecordSource,
};
use std::fs;
use time::Date;
use tracing::{debug, info, warn};

use crate::{Store, import_checksum};

/// Record collection backed by the store. Repopulating reloads every live
/// investment with accruals computed as of a fixed date.
pub struct StoreRecordSource<'a> {
    store: &'a Store,
    as_of: Date,
    records: Vec<InvestmentRecord>,
    clients: Vec<Client>,
}

impl<'a> StoreRecordSource<'a> {
    /// Starts empty; the first repopulate request loads the store.
    pub fn new(store: &'a Store, as_of: Date) -> Self {
        Self {
            store,
            as_of,
            records: Vec::new(),
            clients: Vec::new(),
        }
    }

    pub fn as_of(&self) -> Date {
        self.as_of
    }

    fn reload(&mut self) -> Result<()> {
        self.records = self.store.list_investment_records(self.as_of)?;
        self.clients = self.store.list_clients(false)?;
        debug!(
            records = self.records.len(),
            clients = self.clients.len(),
            "records reloaded"
        );
        Ok(())
    }
}

impl RecordSource for StoreRecordSource<'_> {
    fn current_records(&self) -> &[InvestmentRecord] {
        &self.records
    }

    fn client_directory(&self) -> &[Client] {
        &self.clients
    }

    fn request_repopulate(&mut self) -> Result<()> {
        self.reload().context("reload investments")
    }

    /// The delete is committed before the reload, so a failed reload keeps
    /// the stale list and reports success; the next refresh picks it up.
    fn delete_record(&mut self, id: InvestmentId) -> Result<()> {
        self.store.soft_delete_investment(id)?;
        if let Err(error) = self.reload() {
            let reason = format!("{error:#}");
            warn!(%id, %reason, "investment deleted but list reload failed");
            self.records.retain(|record| record.id() != id);
        }
        Ok(())
    }
}

pub struct StoreImporter<'a> {
    store: &'a Store,
}

impl<'a> StoreImporter<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl Importer for StoreImporter<'_> {
    fn import_records(&mut self, source: &ImportSource) -> Result<ImportSummary> {
        let payload = match source {
            ImportSource::Path(path) => fs::read_to_string(path)
                .with_context(|| format!("read import file {}", path.display()))?,
            ImportSource::Inline(text) => text.clone(),
        };

        let rows = parse_import_payload(&payload)?;
        let checksum = import_checksum(payload.as_bytes());
        info!(
            source = %source.describe(),
            rows = rows.len(),
            "importing investments"
        );
        self.store.import_investments(&rows, &checksum)
    }
}

/// Parses a JSON array of investment rows. Row validation happens in
/// [`Store::import_investments`].
pub fn parse_import_payload(payload: &str) -> Result<Vec<ImportedInvestment>> {
    let rows: Vec<ImportedInvestment> =
        serde_json::from_str(payload).context("parse import payload as a JSON array")?;
    if rows.is_empty() {
        anyhow::bail!("import payload has no rows -- add at least one investment and retry");
    }
    Ok(rows)
}
