// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use folio_app::{Client, ClientId, ImportedInvestment, InvestmentId, InvestmentRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// An exported row is an import row plus its id and derived values, so an
/// export file can be fed back into another database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedInvestment {
    pub id: InvestmentId,
    #[serde(flatten)]
    pub row: ImportedInvestment,
    pub current_value_cents: Option<i64>,
    pub yield_cents: Option<i64>,
    pub days_held: i64,
}

impl ExportedInvestment {
    pub fn from_record(record: &InvestmentRecord, client_email: &str) -> Self {
        let investment = &record.investment;
        Self {
            id: investment.id,
            row: ImportedInvestment {
                client: record
                    .client_name
                    .clone()
                    .unwrap_or_else(|| format!("client {}", investment.client_id)),
                client_email: client_email.to_owned(),
                kind: investment.kind,
                modality: investment.modality,
                issuer: investment.issuer.clone(),
                principal_cents: investment.principal_cents,
                annual_rate_bps: investment.annual_rate_bps,
                start_date: investment.start_date,
                maturity_date: investment.maturity_date,
                notes: investment.notes.clone(),
            },
            current_value_cents: record.current_value_cents,
            yield_cents: record.yield_cents,
            days_held: record.days_held,
        }
    }
}

/// Writes `records` in the given order as a pretty JSON array.
pub fn export_json<W: Write>(
    records: &[&InvestmentRecord],
    clients: &[Client],
    mut writer: W,
) -> Result<usize> {
    let emails: BTreeMap<ClientId, &str> = clients
        .iter()
        .map(|client| (client.id, client.email.as_str()))
        .collect();
    let rows: Vec<ExportedInvestment> = records
        .iter()
        .map(|record| {
            let email = emails.get(&record.client_id()).copied().unwrap_or("");
            ExportedInvestment::from_record(record, email)
        })
        .collect();

    serde_json::to_writer_pretty(&mut writer, &rows).context("serialize export")?;
    writer.write_all(b"\n").context("finish export")?;
    Ok(rows.len())
}
