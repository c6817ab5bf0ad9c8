// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{ClientId, InvestmentType, Modality};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFormInput {
    pub name: String,
    pub email: String,
}

impl ClientFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("client name is required -- enter a name and retry");
        }
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvestmentFormInput {
    pub client_id: ClientId,
    pub kind: InvestmentType,
    pub modality: Modality,
    pub issuer: String,
    pub principal_cents: i64,
    pub annual_rate_bps: Option<i64>,
    pub start_date: Date,
    pub maturity_date: Option<Date>,
    pub notes: String,
}

impl InvestmentFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.client_id.get() <= 0 {
            bail!("investment client is required -- choose a client and retry");
        }
        validate_terms(
            &self.issuer,
            self.principal_cents,
            self.annual_rate_bps,
            self.start_date,
            self.maturity_date,
        )
    }
}

/// One row of an import payload. Export writes a superset of these fields,
/// so exported files import cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedInvestment {
    pub client: String,
    #[serde(default)]
    pub client_email: String,
    pub kind: InvestmentType,
    pub modality: Modality,
    pub issuer: String,
    pub principal_cents: i64,
    #[serde(default)]
    pub annual_rate_bps: Option<i64>,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(default, with = "iso_date::option")]
    pub maturity_date: Option<Date>,
    #[serde(default)]
    pub notes: String,
}

impl ImportedInvestment {
    pub fn validate(&self) -> Result<()> {
        if self.client.trim().is_empty() {
            bail!("client name is required");
        }
        validate_email(&self.client_email)?;
        validate_terms(
            &self.issuer,
            self.principal_cents,
            self.annual_rate_bps,
            self.start_date,
            self.maturity_date,
        )
    }
}

fn validate_email(email: &str) -> Result<()> {
    if !email.is_empty() && !email.contains('@') {
        bail!("client email {email:?} is not an address");
    }
    Ok(())
}

fn validate_terms(
    issuer: &str,
    principal_cents: i64,
    annual_rate_bps: Option<i64>,
    start_date: Date,
    maturity_date: Option<Date>,
) -> Result<()> {
    if issuer.trim().is_empty() {
        bail!("investment issuer is required -- enter the issuing institution");
    }
    if principal_cents <= 0 {
        bail!("investment principal must be positive, got {principal_cents}");
    }
    if let Some(rate) = annual_rate_bps
        && rate < 0
    {
        bail!("investment rate cannot be negative, got {rate} bps");
    }
    if let Some(maturity) = maturity_date
        && maturity < start_date
    {
        bail!("investment maturity {maturity} is before start date {start_date}");
    }
    Ok(())
}
