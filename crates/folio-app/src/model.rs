// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    Cdb,
    Lci,
    Lca,
    TesouroDireto,
    Debenture,
    Fund,
    Stock,
    Other,
}

impl InvestmentType {
    pub const ALL: [Self; 8] = [
        Self::Cdb,
        Self::Lci,
        Self::Lca,
        Self::TesouroDireto,
        Self::Debenture,
        Self::Fund,
        Self::Stock,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cdb => "cdb",
            Self::Lci => "lci",
            Self::Lca => "lca",
            Self::TesouroDireto => "tesouro_direto",
            Self::Debenture => "debenture",
            Self::Fund => "fund",
            Self::Stock => "stock",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cdb" => Some(Self::Cdb),
            "lci" => Some(Self::Lci),
            "lca" => Some(Self::Lca),
            "tesouro_direto" => Some(Self::TesouroDireto),
            "debenture" => Some(Self::Debenture),
            "fund" => Some(Self::Fund),
            "stock" => Some(Self::Stock),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cdb => "CDB",
            Self::Lci => "LCI",
            Self::Lca => "LCA",
            Self::TesouroDireto => "Tesouro Direto",
            Self::Debenture => "Debenture",
            Self::Fund => "Fund",
            Self::Stock => "Stock",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Prefixed,
    Postfixed,
    InflationLinked,
    Variable,
}

impl Modality {
    pub const ALL: [Self; 4] = [
        Self::Prefixed,
        Self::Postfixed,
        Self::InflationLinked,
        Self::Variable,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prefixed => "prefixed",
            Self::Postfixed => "postfixed",
            Self::InflationLinked => "inflation_linked",
            Self::Variable => "variable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "prefixed" => Some(Self::Prefixed),
            "postfixed" => Some(Self::Postfixed),
            "inflation_linked" => Some(Self::InflationLinked),
            "variable" => Some(Self::Variable),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Prefixed => "pre-fixed",
            Self::Postfixed => "post-fixed",
            Self::InflationLinked => "inflation",
            Self::Variable => "variable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investment {
    pub id: InvestmentId,
    pub client_id: ClientId,
    pub kind: InvestmentType,
    pub modality: Modality,
    pub issuer: String,
    pub principal_cents: i64,
    /// Annual rate in basis points (1250 = 12.50% a.a.).
    pub annual_rate_bps: Option<i64>,
    pub start_date: Date,
    pub maturity_date: Option<Date>,
    pub notes: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

/// An investment joined with the fields the record source derives for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub investment: Investment,
    pub client_name: Option<String>,
    pub current_value_cents: Option<i64>,
    pub yield_cents: Option<i64>,
    pub days_held: i64,
}

impl InvestmentRecord {
    pub fn id(&self) -> InvestmentId {
        self.investment.id
    }

    pub fn client_id(&self) -> ClientId {
        self.investment.client_id
    }

    pub fn kind(&self) -> InvestmentType {
        self.investment.kind
    }

    pub fn modality(&self) -> Modality {
        self.investment.modality
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewState {
    Loading,
    Empty,
    Populated,
}

impl ViewState {
    /// Loading wins over everything; otherwise the record count decides.
    pub const fn derive(pending: bool, record_count: usize) -> Self {
        if pending {
            Self::Loading
        } else if record_count == 0 {
            Self::Empty
        } else {
            Self::Populated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Error,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}
