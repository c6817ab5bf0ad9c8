// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::Date;

use crate::{InvestmentRecord, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    Id,
    Client,
    Type,
    Modality,
    Issuer,
    Principal,
    Rate,
    Start,
    Maturity,
    Value,
    Yield,
}

impl SortField {
    pub const ALL: [Self; 11] = [
        Self::Id,
        Self::Client,
        Self::Type,
        Self::Modality,
        Self::Issuer,
        Self::Principal,
        Self::Rate,
        Self::Start,
        Self::Maturity,
        Self::Value,
        Self::Yield,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Client => "client",
            Self::Type => "type",
            Self::Modality => "modality",
            Self::Issuer => "issuer",
            Self::Principal => "principal",
            Self::Rate => "rate",
            Self::Start => "start",
            Self::Maturity => "maturity",
            Self::Value => "value",
            Self::Yield => "yield",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == value)
    }

    pub fn key(self, record: &InvestmentRecord) -> SortKey {
        let investment = &record.investment;
        match self {
            Self::Id => SortKey::Number(investment.id.get()),
            Self::Client => record
                .client_name
                .as_deref()
                .map_or(SortKey::Missing, SortKey::text),
            Self::Type => SortKey::text(investment.kind.label()),
            Self::Modality => SortKey::text(investment.modality.label()),
            Self::Issuer => SortKey::text(&investment.issuer),
            Self::Principal => SortKey::Number(investment.principal_cents),
            Self::Rate => investment
                .annual_rate_bps
                .map_or(SortKey::Missing, SortKey::Number),
            Self::Start => SortKey::Date(investment.start_date),
            Self::Maturity => investment
                .maturity_date
                .map_or(SortKey::Missing, SortKey::Date),
            Self::Value => record
                .current_value_cents
                .map_or(SortKey::Missing, SortKey::Number),
            Self::Yield => record.yield_cents.map_or(SortKey::Missing, SortKey::Number),
        }
    }
}

/// A comparable projection of one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Number(i64),
    /// Already case-normalized.
    Text(String),
    Date(Date),
    Missing,
}

impl SortKey {
    fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }

    fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(left), Self::Number(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    spec: Option<SortSpec>,
}

impl SortState {
    pub fn spec(&self) -> Option<SortSpec> {
        self.spec
    }

    /// Same field flips direction; a new field starts ascending.
    pub fn set_sort(&mut self, field: SortField) -> SortSpec {
        let next = match self.spec {
            Some(current) if current.field == field => SortSpec {
                field,
                direction: current.direction.toggled(),
            },
            _ => SortSpec {
                field,
                direction: SortDirection::Asc,
            },
        };
        self.spec = Some(next);
        next
    }

    pub fn clear(&mut self) {
        self.spec = None;
    }

    pub fn compare(&self, left: &InvestmentRecord, right: &InvestmentRecord) -> Ordering {
        match self.spec {
            Some(spec) => compare_by(spec, left, right),
            None => Ordering::Equal,
        }
    }

    /// Stable: rows with equal keys keep their input order in both directions.
    pub fn apply(&self, rows: &mut [&InvestmentRecord]) {
        if let Some(spec) = self.spec {
            rows.sort_by(|left, right| compare_by(spec, left, right));
        }
    }
}

fn compare_by(spec: SortSpec, left: &InvestmentRecord, right: &InvestmentRecord) -> Ordering {
    let left_key = spec.field.key(left);
    let right_key = spec.field.key(right);
    match (left_key.is_missing(), right_key.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match spec.direction {
            SortDirection::Asc => left_key.cmp_value(&right_key),
            SortDirection::Desc => left_key.cmp_value(&right_key).reverse(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{SortField, SortKey, SortSpec, SortState};
    use crate::{
        ClientId, Investment, InvestmentId, InvestmentRecord, InvestmentType, Modality,
        SortDirection,
    };
    use std::cmp::Ordering;
    use time::OffsetDateTime;
    use time::macros::date;

    fn record(id: i64, principal_cents: i64) -> InvestmentRecord {
        InvestmentRecord {
            investment: Investment {
                id: InvestmentId::new(id),
                client_id: ClientId::new(1),
                kind: InvestmentType::Cdb,
                modality: Modality::Prefixed,
                issuer: format!("Bank {id}"),
                principal_cents,
                annual_rate_bps: None,
                start_date: date!(2025 - 03 - 01),
                maturity_date: None,
                notes: String::new(),
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
                deleted_at: None,
            },
            client_name: None,
            current_value_cents: None,
            yield_cents: None,
            days_held: 0,
        }
    }

    fn ids(rows: &[&InvestmentRecord]) -> Vec<i64> {
        rows.iter().map(|record| record.id().get()).collect()
    }

    #[test]
    fn new_field_starts_ascending_and_same_field_toggles() {
        let mut state = SortState::default();
        assert_eq!(state.spec(), None);

        let first = state.set_sort(SortField::Principal);
        assert_eq!(first.direction, SortDirection::Asc);
        let second = state.set_sort(SortField::Principal);
        assert_eq!(second.direction, SortDirection::Desc);
        let third = state.set_sort(SortField::Principal);
        assert_eq!(third.direction, SortDirection::Asc);

        state.set_sort(SortField::Principal);
        let switched = state.set_sort(SortField::Issuer);
        assert_eq!(
            switched,
            SortSpec {
                field: SortField::Issuer,
                direction: SortDirection::Asc,
            }
        );
    }

    #[test]
    fn numeric_values_sort_numerically() {
        let records = [record(1, 10_000), record(2, 5_000), record(3, 900)];
        let mut state = SortState::default();
        state.set_sort(SortField::Principal);

        let mut rows: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![3, 2, 1]);

        state.set_sort(SortField::Principal);
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![1, 2, 3]);
    }

    #[test]
    fn text_values_compare_case_insensitively() {
        let mut lower = record(1, 1);
        lower.investment.issuer = "banco inter".to_owned();
        let mut upper = record(2, 1);
        upper.investment.issuer = "Banco do Brasil".to_owned();
        let mut mixed = record(3, 1);
        mixed.investment.issuer = "BTG".to_owned();

        let records = [lower, upper, mixed];
        let mut state = SortState::default();
        state.set_sort(SortField::Issuer);
        let mut rows: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![2, 1, 3]);
    }

    #[test]
    fn dates_sort_chronologically() {
        let mut late = record(1, 1);
        late.investment.start_date = date!(2025 - 12 - 01);
        let mut early = record(2, 1);
        early.investment.start_date = date!(2024 - 02 - 29);

        let records = [late, early];
        let mut state = SortState::default();
        state.set_sort(SortField::Start);
        let mut rows: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![2, 1]);
    }

    #[test]
    fn missing_values_sort_last_in_both_directions() {
        let mut with_rate = record(1, 1);
        with_rate.investment.annual_rate_bps = Some(1_100);
        let without_rate = record(2, 1);
        let mut higher_rate = record(3, 1);
        higher_rate.investment.annual_rate_bps = Some(1_350);

        let records = [without_rate, with_rate, higher_rate];
        let mut state = SortState::default();
        state.set_sort(SortField::Rate);
        let mut rows: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![1, 3, 2]);

        state.set_sort(SortField::Rate);
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![3, 1, 2]);
    }

    #[test]
    fn ties_keep_input_order_in_both_directions() {
        let records = [
            record(1, 500),
            record(2, 100),
            record(3, 500),
            record(4, 100),
            record(5, 500),
        ];
        let mut state = SortState::default();

        state.set_sort(SortField::Principal);
        let mut ascending: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut ascending);
        assert_eq!(ids(&ascending), vec![2, 4, 1, 3, 5]);

        state.set_sort(SortField::Principal);
        let mut descending: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut descending);
        assert_eq!(ids(&descending), vec![1, 3, 5, 2, 4]);
    }

    #[test]
    fn no_spec_leaves_order_untouched() {
        let records = [record(2, 1), record(1, 2)];
        let state = SortState::default();
        let mut rows: Vec<&InvestmentRecord> = records.iter().collect();
        state.apply(&mut rows);
        assert_eq!(ids(&rows), vec![2, 1]);
        assert_eq!(state.compare(&records[0], &records[1]), Ordering::Equal);
    }

    #[test]
    fn field_tokens_parse() {
        for field in SortField::ALL {
            assert_eq!(SortField::parse(field.as_str()), Some(field));
        }
        assert_eq!(SortField::parse("valor"), None);
        assert_eq!(SortField::Rate.key(&record(1, 1)), SortKey::Missing);
    }
}
