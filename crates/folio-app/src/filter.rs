// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::{ClientId, InvestmentRecord, InvestmentType, Modality};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterDimension {
    Client,
    Type,
    Modality,
}

impl FilterDimension {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Type => "type",
            Self::Modality => "modality",
        }
    }
}

/// A change to exactly one filter dimension. `None` clears that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterUpdate {
    Client(Option<ClientId>),
    Type(Option<InvestmentType>),
    Modality(Option<Modality>),
}

impl FilterUpdate {
    pub const fn dimension(self) -> FilterDimension {
        match self {
            Self::Client(_) => FilterDimension::Client,
            Self::Type(_) => FilterDimension::Type,
            Self::Modality(_) => FilterDimension::Modality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    pub client_id: Option<ClientId>,
    pub kind: Option<InvestmentType>,
    pub modality: Option<Modality>,
}

impl FilterSelection {
    pub fn set(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Client(value) => self.client_id = value,
            FilterUpdate::Type(value) => self.kind = value,
            FilterUpdate::Modality(value) => self.modality = value,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    pub fn active_count(&self) -> usize {
        usize::from(self.client_id.is_some())
            + usize::from(self.kind.is_some())
            + usize::from(self.modality.is_some())
    }

    pub fn matches(&self, record: &InvestmentRecord) -> bool {
        self.client_id.is_none_or(|id| record.client_id() == id)
            && self.kind.is_none_or(|kind| record.kind() == kind)
            && self
                .modality
                .is_none_or(|modality| record.modality() == modality)
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterDimension, FilterSelection, FilterUpdate};
    use crate::{
        ClientId, Investment, InvestmentId, InvestmentRecord, InvestmentType, Modality,
    };
    use time::OffsetDateTime;
    use time::macros::date;

    fn record(id: i64, client: i64, kind: InvestmentType, modality: Modality) -> InvestmentRecord {
        InvestmentRecord {
            investment: Investment {
                id: InvestmentId::new(id),
                client_id: ClientId::new(client),
                kind,
                modality,
                issuer: format!("issuer {id}"),
                principal_cents: 10_000,
                annual_rate_bps: None,
                start_date: date!(2025 - 01 - 02),
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

    fn sample() -> Vec<InvestmentRecord> {
        vec![
            record(1, 1, InvestmentType::Cdb, Modality::Prefixed),
            record(2, 1, InvestmentType::Lci, Modality::Postfixed),
            record(3, 2, InvestmentType::Cdb, Modality::Postfixed),
            record(4, 3, InvestmentType::Stock, Modality::Variable),
        ]
    }

    fn matched(filter: &FilterSelection, records: &[InvestmentRecord]) -> Vec<i64> {
        records
            .iter()
            .filter(|record| filter.matches(record))
            .map(|record| record.id().get())
            .collect()
    }

    #[test]
    fn empty_selection_matches_everything() {
        let filter = FilterSelection::default();
        assert!(filter.is_empty());
        assert_eq!(matched(&filter, &sample()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn set_touches_only_the_named_dimension() {
        let mut filter = FilterSelection::default();
        filter.set(FilterUpdate::Client(Some(ClientId::new(1))));
        filter.set(FilterUpdate::Type(Some(InvestmentType::Cdb)));
        filter.set(FilterUpdate::Modality(Some(Modality::Prefixed)));

        filter.set(FilterUpdate::Type(None));
        assert_eq!(filter.client_id, Some(ClientId::new(1)));
        assert_eq!(filter.kind, None);
        assert_eq!(filter.modality, Some(Modality::Prefixed));
        assert_eq!(filter.active_count(), 2);
    }

    #[test]
    fn set_dimensions_require_exact_equality() {
        let mut filter = FilterSelection::default();
        filter.set(FilterUpdate::Type(Some(InvestmentType::Cdb)));
        assert_eq!(matched(&filter, &sample()), vec![1, 3]);

        filter.set(FilterUpdate::Modality(Some(Modality::Postfixed)));
        assert_eq!(matched(&filter, &sample()), vec![3]);
    }

    #[test]
    fn unmatched_value_yields_empty_result() {
        let mut filter = FilterSelection::default();
        filter.set(FilterUpdate::Client(Some(ClientId::new(999))));
        assert!(matched(&filter, &sample()).is_empty());
    }

    #[test]
    fn adding_constraints_never_grows_the_match_set() {
        let records = sample();
        let updates = [
            FilterUpdate::Client(Some(ClientId::new(1))),
            FilterUpdate::Type(Some(InvestmentType::Cdb)),
            FilterUpdate::Modality(Some(Modality::Prefixed)),
        ];

        let mut filter = FilterSelection::default();
        let mut previous = matched(&filter, &records);
        for update in updates {
            filter.set(update);
            let current = matched(&filter, &records);
            assert!(current.iter().all(|id| previous.contains(id)), "{update:?}");
            previous = current;
        }

        for dimension in [
            FilterUpdate::Client(None),
            FilterUpdate::Type(None),
            FilterUpdate::Modality(None),
        ] {
            filter.set(dimension);
            let current = matched(&filter, &records);
            assert!(previous.iter().all(|id| current.contains(id)), "{dimension:?}");
            previous = current;
        }
        assert_eq!(previous, vec![1, 2, 3, 4]);
    }

    #[test]
    fn update_reports_its_dimension() {
        assert_eq!(
            FilterUpdate::Modality(None).dimension(),
            FilterDimension::Modality
        );
        assert_eq!(FilterDimension::Client.label(), "client");
    }
}
