// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use folio_app::{InvestmentRecord, SortDirection, SortField, SortSpec, ViewSnapshot, ViewState};
use std::fmt::Write as _;
use time::Date;
use time::macros::format_description;

const SORT_MARK_ASC: &str = "▲";
const SORT_MARK_DESC: &str = "▼";
const COLUMN_GAP: &str = "  ";

const FULL_COLUMNS: [SortField; 11] = SortField::ALL;
const COMPACT_COLUMNS: [SortField; 4] = [
    SortField::Id,
    SortField::Client,
    SortField::Type,
    SortField::Value,
];

/// Renders one frame of the investment list as plain text.
pub fn render(snapshot: &ViewSnapshot<'_>) -> String {
    let mut out = String::new();
    match snapshot.view_state {
        ViewState::Loading => {
            out.push_str("Loading investments...\n");
            return out;
        }
        ViewState::Empty => {
            out.push_str("No investments yet -- import a file with --import <path>\n");
            return out;
        }
        ViewState::Populated => {}
    }

    let _ = writeln!(out, "{}", snapshot.summary());
    if let Some(line) = filter_line(snapshot) {
        let _ = writeln!(out, "{line}");
    }
    out.push('\n');
    out.push_str(&render_table(snapshot));

    if snapshot.details_visible
        && let Some(record) = snapshot.selected
    {
        out.push('\n');
        out.push_str(&render_details(record));
    }
    out
}

fn filter_line(snapshot: &ViewSnapshot<'_>) -> Option<String> {
    let filter = snapshot.filter;
    if filter.is_empty() {
        return None;
    }
    let mut parts = Vec::with_capacity(filter.active_count());
    if let Some(client_id) = filter.client_id {
        let name = snapshot
            .clients
            .iter()
            .find(|client| client.id == client_id)
            .map_or_else(|| format!("#{client_id}"), |client| client.name.clone());
        parts.push(format!("client={name}"));
    }
    if let Some(kind) = filter.kind {
        parts.push(format!("type={}", kind.label()));
    }
    if let Some(modality) = filter.modality {
        parts.push(format!("modality={}", modality.label()));
    }
    Some(format!(
        "filtered from {} by {}",
        snapshot.total_records,
        parts.join(" ")
    ))
}

fn render_table(snapshot: &ViewSnapshot<'_>) -> String {
    let columns: &[SortField] = if snapshot.compact {
        &COMPACT_COLUMNS
    } else {
        &FULL_COLUMNS
    };

    let header: Vec<String> = columns
        .iter()
        .map(|field| header_label(*field, snapshot.sort))
        .collect();
    let rows: Vec<Vec<String>> = snapshot
        .visible_rows
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|field| cell(record, *field, snapshot.compact))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|label| label.chars().count()).collect();
    for row in &rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, columns, &header, &widths);
    for row in &rows {
        push_row(&mut out, columns, row, &widths);
    }
    out
}

fn push_row(out: &mut String, columns: &[SortField], values: &[String], widths: &[usize]) {
    let cells: Vec<String> = columns
        .iter()
        .zip(values)
        .zip(widths)
        .map(|((field, value), width)| {
            if is_numeric(*field) {
                format!("{value:>width$}")
            } else {
                format!("{value:<width$}")
            }
        })
        .collect();
    let _ = writeln!(out, "{}", cells.join(COLUMN_GAP).trim_end());
}

fn header_label(field: SortField, sort: Option<SortSpec>) -> String {
    let label = column_label(field);
    match sort {
        Some(spec) if spec.field == field => {
            let mark = match spec.direction {
                SortDirection::Asc => SORT_MARK_ASC,
                SortDirection::Desc => SORT_MARK_DESC,
            };
            format!("{label} {mark}")
        }
        _ => label.to_owned(),
    }
}

const fn column_label(field: SortField) -> &'static str {
    match field {
        SortField::Id => "ID",
        SortField::Client => "Client",
        SortField::Type => "Type",
        SortField::Modality => "Modality",
        SortField::Issuer => "Issuer",
        SortField::Principal => "Principal",
        SortField::Rate => "Rate",
        SortField::Start => "Start",
        SortField::Maturity => "Maturity",
        SortField::Value => "Value",
        SortField::Yield => "Yield",
    }
}

const fn is_numeric(field: SortField) -> bool {
    matches!(
        field,
        SortField::Id
            | SortField::Principal
            | SortField::Rate
            | SortField::Value
            | SortField::Yield
    )
}

fn cell(record: &InvestmentRecord, field: SortField, compact: bool) -> String {
    let investment = &record.investment;
    let money = if compact {
        format_compact_cents
    } else {
        format_cents
    };
    match field {
        SortField::Id => investment.id.to_string(),
        SortField::Client => record.client_name.clone().unwrap_or_default(),
        SortField::Type => investment.kind.label().to_owned(),
        SortField::Modality => investment.modality.label().to_owned(),
        SortField::Issuer => investment.issuer.clone(),
        SortField::Principal => money(investment.principal_cents),
        SortField::Rate => investment.annual_rate_bps.map(format_rate).unwrap_or_default(),
        SortField::Start => format_date(Some(investment.start_date)),
        SortField::Maturity => format_date(investment.maturity_date),
        SortField::Value => record.current_value_cents.map(money).unwrap_or_default(),
        SortField::Yield => record.yield_cents.map(money).unwrap_or_default(),
    }
}

fn render_details(record: &InvestmentRecord) -> String {
    let investment = &record.investment;
    let mut out = String::new();
    let _ = writeln!(out, "Investment #{}", investment.id);
    let fields = [
        ("Client", record.client_name.clone().unwrap_or_default()),
        ("Type", investment.kind.label().to_owned()),
        ("Modality", investment.modality.label().to_owned()),
        ("Issuer", investment.issuer.clone()),
        ("Principal", format_cents(investment.principal_cents)),
        (
            "Rate",
            investment.annual_rate_bps.map(format_rate).unwrap_or_default(),
        ),
        ("Start", format_date(Some(investment.start_date))),
        ("Maturity", format_date(investment.maturity_date)),
        ("Days held", record.days_held.to_string()),
        (
            "Value",
            record.current_value_cents.map(format_cents).unwrap_or_default(),
        ),
        ("Yield", record.yield_cents.map(format_cents).unwrap_or_default()),
        ("Notes", investment.notes.clone()),
    ];
    for (label, value) in fields {
        if value.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {label:<10} {value}");
    }
    out
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let whole = absolute / 100;
    let remainder = absolute % 100;
    format!("{sign}R${}.{remainder:02}", group_thousands(whole))
}

pub fn format_compact_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let units = (cents.unsigned_abs() as f64) / 100.0;
    if units < 1000.0 {
        return format!("{sign}R${units:.2}");
    }

    // The suffix follows the rounded value: 999.95k renders as 1M.
    let thousands = (units / 100.0).round() / 10.0;
    let (rounded, suffix) = if thousands < 1000.0 {
        (thousands, "k")
    } else {
        ((units / 100_000.0).round() / 10.0, "M")
    };

    if rounded.fract().abs() < f64::EPSILON {
        format!("{sign}R${rounded:.0}{suffix}")
    } else {
        format!("{sign}R${rounded:.1}{suffix}")
    }
}

pub fn format_rate(bps: i64) -> String {
    format!("{}.{:02}%", bps / 100, (bps % 100).abs())
}

fn format_date(value: Option<Date>) -> String {
    value
        .and_then(|date| date.format(&format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_default()
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{format_cents, format_compact_cents, format_rate, render};
    use folio_app::{
        FilterSelection, InvestmentType, SortDirection, SortField, SortSpec, ViewSnapshot,
        ViewState,
    };
    use folio_testkit::{RecordBuilder, client};

    fn snapshot<'a>(
        rows: Vec<&'a folio_app::InvestmentRecord>,
        clients: &'a [folio_app::Client],
    ) -> ViewSnapshot<'a> {
        ViewSnapshot {
            total_records: rows.len(),
            visible_rows: rows,
            view_state: ViewState::Populated,
            filter: FilterSelection::default(),
            sort: None,
            selected: None,
            details_visible: false,
            compact: false,
            clients,
        }
    }

    #[test]
    fn money_formats_group_thousands() {
        assert_eq!(format_cents(0), "R$0.00");
        assert_eq!(format_cents(123_456), "R$1,234.56");
        assert_eq!(format_cents(-500), "-R$5.00");
        assert_eq!(format_cents(100_000_000), "R$1,000,000.00");
    }

    #[test]
    fn compact_money_uses_suffixes() {
        assert_eq!(format_compact_cents(99_900), "R$999.00");
        assert_eq!(format_compact_cents(1_500_000), "R$15k");
        assert_eq!(format_compact_cents(1_234_567), "R$12.3k");
        assert_eq!(format_compact_cents(250_000_000), "R$2.5M");
    }

    #[test]
    fn compact_money_promotes_suffix_after_rounding() {
        assert_eq!(format_compact_cents(99_940_000), "R$999.4k");
        assert_eq!(format_compact_cents(99_999_999), "R$1M");
        assert_eq!(format_compact_cents(-99_999_999), "-R$1M");
    }

    #[test]
    fn rate_formats_basis_points() {
        assert_eq!(format_rate(1_250), "12.50%");
        assert_eq!(format_rate(5), "0.05%");
    }

    #[test]
    fn loading_and_empty_states_hide_the_table() {
        let mut view = snapshot(Vec::new(), &[]);
        view.view_state = ViewState::Loading;
        assert_eq!(render(&view), "Loading investments...\n");

        view.view_state = ViewState::Empty;
        assert!(render(&view).starts_with("No investments yet"));
    }

    #[test]
    fn populated_render_lists_rows_in_order() {
        let first = RecordBuilder::new(2)
            .client(1, "Ana Souza")
            .issuer("Caixa")
            .principal(50_000)
            .build();
        let second = RecordBuilder::new(1)
            .client(1, "Ana Souza")
            .issuer("Banco Inter")
            .principal(100_000)
            .build();
        let mut view = snapshot(vec![&first, &second], &[]);
        view.sort = Some(SortSpec {
            field: SortField::Principal,
            direction: SortDirection::Asc,
        });

        let text = render(&view);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "2 investment(s) found");
        assert!(lines[2].contains("Principal ▲"));
        assert!(lines[3].contains("Caixa"));
        assert!(lines[4].contains("Banco Inter"));
    }

    #[test]
    fn compact_render_drops_detail_columns() {
        let record = RecordBuilder::new(1).issuer("Caixa").build();
        let mut view = snapshot(vec![&record], &[]);
        view.compact = true;
        let text = render(&view);
        assert!(!text.contains("Issuer"));
        assert!(!text.contains("Caixa"));
        assert!(text.contains("Value"));
    }

    #[test]
    fn filter_line_names_the_client() {
        let clients = [client(7, "Bruno Lima")];
        let record = RecordBuilder::new(1)
            .client(7, "Bruno Lima")
            .kind(InvestmentType::Lci)
            .build();
        let mut view = snapshot(vec![&record], &clients);
        view.total_records = 3;
        view.filter.client_id = Some(clients[0].id);
        view.filter.kind = Some(InvestmentType::Lci);

        let text = render(&view);
        assert!(text.contains("filtered from 3 by client=Bruno Lima type=LCI"));
    }

    #[test]
    fn details_render_when_visible() {
        let record = RecordBuilder::new(4).issuer("Tesouro Nacional").build();
        let mut view = snapshot(vec![&record], &[]);
        view.selected = Some(&record);
        view.details_visible = true;
        let text = render(&view);
        assert!(text.contains("Investment #4"));
        assert!(text.contains("Issuer     Tesouro Nacional"));
    }
}
