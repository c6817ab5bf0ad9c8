// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use folio_app::{Investment, InvestmentRecord};
use time::Date;

const DAYS_PER_YEAR: f64 = 365.0;
const BPS_PER_UNIT: f64 = 10_000.0;

/// Days between start and the earlier of `as_of` and maturity, never negative.
pub fn days_held(start: Date, maturity: Option<Date>, as_of: Date) -> i64 {
    let end = match maturity {
        Some(maturity) if maturity < as_of => maturity,
        _ => as_of,
    };
    (end - start).whole_days().max(0)
}

/// Compounds annually-quoted `rate_bps` over `days`. No rate, no value.
pub fn accrued_value_cents(principal_cents: i64, rate_bps: Option<i64>, days: i64) -> Option<i64> {
    let rate = rate_bps? as f64 / BPS_PER_UNIT;
    let factor = (1.0 + rate).powf(days as f64 / DAYS_PER_YEAR);
    Some((principal_cents as f64 * factor).round() as i64)
}

pub fn investment_record(
    investment: Investment,
    client_name: Option<String>,
    as_of: Date,
) -> InvestmentRecord {
    let days = days_held(investment.start_date, investment.maturity_date, as_of);
    let current_value_cents =
        accrued_value_cents(investment.principal_cents, investment.annual_rate_bps, days);
    let yield_cents = current_value_cents.map(|value| value - investment.principal_cents);
    InvestmentRecord {
        investment,
        client_name,
        current_value_cents,
        yield_cents,
        days_held: days,
    }
}
