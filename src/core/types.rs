use serde::Serialize;

/// Inputs of a single projection. Rates are decimal fractions (0.07 = 7%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    pub age_now: u32,
    pub age_retirement: u32,
    pub age_death: u32,
    pub initial_capital: f64,
    /// Monthly contribution at `age_now`; grows yearly by `savings_growth_rate`.
    pub monthly_savings: f64,
    pub return_rate: f64,
    pub savings_growth_rate: f64,
    /// Escalates withdrawals and converts nominal income to today's money.
    pub inflation_rate: f64,
}

impl ClientData {
    pub fn annual_savings(&self) -> f64 {
        self.monthly_savings * 12.0
    }

    pub fn accumulation_years(&self) -> u32 {
        self.age_retirement.saturating_sub(self.age_now)
    }

    pub fn distribution_years(&self) -> u32 {
        self.age_death.saturating_add(1).saturating_sub(self.age_retirement)
    }
}

/// One simulated year of the capital ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowData {
    pub age: u32,
    pub capital_year_start: f64,
    pub interest: f64,
    /// Contribution (positive) or withdrawal (negative) for the year.
    pub saved: f64,
    pub capital_year_end: f64,
    pub saved_pp_monthly: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapitalPoint {
    pub age: u32,
    pub capital: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    pub client: ClientData,
    pub accumulation_years: u32,
    pub distribution_years: u32,
    pub capital_at_retirement: f64,
    pub first_withdrawal: f64,
    pub monthly_passive_income: f64,
    pub monthly_passive_income_rounded: f64,
    pub rows: Vec<TableRowData>,
}

/// Highest age the engine projects; keeps every period count well inside `i32`.
pub const MAX_SUPPORTED_AGE: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("withdrawal schedule over {periods} period(s) has a zero denominator")]
    DivisionByZero { periods: u32 },
    #[error("{label} age {age} exceeds the supported maximum of {max}")]
    AgeOutOfRange {
        label: &'static str,
        age: u32,
        max: u32,
    },
    #[error("{later_label} age {later} precedes {earlier_label} age {earlier}")]
    AgeOrder {
        earlier_label: &'static str,
        earlier: u32,
        later_label: &'static str,
        later: u32,
    },
}
