use super::annuity::{future_value, initial_withdrawal};
use super::types::{
    CapitalPoint, ClientData, MAX_SUPPORTED_AGE, ProjectionError, ProjectionReport, TableRowData,
};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Capital at retirement and the first withdrawal that spends it down by the
/// death age. Both entry points derive their numbers from this step.
#[derive(Debug, Clone, Copy)]
struct RetirementPlan {
    accumulation_years: u32,
    distribution_years: u32,
    capital_at_retirement: f64,
    first_withdrawal: f64,
}

impl RetirementPlan {
    fn for_client(client: &ClientData) -> Result<Self, ProjectionError> {
        check_age_order(client)?;
        let accumulation_years = client.accumulation_years();
        // Zero when death precedes retirement by one year; the solver rejects it.
        let distribution_years = client.distribution_years();

        let capital_at_retirement = future_value(
            client.initial_capital,
            client.return_rate,
            client.savings_growth_rate,
            client.annual_savings(),
            accumulation_years,
        );
        let first_withdrawal = initial_withdrawal(
            capital_at_retirement,
            client.return_rate,
            client.inflation_rate,
            distribution_years,
        )?;

        Ok(Self {
            accumulation_years,
            distribution_years,
            capital_at_retirement,
            first_withdrawal,
        })
    }

    fn withdrawal_at(&self, client: &ClientData, age: u32) -> f64 {
        let years_retired = age - client.age_retirement;
        self.first_withdrawal * (1.0 + client.inflation_rate).powi(years_retired as i32)
    }

    fn monthly_income_in_todays_money(&self, client: &ClientData) -> f64 {
        let deflator = (1.0 + client.inflation_rate).powi(self.accumulation_years as i32);
        self.first_withdrawal / deflator / MONTHS_PER_YEAR
    }
}

/// Rejects ages above [`MAX_SUPPORTED_AGE`] and combinations whose phase
/// lengths cannot be represented.
///
/// Equal ages are accepted: no accumulation when retiring now, a single
/// withdrawal when retirement and death coincide.
fn check_age_order(client: &ClientData) -> Result<(), ProjectionError> {
    for (label, age) in [
        ("current", client.age_now),
        ("retirement", client.age_retirement),
        ("death", client.age_death),
    ] {
        if age > MAX_SUPPORTED_AGE {
            return Err(ProjectionError::AgeOutOfRange {
                label,
                age,
                max: MAX_SUPPORTED_AGE,
            });
        }
    }
    if client.age_retirement < client.age_now {
        return Err(ProjectionError::AgeOrder {
            earlier_label: "current",
            earlier: client.age_now,
            later_label: "retirement",
            later: client.age_retirement,
        });
    }
    if client.age_death + 1 < client.age_retirement {
        return Err(ProjectionError::AgeOrder {
            earlier_label: "retirement",
            earlier: client.age_retirement,
            later_label: "death",
            later: client.age_death,
        });
    }
    Ok(())
}

/// Inflation-adjusted monthly income available from retirement until death,
/// expressed in today's money.
pub fn compute_monthly_passive_income(client: &ClientData) -> Result<f64, ProjectionError> {
    let plan = RetirementPlan::for_client(client)?;
    Ok(plan.monthly_income_in_todays_money(client))
}

/// Year-by-year capital ledger from `age_now` through `age_death` inclusive.
///
/// Accumulation rows take their closing balance from the closed form rather
/// than compounding the carried balance, so the row before retirement equals
/// the capital used by [`compute_monthly_passive_income`] bit for bit.
pub fn build_capital_lifecycle_table(
    client: &ClientData,
) -> Result<Vec<TableRowData>, ProjectionError> {
    let plan = RetirementPlan::for_client(client)?;
    let annual_savings = client.annual_savings();
    let mut rows =
        Vec::with_capacity((plan.accumulation_years + plan.distribution_years) as usize);
    let mut capital = client.initial_capital;

    for age in client.age_now..client.age_retirement {
        let elapsed = age - client.age_now;
        let saved = annual_savings * (1.0 + client.savings_growth_rate).powi(elapsed as i32);
        let capital_year_end = future_value(
            client.initial_capital,
            client.return_rate,
            client.savings_growth_rate,
            annual_savings,
            elapsed + 1,
        );
        rows.push(TableRowData {
            age,
            capital_year_start: capital,
            interest: capital * client.return_rate,
            saved,
            capital_year_end,
            saved_pp_monthly: saved / MONTHS_PER_YEAR,
        });
        capital = capital_year_end;
    }

    for age in client.age_retirement..=client.age_death {
        let withdrawal = plan.withdrawal_at(client, age);
        let capital_year_end = capital * (1.0 + client.return_rate) - withdrawal;
        rows.push(TableRowData {
            age,
            capital_year_start: capital,
            interest: capital * client.return_rate,
            saved: -withdrawal,
            capital_year_end,
            saved_pp_monthly: -withdrawal / MONTHS_PER_YEAR,
        });
        capital = capital_year_end;
    }

    Ok(rows)
}

/// The ledger as shown to a reader: whole currency units, with the monthly
/// column converted to today's money.
pub fn build_display_table(client: &ClientData) -> Result<Vec<TableRowData>, ProjectionError> {
    let rows = build_capital_lifecycle_table(client)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let deflator =
                (1.0 + client.inflation_rate).powi((row.age - client.age_now) as i32);
            TableRowData {
                age: row.age,
                capital_year_start: round_currency(row.capital_year_start),
                interest: round_currency(row.interest),
                saved: round_currency(row.saved),
                capital_year_end: round_currency(row.capital_year_end),
                saved_pp_monthly: round_currency(row.saved / deflator / MONTHS_PER_YEAR),
            }
        })
        .collect())
}

/// End-of-year capital per age, one point per ledger row.
pub fn capital_series(rows: &[TableRowData]) -> Vec<CapitalPoint> {
    rows.iter()
        .map(|row| CapitalPoint {
            age: row.age,
            capital: row.capital_year_end,
        })
        .collect()
}

pub fn run_projection(client: &ClientData) -> Result<ProjectionReport, ProjectionError> {
    run_projection_with(client, build_capital_lifecycle_table)
}

pub fn run_display_projection(client: &ClientData) -> Result<ProjectionReport, ProjectionError> {
    run_projection_with(client, build_display_table)
}

fn run_projection_with(
    client: &ClientData,
    ledger: fn(&ClientData) -> Result<Vec<TableRowData>, ProjectionError>,
) -> Result<ProjectionReport, ProjectionError> {
    let plan = RetirementPlan::for_client(client)?;
    let monthly_passive_income = plan.monthly_income_in_todays_money(client);
    let rows = ledger(client)?;

    Ok(ProjectionReport {
        client: *client,
        accumulation_years: plan.accumulation_years,
        distribution_years: plan.distribution_years,
        capital_at_retirement: plan.capital_at_retirement,
        first_withdrawal: plan.first_withdrawal,
        monthly_passive_income,
        monthly_passive_income_rounded: round_currency(monthly_passive_income),
        rows,
    })
}

fn round_currency(value: f64) -> f64 {
    // `+ 0.0` turns a rounded -0.0 into 0.0.
    value.round() + 0.0
}
