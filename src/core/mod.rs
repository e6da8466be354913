mod annuity;
mod engine;
mod types;

pub use annuity::{future_value, initial_withdrawal};
pub use engine::{
    build_capital_lifecycle_table, build_display_table, capital_series,
    compute_monthly_passive_income, run_display_projection, run_projection,
};
pub use types::{
    CapitalPoint, ClientData, MAX_SUPPORTED_AGE, ProjectionError, ProjectionReport, TableRowData,
};
