//! Chart data handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use tally_core::models::{CalendarMode, MonthCalendar, WeeklyTotals};
use tally_core::sample::{amount_calendar, month_expenses, month_income, percentage_calendar, weekly_totals};

use crate::{AppError, AppState};

/// Where chart numbers come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSource {
    /// Deterministic generated data
    #[default]
    Sample,
    /// Expenses recorded in the ledger
    Ledger,
}

/// Query parameters shared by the month-based endpoints
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub seed: Option<u64>,
    pub source: Option<ChartSource>,
    /// Calendar only; sample data defaults to percentage mode
    pub mode: Option<CalendarMode>,
}

/// Requested (year, month); a missing or zero value means the current one
pub fn resolve_month(params: &MonthQuery) -> (i32, u32) {
    let today = Utc::now().date_naive();
    (
        params.year.filter(|y| *y != 0).unwrap_or(today.year()),
        params.month.filter(|m| *m != 0).unwrap_or(today.month()),
    )
}

fn ledger_amounts(
    state: &AppState,
    year: i32,
    month: u32,
) -> Result<Vec<(NaiveDate, Decimal)>, AppError> {
    Ok(state
        .ledger
        .entries_in_month(year, month)
        .map_err(AppError::from_core)?
        .into_iter()
        .map(|e| (e.date, e.delta))
        .collect())
}

/// GET /expenses/weekly - Weekday totals for the first two weeks of a month
pub async fn weekly_chart(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<WeeklyTotals>, AppError> {
    let (year, month) = resolve_month(&params);

    let amounts: Vec<(NaiveDate, Decimal)> = match params.source.unwrap_or_default() {
        ChartSource::Sample => {
            let seed = params.seed.unwrap_or(state.config.sample.default_seed);
            month_expenses(seed, year, month)
                .map_err(AppError::from_core)?
                .into_iter()
                .map(|e| (e.date, e.amount))
                .collect()
        }
        ChartSource::Ledger => ledger_amounts(&state, year, month)?,
    };

    let totals = weekly_totals(amounts, year, month).map_err(AppError::from_core)?;
    Ok(Json(totals))
}

/// GET /calendar/month - Per-day expense/income cells for a month
pub async fn month_calendar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<MonthCalendar>, AppError> {
    let (year, month) = resolve_month(&params);
    let seed = params.seed.unwrap_or(state.config.sample.default_seed);

    let calendar = match (params.source.unwrap_or_default(), params.mode) {
        (ChartSource::Sample, None | Some(CalendarMode::Percentage)) => {
            let range = &state.config.sample;
            percentage_calendar(seed, year, month, range.percent_min, range.percent_max)
        }
        (ChartSource::Sample, Some(CalendarMode::Amount)) => {
            let expenses = month_expenses(seed, year, month)
                .map_err(AppError::from_core)?
                .into_iter()
                .map(|e| (e.date, e.amount));
            let income = month_income(seed, year, month).map_err(AppError::from_core)?;
            amount_calendar(expenses, income, year, month)
        }
        (ChartSource::Ledger, Some(CalendarMode::Percentage)) => {
            return Err(AppError::bad_request(
                "Percentage mode is only available for sample data",
            ));
        }
        (ChartSource::Ledger, _) => {
            let expenses = ledger_amounts(&state, year, month)?;
            amount_calendar(expenses, Vec::<(NaiveDate, Decimal)>::new(), year, month)
        }
    }
    .map_err(AppError::from_core)?;

    Ok(Json(calendar))
}
