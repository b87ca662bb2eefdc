//! Expense ledger handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tally_core::models::SampleExpense;
use tally_core::sample::month_expenses;

use crate::{money, AppError, AppState};

use super::charts::{resolve_month, MonthQuery};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

/// GET /expenses/balance - Remaining balance (also served at /api/total-balance)
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BalanceResponse>, AppError> {
    let snapshot = state.ledger.snapshot().map_err(AppError::from_core)?;
    Ok(Json(BalanceResponse {
        balance: money(snapshot.balance),
    }))
}

/// GET /expenses/count - Number of recorded expenses
pub async fn get_count(State(state): State<Arc<AppState>>) -> Result<Json<CountResponse>, AppError> {
    let snapshot = state.ledger.snapshot().map_err(AppError::from_core)?;
    Ok(Json(CountResponse {
        count: snapshot.count,
    }))
}

/// Request body for adding an expense
#[derive(Debug, Deserialize)]
pub struct AddExpenseRequest {
    pub amount: Decimal,
    /// YYYY-MM-DD; defaults to today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub total: f64,
    pub balance: f64,
    pub count: u64,
}

/// POST /expenses/add - Record an expense
pub async fn add_expense(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddExpenseRequest>,
) -> Result<Json<LedgerResponse>, AppError> {
    let snapshot = state
        .ledger
        .add_expense(body.amount, body.date)
        .map_err(AppError::from_core)?;

    tracing::info!(amount = %body.amount, count = snapshot.count, "Expense recorded");

    Ok(Json(LedgerResponse {
        total: money(snapshot.total),
        balance: money(snapshot.balance),
        count: snapshot.count,
    }))
}

/// GET /expenses/random - Generated sample expenses for a month
pub async fn random_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<SampleExpense>>, AppError> {
    let (year, month) = resolve_month(&params);
    let seed = params.seed.unwrap_or(state.config.sample.default_seed);

    let expenses = month_expenses(seed, year, month).map_err(AppError::from_core)?;
    Ok(Json(expenses))
}
