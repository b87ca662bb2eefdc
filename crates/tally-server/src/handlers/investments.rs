//! Investment suggestion handler

use std::sync::Arc;

use axum::{extract::State, Json};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::warn;

use tally_core::analysis::round2;
use tally_core::market::normalize_all;
use tally_core::MarketDataProvider;

use crate::{money, AppError, AppState};

/// Days of history fetched to find the latest close
const PRICE_LOOKBACK_DAYS: u32 = 5;

#[derive(Debug, Serialize)]
pub struct StockSuggestion {
    pub symbol: String,
    pub price: f64,
    pub shares: u64,
}

#[derive(Debug, Serialize)]
pub struct SymbolError {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub balance: f64,
    pub recommendations: Vec<StockSuggestion>,
    pub errors: Vec<SymbolError>,
}

/// GET /investments/recommend - Split the balance equally across the watchlist
///
/// Each symbol gets `balance / watchlist size`, spent on whole shares at the
/// latest close. A symbol whose price cannot be fetched is listed in `errors`.
pub async fn recommend_investments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecommendResponse>, AppError> {
    let market = state
        .market
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Market data provider not configured"))?;

    let balance = state
        .ledger
        .snapshot()
        .map_err(AppError::from_core)?
        .balance;

    let investments = &state.config.investments;
    let (symbols, rejected) = normalize_all(&investments.watchlist, investments.exchange);
    let mut errors: Vec<SymbolError> = rejected
        .into_iter()
        .map(|symbol| SymbolError {
            symbol,
            error: "Invalid symbol".to_string(),
        })
        .collect();

    let allocation = if symbols.is_empty() || balance.is_sign_negative() {
        0.0
    } else {
        money(balance) / symbols.len() as f64
    };

    let mut recommendations = Vec::new();
    for symbol in symbols {
        match market.price_history(&symbol, PRICE_LOOKBACK_DAYS).await {
            Ok(bars) => {
                let Some(price) = bars.last().map(|b| b.close).filter(|p| *p > 0.0) else {
                    errors.push(SymbolError {
                        symbol,
                        error: "No usable price".to_string(),
                    });
                    continue;
                };
                let shares = (allocation / price).floor().to_u64().unwrap_or(0);
                recommendations.push(StockSuggestion {
                    symbol,
                    price: round2(price),
                    shares,
                });
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Price lookup failed");
                errors.push(SymbolError {
                    symbol,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(Json(RecommendResponse {
        balance: money(balance),
        recommendations,
        errors,
    }))
}
