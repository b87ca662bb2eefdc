//! Receipt OCR handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use tracing::warn;

use tally_core::models::{ExpenseRecord, ReviewItem};
use tally_core::{parse_receipt, OcrEngine};

use crate::{money, AppError, AppState, MAX_UPLOAD_SIZE};

/// Outcome of parsing the extracted text
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ParsedReceipt {
    Parsed(ExpenseRecord),
    Failed { error: String, review_hash: String },
}

#[derive(Debug, Serialize)]
pub struct ReceiptResponse {
    pub text: String,
    pub parsed: ParsedReceipt,
    pub balance: f64,
    pub count: u64,
}

/// POST /ocr/receipt - Extract, parse and record a receipt image
///
/// Expects multipart form with:
/// - file: receipt image (required, max 10MB)
///
/// A receipt whose text cannot be parsed is still a 200: the text is held
/// for manual review and `parsed` carries the error and review hash.
pub async fn upload_receipt(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ReceiptResponse>, AppError> {
    let ocr = state
        .ocr
        .as_ref()
        .ok_or_else(|| AppError::unavailable("OCR engine not configured"))?;

    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| AppError::bad_request("Failed to read file data"))?;
            if bytes.len() > MAX_UPLOAD_SIZE {
                return Err(AppError::bad_request(&format!(
                    "File too large. Maximum size is {} MB",
                    MAX_UPLOAD_SIZE / 1024 / 1024
                )));
            }
            image = Some(bytes.to_vec());
        }
    }

    let image = image.ok_or_else(|| AppError::bad_request("Missing file field"))?;
    if image.is_empty() {
        return Err(AppError::bad_request("No image data provided"));
    }

    let text = ocr.extract_text(&image).await.map_err(AppError::from_core)?;

    let parsed = match parse_receipt(&text) {
        Ok(record) => {
            state
                .ledger
                .add_expense(record.amount, record.date)
                .map_err(AppError::from_core)?;
            ParsedReceipt::Parsed(record)
        }
        Err(e) => {
            warn!(engine = ocr.name(), error = %e, "Receipt text could not be parsed");
            let review_hash = state
                .review
                .retain(&text, &e.to_string())
                .map_err(AppError::from_core)?;
            ParsedReceipt::Failed {
                error: e.to_string(),
                review_hash,
            }
        }
    };

    let snapshot = state.ledger.snapshot().map_err(AppError::from_core)?;
    Ok(Json(ReceiptResponse {
        text,
        parsed,
        balance: money(snapshot.balance),
        count: snapshot.count,
    }))
}

/// GET /ocr/review - Receipt texts waiting for manual review
pub async fn list_review(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReviewItem>>, AppError> {
    Ok(Json(state.review.list().map_err(AppError::from_core)?))
}

/// GET /ocr/review/:hash - One held receipt text
pub async fn get_review_item(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> Result<Json<ReviewItem>, AppError> {
    state
        .review
        .get(&hash)
        .map_err(AppError::from_core)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Review item not found"))
}
