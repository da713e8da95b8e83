//! Receipt handlers.
//!
//! Both routes sit behind `require_auth`, which provides the caller's
//! [`Subject`]. A receipt is only ever returned to its owner.

use crate::auth::Subject;
use crate::errors::ReceiptsError;
use crate::models::{Receipt, ReceiptListResponse};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /receipts
///
/// Lists the caller's receipts.
///
/// # Response
///
/// - 200 OK with `{"user": <sub>, "receipts": [...]}`; the list is empty
///   when the caller owns nothing
#[instrument(skip_all, name = "receipts.handlers.list")]
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
) -> Result<Json<ReceiptListResponse>, ReceiptsError> {
    let receipts = state.repository.list_by_owner(subject.as_str()).await?;

    tracing::debug!(
        target: "receipts.handlers.receipts",
        count = receipts.len(),
        "Listed receipts"
    );

    Ok(Json(ReceiptListResponse {
        user: subject.into_inner(),
        receipts,
    }))
}

/// Handler for GET /receipts/{code}
///
/// # Response
///
/// - 200 OK with the receipt
/// - 404 Not Found if no receipt has this code
/// - 403 Forbidden if the receipt belongs to another subject
#[instrument(skip(state, subject), name = "receipts.handlers.get")]
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<Subject>,
    Path(code): Path<String>,
) -> Result<Json<Receipt>, ReceiptsError> {
    let receipt = state.repository.get_by_code(&code).await?;

    if receipt.owner != subject.as_str() {
        tracing::info!(
            target: "receipts.handlers.receipts",
            code = %code,
            "Receipt access denied: caller is not the owner"
        );
        return Err(ReceiptsError::Forbidden("Not allowed".to_string()));
    }

    Ok(Json(receipt))
}
