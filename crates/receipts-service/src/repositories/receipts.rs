//! Receipts repository.
//!
//! The record set is fixed at construction and never mutated.

use crate::errors::ReceiptsError;
use crate::models::Receipt;
use std::collections::BTreeMap;
use tracing::instrument;

/// Read access to stored receipts.
#[async_trait::async_trait]
pub trait ReceiptRepository: Send + Sync {
    /// Receipts owned by `owner`, ordered by code.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Receipt>, ReceiptsError>;

    /// Receipt stored under `code`.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptsError::NotFound` if no receipt has that code.
    async fn get_by_code(&self, code: &str) -> Result<Receipt, ReceiptsError>;
}

/// In-memory receipt store keyed by code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReceiptRepository {
    receipts: BTreeMap<String, Receipt>,
}

impl InMemoryReceiptRepository {
    /// Build a store from `(code, receipt)` pairs.
    pub fn new<I, C>(receipts: I) -> Self
    where
        I: IntoIterator<Item = (C, Receipt)>,
        C: Into<String>,
    {
        Self {
            receipts: receipts
                .into_iter()
                .map(|(code, receipt)| (code.into(), receipt))
                .collect(),
        }
    }

    /// The startup record set.
    pub fn seeded() -> Self {
        let receipt = |id: i64, amount: f64, owner: &str| Receipt {
            id,
            amount,
            currency: "RON".to_string(),
            owner: owner.to_string(),
        };

        Self::new([
            ("rct_1", receipt(1, 120.5, "auth0|68dfb748e1faeb183927781e")),
            ("rct_2", receipt(2, 59.9, "auth0|userB")),
            ("rct_3", receipt(3, 999.0, "auth0|68dfb748e1faeb183927781e")),
        ])
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }
}

#[async_trait::async_trait]
impl ReceiptRepository for InMemoryReceiptRepository {
    #[instrument(skip_all)]
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<Receipt>, ReceiptsError> {
        Ok(self
            .receipts
            .values()
            .filter(|receipt| receipt.owner == owner)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_by_code(&self, code: &str) -> Result<Receipt, ReceiptsError> {
        self.receipts
            .get(code)
            .cloned()
            .ok_or_else(|| ReceiptsError::NotFound("Receipt not found".to_string()))
    }
}
