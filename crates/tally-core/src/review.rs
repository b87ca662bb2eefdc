//! Manual review queue for receipts that failed to parse

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::models::ReviewItem;

/// Bounded queue of unparseable receipt texts, keyed by content hash
///
/// Retaining the same text twice keeps a single entry. When full, the oldest
/// entry is evicted.
pub struct ReviewQueue {
    capacity: usize,
    items: RwLock<VecDeque<ReviewItem>>,
}

impl ReviewQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: RwLock::new(VecDeque::new()),
        }
    }

    /// Keep `text` for review and return its hash
    pub fn retain(&self, text: &str, reason: &str) -> Result<String> {
        let hash = content_hash(text);
        let mut items = self.items.write().map_err(|_| lock_error())?;

        if items.iter().any(|item| item.hash == hash) {
            return Ok(hash);
        }

        if items.len() >= self.capacity {
            items.pop_front();
        }
        items.push_back(ReviewItem {
            hash: hash.clone(),
            text: text.to_string(),
            reason: reason.to_string(),
            received_at: Utc::now(),
        });

        tracing::info!(hash = %hash, reason, "Receipt held for manual review");
        Ok(hash)
    }

    /// All held items, oldest first
    pub fn list(&self) -> Result<Vec<ReviewItem>> {
        Ok(self
            .items
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .cloned()
            .collect())
    }

    pub fn get(&self, hash: &str) -> Result<Option<ReviewItem>> {
        Ok(self
            .items
            .read()
            .map_err(|_| lock_error())?
            .iter()
            .find(|item| item.hash == hash)
            .cloned())
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error() -> Error {
    Error::InvalidData("Failed to acquire review queue lock".into())
}

/// SHA-256 of the text, hex encoded
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
