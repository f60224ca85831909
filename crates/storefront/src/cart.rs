//! The cart ledger: ordered line items with merge-by-variant and totals.
//!
//! Entries are keyed by (product, size, color). Adding an existing key sums
//! quantities; insertion order is preserved because the cart sidebar renders
//! entries in the order they were added. Every mutation persists the full
//! item list synchronously.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use monarca_core::{ItemKey, LineItem};

use crate::storage::{Storage, StorageError, keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The candidate item had a zero quantity.
    #[error("line item quantity must be at least 1")]
    ZeroQuantity,

    /// The candidate item carried no price tiers, so it could never be
    /// priced.
    #[error("line item has no price tiers")]
    NoPriceTiers,

    /// Persisting the ledger failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Ordered list of selected purchase line items, persisted across sessions.
pub struct CartLedger {
    items: Vec<LineItem>,
    storage: Arc<dyn Storage>,
}

impl CartLedger {
    /// Create an empty ledger over a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            items: Vec::new(),
            storage,
        }
    }

    /// Restore the persisted ledger.
    ///
    /// Entries that no longer satisfy the cart invariants (zero quantity,
    /// no price tiers) are dropped with a warning rather than poisoning
    /// totals. A corrupt record yields an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub fn hydrate(storage: Arc<dyn Storage>) -> Result<Self, StorageError> {
        let items = match storage.load(keys::CART)? {
            Some(raw) => match serde_json::from_str::<Vec<LineItem>>(&raw) {
                Ok(items) => items
                    .into_iter()
                    .filter(|item| {
                        let valid = item.quantity >= 1 && !item.price_tiers.is_empty();
                        if !valid {
                            tracing::warn!(
                                product_id = %item.product_id,
                                "Dropping invalid persisted cart entry"
                            );
                        }
                        valid
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding corrupt persisted cart");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Ok(Self { items, storage })
    }

    /// Add a line item, merging quantities when the (product, size, color)
    /// key already exists. Non-quantity fields keep their first-written
    /// values.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` or `CartError::NoPriceTiers` when
    /// the candidate violates the cart invariants, `CartError::Storage` if
    /// persisting fails.
    pub fn add(&mut self, item: LineItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if item.price_tiers.is_empty() {
            return Err(CartError::NoPriceTiers);
        }

        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.key() == key) {
            existing.quantity += item.quantity;
        } else {
            self.items.push(item);
        }
        self.persist()?;
        Ok(())
    }

    /// Remove the entry matching `key`. Absent keys are a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if persisting fails.
    pub fn remove(&mut self, key: &ItemKey) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| i.key() != *key);
        if self.items.len() != before {
            self.persist()?;
        }
        Ok(())
    }

    /// Empty the ledger, e.g. after a successful checkout.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if persisting fails.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.persist()
    }

    /// The line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of entries (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of tier-resolved unit price times quantity over all entries.
    ///
    /// Entries are validated at `add`, so pricing cannot fail here; an
    /// unpriceable entry (only possible via a hand-edited persisted record)
    /// contributes zero rather than failing the whole total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| {
                item.subtotal().unwrap_or_else(|e| {
                    tracing::warn!(product_id = %item.product_id, error = %e, "Unpriceable cart entry");
                    Decimal::ZERO
                })
            })
            .sum()
    }

    fn persist(&self) -> Result<(), CartError> {
        let serialized = serde_json::to_string(&self.items)
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;
        self.storage.save(keys::CART, &serialized)?;
        Ok(())
    }
}
