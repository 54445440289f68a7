//! Account history assembly
//!
//! Read-only. Builds an [`AccountHistory`] from committed store state:
//! the current balance, purchase quantities summed per item (first-purchase
//! order), and transfers split into received and sent (ledger order).

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::LedgerStore;
use crate::types::{
    AccountHistory, CoinHistory, InventoryItem, LedgerError, LedgerResult, PurchaseRecord,
    ReceivedTransfer, SentTransfer, TransferRecord,
};

/// Builds history views from a shared store
#[derive(Debug)]
pub struct HistoryAssembler<S> {
    store: Arc<S>,
}

impl<S> Clone for HistoryAssembler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> HistoryAssembler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// History of `account`
    ///
    /// Fails with `AccountNotFound` only when the balance lookup does. An
    /// account without purchases or transfers gets empty lists.
    pub async fn history(&self, account: &str) -> LedgerResult<AccountHistory> {
        let coins = self.store.balance(account).await?;
        let purchases = self.store.purchases_of(account).await?;
        let transfers = self.store.transfers_of(account).await?;

        Ok(AccountHistory {
            coins,
            inventory: summarize_inventory(account, &purchases)?,
            coin_history: split_transfers(account, &transfers),
        })
    }
}

fn summarize_inventory(
    account: &str,
    purchases: &[PurchaseRecord],
) -> LedgerResult<Vec<InventoryItem>> {
    let mut inventory: Vec<InventoryItem> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for purchase in purchases {
        match positions.get(purchase.item.as_str()) {
            Some(&index) => {
                let entry = &mut inventory[index];
                entry.quantity = entry
                    .quantity
                    .checked_add(purchase.quantity)
                    .ok_or_else(|| LedgerError::arithmetic_overflow("inventory", account))?;
            }
            None => {
                positions.insert(purchase.item.as_str(), inventory.len());
                inventory.push(InventoryItem {
                    item: purchase.item.clone(),
                    quantity: purchase.quantity,
                });
            }
        }
    }

    Ok(inventory)
}

fn split_transfers(account: &str, transfers: &[TransferRecord]) -> CoinHistory {
    let mut history = CoinHistory::default();

    for transfer in transfers {
        if transfer.receiver == account {
            history.received.push(ReceivedTransfer {
                from_user: transfer.sender.clone(),
                amount: transfer.amount,
            });
        }
        if transfer.sender == account {
            history.sent.push(SentTransfer {
                to_user: transfer.receiver.clone(),
                amount: transfer.amount,
            });
        }
    }

    history
}
