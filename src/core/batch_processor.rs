//! Batch processing with actor-based partitioning for concurrent replay
//!
//! This module provides the `BatchProcessor` struct, which runs a batch of
//! operations concurrently while keeping each acting account's operations in
//! their original order.
//!
//! # Design
//!
//! Registrations in a batch run first, one after another in file order, so a
//! transfer to a user registered in the same batch never races that user's
//! registration. The rest of the batch is partitioned by
//! [`Operation::actor`]. Each partition becomes one tokio task that runs its
//! operations sequentially; partitions run in parallel. Operations of
//! different actors that touch the same account (a transfer into someone
//! else's account, for instance) are serialized by the store's row locks, so balance invariants hold under every schedule. Only
//! the relative order of different actors' operations is left open.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── Shop<S>  (cloned into every task)
//! ```

use std::collections::HashMap;

use tracing::error;

use super::shop::Shop;
use super::traits::LedgerStore;
use crate::types::{LedgerResult, Operation, Username};

/// Result of running a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was run
    pub operation: Operation,

    /// Success or the ledger's rejection
    pub result: LedgerResult<()>,
}

/// Batch processor with actor-based partitioning
#[derive(Debug)]
pub struct BatchProcessor<S> {
    shop: Shop<S>,
}

impl<S> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            shop: self.shop.clone(),
        }
    }
}

impl<S: LedgerStore + 'static> BatchProcessor<S> {
    /// Create a new BatchProcessor around a shop
    pub fn new(shop: Shop<S>) -> Self {
        Self { shop }
    }

    /// Partition a batch by acting account
    ///
    /// # Guarantees
    ///
    /// - Each operation appears in exactly one partition
    /// - Operations in a partition keep their original relative order
    pub fn partition_by_actor(&self, batch: Vec<Operation>) -> HashMap<Username, Vec<Operation>> {
        let mut partitions: HashMap<Username, Vec<Operation>> = HashMap::new();

        for operation in batch {
            partitions
                .entry(operation.actor().to_string())
                .or_default()
                .push(operation);
        }

        partitions
    }

    /// Run one actor's operations in order
    ///
    /// Rejections are captured in the results and don't stop the remaining
    /// operations.
    pub async fn process_actor_operations(
        &self,
        operations: Vec<Operation>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = self.shop.execute(&operation).await;
            results.push(ProcessingResult { operation, result });
        }

        results
    }

    /// Run a batch: registrations first, then one task per actor
    ///
    /// Registration results come first, in file order. The rest are grouped
    /// by actor, in no particular actor order.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let (registrations, rest): (Vec<Operation>, Vec<Operation>) = batch
            .into_iter()
            .partition(|operation| matches!(operation, Operation::Register { .. }));

        let mut results = self.process_actor_operations(registrations).await;
        let partitions = self.partition_by_actor(rest);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_actor, operations) in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_actor_operations(operations).await
            }));
        }

        for task in tasks {
            match task.await {
                Ok(actor_results) => results.extend(actor_results),
                Err(e) => error!("replay task failed: {}", e),
            }
        }

        results
    }
}
