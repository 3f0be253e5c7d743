//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor`, which replays a batch of
//! commands concurrently while keeping each user's commands in file order.
//!
//! # Design
//!
//! A batch is partitioned by issuing user. Each partition runs on its own
//! blocking task, so commands of different users race against each other on
//! the shared marketplace exactly as concurrent chat users would. Wallet and
//! item consistency under that race comes from the marketplace's entity
//! locks, not from the processor.
//!
//! Commands of different users inside one batch have no defined relative
//! order. Scripts whose users depend on each other (a purchase of an item
//! another user lists) must place the dependency in an earlier batch.

use crate::commands::{execute, CommandRecord, Reply};
use crate::core::Marketplace;
use crate::store::RecordStore;
use crate::types::{MarketError, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

/// Outcome of one replayed command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was executed
    pub record: CommandRecord,

    /// Its reply or rejection
    pub result: Result<Reply, MarketError>,
}

/// Batch processor with user-based partitioning
pub struct BatchProcessor<S: RecordStore> {
    market: Arc<Marketplace<S>>,
}

impl<S: RecordStore> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            market: Arc::clone(&self.market),
        }
    }
}

impl<S: RecordStore + 'static> BatchProcessor<S> {
    pub fn new(market: Arc<Marketplace<S>>) -> Self {
        Self { market }
    }

    /// Partition a batch of commands by issuing user
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one partition
    /// - Commands of each user keep their original order
    pub fn partition_by_user(
        &self,
        batch: Vec<CommandRecord>,
    ) -> HashMap<UserId, Vec<CommandRecord>> {
        let mut user_batches: HashMap<UserId, Vec<CommandRecord>> = HashMap::new();

        for record in batch {
            user_batches.entry(record.user).or_default().push(record);
        }

        user_batches
    }

    /// Execute one user's commands in order
    ///
    /// Every command runs even if an earlier one was rejected.
    pub fn process_user_commands(&self, commands: Vec<CommandRecord>) -> Vec<ProcessingResult> {
        commands
            .into_iter()
            .map(|record| {
                let result = execute(&self.market, &record);
                ProcessingResult { record, result }
            })
            .collect()
    }

    /// Execute a batch with one concurrent task per user
    ///
    /// Waits for every task before returning, so the next batch observes
    /// all effects of this one. Results are grouped by user and carry no
    /// cross-user order.
    pub async fn process_batch(&self, batch: Vec<CommandRecord>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, commands) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_user_commands(commands)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = %e, "replay task failed"),
            }
        }

        results
    }
}
