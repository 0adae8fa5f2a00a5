use crate::{
    id::Id,
    store::{LoadError, Loader},
    transaction::Transaction,
};
use log::{debug, info};
use std::sync::Arc;
use tokio::{
    select, spawn,
    sync::mpsc::{channel, Receiver},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

/// How a traversal finished. The transaction sequence itself ends the same way in every case.
#[derive(Debug)]
pub enum WalkEnd {
    /// Reached the transaction with no predecessor
    Root,

    /// A transaction could not be loaded, everything older than it is unreachable
    BrokenLink { id: Id, error: LoadError },

    Cancelled,

    /// The consumer stopped listening
    Abandoned,
}

pub struct Walk {
    /// Transactions, newest first
    pub transactions: Receiver<Transaction>,
    pub handle: JoinHandle<WalkEnd>,
}

/// Walks the chain from `head` back to the root on its own task. Each record is loaded only
/// once the previous one has been handed over, so at most one transaction is held in flight.
pub fn walk<L>(head: Id, loader: Arc<L>, cancel: CancellationToken) -> Walk
where
    L: Loader + Send + Sync + ?Sized + 'static,
{
    let (tx, rx) = channel(1);

    let handle = spawn(async move {
        let mut current = head;

        while !current.is_root() {
            if cancel.is_cancelled() {
                return WalkEnd::Cancelled;
            }

            let transaction = match loader.load(&current) {
                Ok(transaction) => transaction,
                Err(error) => {
                    info!("history truncated at {}: {}", current, error);
                    return WalkEnd::BrokenLink { id: current, error };
                }
            };
            debug!("loaded transaction {}", current);
            current = transaction.parent();

            select! {
                biased;
                _ = cancel.cancelled() => return WalkEnd::Cancelled,
                sent = tx.send(transaction) => {
                    if sent.is_err() {
                        return WalkEnd::Abandoned;
                    }
                }
            }
        }

        WalkEnd::Root
    });

    Walk {
        transactions: rx,
        handle,
    }
}
