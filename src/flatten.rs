use crate::{
    id::Id,
    state::{Balance, Delta},
    transaction::Transaction,
};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use tokio::{
    select, spawn,
    sync::mpsc::{channel, Receiver, Sender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Account,
    Budget,
}

/// One changed entity between two consecutive snapshots. The row is attributed to the older
/// transaction, the amount is what moved to reach the newer one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Transaction")]
    pub transaction: Id,

    #[serde(rename = "Time")]
    pub time: DateTime<Utc>,

    #[serde(rename = "Amount")]
    pub amount: Balance,

    #[serde(rename = "Entity")]
    pub entity: String,

    #[serde(rename = "Entity Type")]
    pub kind: EntityKind,
}

pub struct Flatten {
    pub rows: Receiver<ReportRow>,

    /// Resolves to the number of snapshot pairs compared
    pub handle: JoinHandle<usize>,
}

/// Expands a newest-first transaction sequence into report rows, one comparison step per
/// adjacent pair. All rows of a pair are delivered before the next pair is started.
pub fn flatten(mut transactions: Receiver<Transaction>, cancel: CancellationToken) -> Flatten {
    let (tx, rx) = channel(1);

    let handle = spawn(async move {
        let mut newer: Option<Transaction> = None;
        let mut steps = 0;

        loop {
            let older = select! {
                biased;
                _ = cancel.cancelled() => break,
                next = transactions.recv() => match next {
                    Some(transaction) => transaction,
                    None => break,
                },
            };

            if let Some(newer) = &newer {
                let delta = newer.state().subtract(older.state());
                debug!(
                    "{} -> {}: {} rows",
                    older.id(),
                    newer.id(),
                    delta.row_count()
                );
                steps += 1;

                let rows = expand(older.id(), older.time(), delta);
                if !forward(rows, &tx, &cancel).await {
                    break;
                }
            }

            newer = Some(older);
        }

        steps
    });

    Flatten { rows: rx, handle }
}

/// Produces the rows of one delta on a separate task, into a channel with room for all of them.
fn expand(transaction: Id, time: DateTime<Utc>, delta: Delta) -> Receiver<ReportRow> {
    let (tx, rx) = channel(delta.row_count().max(1));

    spawn(async move {
        let accounts = delta
            .accounts
            .into_iter()
            .map(|(entity, amount)| (entity, amount, EntityKind::Account));
        let budgets = delta
            .budget
            .map(|budget| budget.paths())
            .unwrap_or_default()
            .into_iter()
            .map(|(entity, amount)| (entity, amount, EntityKind::Budget));

        for (entity, amount, kind) in accounts.chain(budgets) {
            let row = ReportRow {
                transaction,
                time,
                amount,
                entity,
                kind,
            };
            if tx.send(row).await.is_err() {
                return;
            }
        }
    });

    rx
}

/// Moves every row of one pair downstream. Returns `false` when the pipeline should stop.
async fn forward(
    mut rows: Receiver<ReportRow>,
    out: &Sender<ReportRow>,
    cancel: &CancellationToken,
) -> bool {
    while let Some(row) = rows.recv().await {
        select! {
            biased;
            _ = cancel.cancelled() => return false,
            sent = out.send(row) => {
                if sent.is_err() {
                    return false;
                }
            }
        }
    }

    true
}
