use crate::{
    flatten::flatten,
    id::Id,
    store::FileSystemStore,
    walker::{walk, WalkEnd},
    writer::output_report,
};
use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};
use std::{io::stdout, path::PathBuf, sync::Arc};
use tokio::{signal::ctrl_c, spawn};
use tokio_util::sync::CancellationToken;

/// Export the change history of a ledger as CSV, newest first
#[derive(Debug, Parser)]
pub struct Command {
    /// Root directory of the ledger
    pub ledger: PathBuf,

    /// Start from this transaction instead of the ledger's head
    #[arg(long)]
    pub head: Option<Id>,

    /// Fail when part of the history cannot be loaded instead of truncating the report
    #[arg(long)]
    pub strict: bool,
}

impl Command {
    pub async fn run(&self) -> Result<()> {
        if !self.ledger.is_dir() {
            bail!("{} is not a ledger directory", self.ledger.display());
        }

        let store = FileSystemStore::new(&self.ledger);
        let head = match self.head {
            Some(head) => head,
            None => store.head()?,
        };
        info!("exporting history of {} from {}", self.ledger.display(), head);

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        spawn(async move {
            if ctrl_c().await.is_ok() {
                warn!("interrupted, stopping export");
                interrupt.cancel();
            }
        });

        let walk = walk(head, Arc::new(store), cancel.clone());
        let flatten = flatten(walk.transactions, cancel.clone());

        let written = output_report(flatten.rows, &cancel, stdout().lock()).await?;
        let steps = flatten.handle.await?;
        info!("wrote {} rows from {} comparisons", written, steps);

        match walk.handle.await? {
            WalkEnd::BrokenLink { id, error } if self.strict => {
                bail!("history is incomplete at {}: {}", id, error)
            }
            WalkEnd::Cancelled => warn!("export cancelled, report is partial"),
            WalkEnd::Root | WalkEnd::BrokenLink { .. } | WalkEnd::Abandoned => {}
        }

        Ok(())
    }
}
