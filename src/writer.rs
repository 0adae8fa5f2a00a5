use crate::flatten::ReportRow;
use anyhow::Result;
use csv::WriterBuilder;
use std::io::Write;
use tokio::{select, sync::mpsc::Receiver};
use tokio_util::sync::CancellationToken;

pub const HEADER: [&str; 5] = ["Transaction", "Time", "Amount", "Entity", "Entity Type"];

/// Writes the header and then every row as it arrives, flushing once at the end. Returns the
/// number of data rows written.
pub async fn output_report<W: Write>(
    mut rows: Receiver<ReportRow>,
    cancel: &CancellationToken,
    out: W,
) -> Result<usize> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(HEADER)?;

    let mut written = 0;
    loop {
        let row = select! {
            biased;
            _ = cancel.cancelled() => break,
            row = rows.recv() => match row {
                Some(row) => row,
                None => break,
            },
        };
        wtr.serialize(row)?;
        written += 1;
    }

    wtr.flush()?;

    Ok(written)
}
