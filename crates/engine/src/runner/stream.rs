// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output streaming from an execution unit into the job's output log.

use crate::error::RunnerError;
use fleet_core::{Clock, JobId, JobOutputRecord, OutputSource};
use fleet_storage::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Retries after the first failed append.
pub const APPEND_RETRIES: u32 = 3;
const APPEND_BACKOFF: Duration = Duration::from_millis(50);
/// Records written per append call at most.
const MAX_BATCH: usize = 64;
/// stderr lines kept for error classification.
const STDERR_TAIL: usize = 20;

/// What the writer learned from the stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub records: usize,
    /// Last runtime session id seen in JSON output
    pub session_id: Option<String>,
    /// Last few stderr lines
    pub stderr_tail: Vec<String>,
}

/// Read `reader` line by line into records until EOF.
///
/// Lines are decoded lossily so invalid UTF-8 never stalls the pipe.
pub async fn pump<R, C>(reader: R, source: OutputSource, clock: C, tx: mpsc::UnboundedSender<JobOutputRecord>)
where
    R: AsyncRead + Unpin,
    C: Clock,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if tx.send(JobOutputRecord::from_line(clock.now(), source, line)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(%source, error = %e, "output stream read failed");
                break;
            }
        }
    }
}

/// Append one batch, retrying with exponential backoff.
pub async fn append_with_retry(
    store: &StateStore,
    id: &JobId,
    records: &[JobOutputRecord],
) -> Result<(), RunnerError> {
    let mut delay = APPEND_BACKOFF;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match store.append_job_output_batch(id, records) {
            Ok(()) => return Ok(()),
            Err(source) if attempt > APPEND_RETRIES => {
                return Err(RunnerError::OutputAppend { attempts: attempt, source });
            }
            Err(e) => {
                tracing::warn!(job_id = %id, attempt, error = %e, "output append failed, retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }
}

/// Drain `rx` into the job's output log until every sender is gone.
///
/// On a persistent append failure `failed` is cancelled so the supervisor
/// can stop the unit, and the error is returned.
pub async fn write_output(
    store: Arc<StateStore>,
    id: JobId,
    mut rx: mpsc::UnboundedReceiver<JobOutputRecord>,
    failed: CancellationToken,
) -> Result<StreamSummary, RunnerError> {
    let mut summary = StreamSummary::default();
    let mut batch = Vec::with_capacity(MAX_BATCH);
    while let Some(first) = rx.recv().await {
        batch.push(first);
        while batch.len() < MAX_BATCH {
            match rx.try_recv() {
                Ok(record) => batch.push(record),
                Err(_) => break,
            }
        }
        for record in &batch {
            if let Some(session) = record.session_id() {
                summary.session_id = Some(session);
            }
            if record.source == OutputSource::Stderr {
                summary.stderr_tail.push(record.content.clone());
                if summary.stderr_tail.len() > STDERR_TAIL {
                    summary.stderr_tail.remove(0);
                }
            }
        }
        if let Err(e) = append_with_retry(&store, &id, &batch).await {
            failed.cancel();
            return Err(e);
        }
        summary.records += batch.len();
        batch.clear();
    }
    Ok(summary)
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
