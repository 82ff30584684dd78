//! Core client implementation.
//!
//! [`FetchClient`] fans out one independent [`task::DownloadTask`] per requested
//! file name. Tasks share nothing but the read-only configuration and the event
//! channel; each blocks only on its own connection, and the failure of any
//! subset never disturbs the rest. Launching is fire-and-forget — the returned
//! [`DownloadHandle`]s are the explicit join primitive for callers that want to
//! block until completion.

mod task;

use crate::config::Config;
use crate::error::Result;
use crate::types::{DownloadReport, DownloadState, Event};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use task::DownloadTask;

/// Join handle for one launched download.
pub struct DownloadHandle {
    /// The file name this download was launched for
    pub file_name: String,
    handle: tokio::task::JoinHandle<DownloadReport>,
}

impl DownloadHandle {
    /// Wait for the task and return its report.
    ///
    /// A panicked task is folded into a `Failed` report rather than propagated,
    /// so a caller joining many downloads always gets one report per task.
    pub async fn join(self) -> DownloadReport {
        match self.handle.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(file = %self.file_name, error = %e, "download task aborted");
                DownloadReport {
                    file_name: self.file_name,
                    state: DownloadState::Failed,
                    bytes_written: 0,
                    error: Some(format!("task aborted: {e}")),
                }
            }
        }
    }
}

/// Concurrent file-retrieval client (one connection per file).
///
/// Construction validates the configuration and opens no connections; work only
/// starts on [`start_download`](FetchClient::start_download).
pub struct FetchClient {
    config: Arc<Config>,
    file_names: Vec<String>,
    event_tx: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl FetchClient {
    /// Create a new client from a validated configuration.
    ///
    /// Fails fast with a configuration error before any task can be launched.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(config.event_buffer);
        Ok(Self {
            config: Arc::new(config),
            file_names: Vec::new(),
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Replace the request set. May be called repeatedly before launching.
    ///
    /// Duplicates are permitted; each produces an independent task and a write
    /// race on the shared output path (last writer wins).
    pub fn set_file_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_names = names.into_iter().map(Into::into).collect();
    }

    /// The current request set, in launch order.
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    /// Subscribe to download lifecycle events.
    ///
    /// Multiple subscribers are supported; a subscriber that lags behind the
    /// channel capacity loses the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Cancel all in-flight downloads; each converges to `Failed` and closes
    /// its connection. Tasks launched after this call fail immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Launch one independent task per requested file name, in order, and
    /// return without waiting for any of them.
    ///
    /// An empty request set launches nothing: zero connection attempts, zero
    /// file writes. Individual task failures are never raised here — they are
    /// observable only through each task's status line, its event, and the
    /// report behind its handle.
    pub fn start_download(&self) -> Vec<DownloadHandle> {
        if self.file_names.is_empty() {
            tracing::debug!("empty request set; nothing to launch");
            return Vec::new();
        }

        let mut handles = Vec::with_capacity(self.file_names.len());
        for name in &self.file_names {
            let task = DownloadTask::new(
                Arc::clone(&self.config),
                name.clone(),
                self.event_tx.clone(),
                self.cancel.child_token(),
            );
            handles.push(DownloadHandle {
                file_name: name.clone(),
                handle: tokio::spawn(task.execute()),
            });
        }
        tracing::info!(
            count = handles.len(),
            endpoint = %self.config.endpoint,
            "launched downloads"
        );
        handles
    }

    /// Join every handle and collect the reports, in launch order.
    ///
    /// This is the barrier the caller opts into; the client itself never
    /// blocks on its tasks.
    pub async fn wait_all(handles: Vec<DownloadHandle>) -> Vec<DownloadReport> {
        futures::future::join_all(handles.into_iter().map(DownloadHandle::join)).await
    }
}
