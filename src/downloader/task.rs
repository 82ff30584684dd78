//! Per-file download task — one connection, one exchange, one terminal state.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{DownloadReport, DownloadState, Event};
use crate::wire;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// How a completed exchange ended, before mapping to a terminal state.
enum Exchange {
    /// Body received and persisted (byte count)
    Stored(u64),
    /// Server answered with the invalid-request sentinel
    Rejected,
}

/// A single download: owns its connection exclusively, runs the request/response
/// protocol once, writes the result to disk, and reports a terminal state.
///
/// Every failure mode — connect, timeout, mid-transfer reset, local file write,
/// cancellation — converges on the `Failed` state; nothing escapes the task.
pub(crate) struct DownloadTask {
    config: Arc<Config>,
    file_name: String,
    state: DownloadState,
    bytes_written: u64,
    event_tx: broadcast::Sender<Event>,
    cancel: CancellationToken,
}

impl DownloadTask {
    pub(crate) fn new(
        config: Arc<Config>,
        file_name: String,
        event_tx: broadcast::Sender<Event>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            file_name,
            state: DownloadState::NotStarted,
            bytes_written: 0,
            event_tx,
            cancel,
        }
    }

    /// Run the full protocol and return the report. Consumes the task; it can
    /// only ever be executed once.
    pub(crate) async fn execute(mut self) -> DownloadReport {
        self.event_tx
            .send(Event::Started {
                file_name: self.file_name.clone(),
            })
            .ok();

        let connected = tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            res = self.connect() => res,
        };

        let error = match connected {
            Ok(mut stream) => {
                let outcome = tokio::select! {
                    _ = self.cancel.cancelled() => Err(Error::Cancelled),
                    res = self.exchange(&mut stream) => res,
                };
                // Single close point for every post-connect path
                stream.shutdown().await.ok();
                match outcome {
                    Ok(Exchange::Stored(bytes)) => {
                        self.bytes_written = bytes;
                        self.finish(DownloadState::Downloaded);
                        None
                    }
                    Ok(Exchange::Rejected) => {
                        self.finish(DownloadState::InvalidRequest);
                        None
                    }
                    Err(e) => {
                        self.finish(DownloadState::Failed);
                        Some(e.to_string())
                    }
                }
            }
            Err(e) => {
                self.finish(DownloadState::Failed);
                Some(e.to_string())
            }
        };

        self.report(error)
    }

    /// Open the connection, bounded by the configured connect timeout.
    async fn connect(&self) -> Result<TcpStream> {
        let target = (self.config.endpoint.host.as_str(), self.config.endpoint.port);
        let connecting = TcpStream::connect(target);
        let result = match self.config.connect_timeout {
            Some(bound) => tokio::time::timeout(bound, connecting)
                .await
                .map_err(|_| Error::Timeout("connect".to_string()))?,
            None => connecting.await,
        };
        result.map_err(|e| Error::Connect {
            endpoint: self.config.endpoint.to_string(),
            source: e,
        })
    }

    /// One full exchange: request, status code, body to EOF, file write.
    async fn exchange(&self, stream: &mut TcpStream) -> Result<Exchange> {
        self.timed("request write", wire::write_request(stream, &self.file_name))
            .await?;

        let code = self.timed("status read", wire::read_status(stream)).await?;
        if code == wire::INVALID_REQUEST {
            return Ok(Exchange::Rejected);
        }
        tracing::debug!(file = %self.file_name, code, "server accepted request");

        let body = self.read_body(stream).await?;
        tokio::fs::write(self.output_path(), &body).await?;
        Ok(Exchange::Stored(body.len() as u64))
    }

    /// Accumulate the response body in fixed-size chunks until the peer closes.
    async fn read_body(&self, stream: &mut TcpStream) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        let mut chunk = vec![0u8; self.config.read_chunk_size];
        loop {
            let n = self
                .timed("body read", async { Ok(stream.read(&mut chunk).await?) })
                .await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok(body)
    }

    /// Bound one I/O operation by the configured io timeout, if any.
    async fn timed<T>(
        &self,
        phase: &str,
        op: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.config.io_timeout {
            Some(bound) => tokio::time::timeout(bound, op)
                .await
                .map_err(|_| Error::Timeout(phase.to_string()))?,
            None => op.await,
        }
    }

    /// Output path: the requested name, verbatim, under the output directory.
    ///
    /// Names carrying path components are a known hazard of the wire contract;
    /// they are logged but not rewritten, since a paired server's tests may
    /// depend on the literal behavior.
    fn output_path(&self) -> PathBuf {
        let name = &self.file_name;
        if name.contains(['/', '\\']) || name == ".." {
            tracing::warn!(file = %name, "file name contains path components; writing verbatim");
        }
        self.config.output_dir.join(name)
    }

    /// Transition to a terminal state. The state moves exactly once.
    fn finish(&mut self, state: DownloadState) {
        debug_assert!(
            !self.state.is_terminal(),
            "download state already terminal: {:?}",
            self.state
        );
        if !self.state.is_terminal() {
            self.state = state;
        }
    }

    /// Emit the status line, the lifecycle event and the log record, then
    /// build the report.
    fn report(self, error: Option<String>) -> DownloadReport {
        let report = DownloadReport {
            file_name: self.file_name,
            state: self.state,
            bytes_written: self.bytes_written,
            error,
        };

        // One write under the stdout lock keeps each line intact even when
        // many tasks finish at once.
        {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", report.status_line());
        }

        let event = match report.state {
            DownloadState::Downloaded => {
                tracing::info!(
                    file = %report.file_name,
                    bytes = report.bytes_written,
                    "download complete"
                );
                Event::Completed {
                    file_name: report.file_name.clone(),
                    bytes: report.bytes_written,
                }
            }
            DownloadState::InvalidRequest => {
                tracing::warn!(file = %report.file_name, "server rejected file name");
                Event::Rejected {
                    file_name: report.file_name.clone(),
                }
            }
            _ => {
                let detail = report.error.clone().unwrap_or_default();
                tracing::error!(file = %report.file_name, error = %detail, "download failed");
                Event::Failed {
                    file_name: report.file_name.clone(),
                    error: detail,
                }
            }
        };
        self.event_tx.send(event).ok();

        report
    }
}
