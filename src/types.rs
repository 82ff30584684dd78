//! Core types for multifetch

use serde::{Deserialize, Serialize};

/// Target server for all downloads in one client.
///
/// Immutable once the client is constructed and shared read-only by every
/// download task; no task ever mutates it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Server host name or IP address
    pub host: String,
    /// Server TCP port
    pub port: u16,
}

impl ServerEndpoint {
    /// Create a new endpoint
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Terminal state of a single download task
///
/// A task starts at `NotStarted` and transitions exactly once to one of the
/// three terminal values; it never reverts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Task created but its protocol run has not reached a terminal state
    NotStarted,
    /// Full body received and written to disk
    Downloaded,
    /// Server rejected the file name (sentinel status code)
    InvalidRequest,
    /// Transport-level failure: connect, read/write, file I/O, timeout or cancellation
    Failed,
}

impl DownloadState {
    /// Human-readable status text used in the per-task status line
    pub fn status_text(&self) -> &'static str {
        match self {
            DownloadState::NotStarted => "Download Not Started",
            DownloadState::Downloaded => "Download Complete",
            DownloadState::InvalidRequest => "Invalid File Name",
            DownloadState::Failed => "Download Failed",
        }
    }

    /// Whether this is one of the three terminal values
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadState::NotStarted)
    }

    /// Convert the legacy integer state code to a DownloadState
    pub fn from_i32(state: i32) -> Self {
        match state {
            1 => DownloadState::NotStarted,
            2 => DownloadState::Downloaded,
            -1 => DownloadState::InvalidRequest,
            _ => DownloadState::Failed, // -2 and anything unknown
        }
    }

    /// Convert a DownloadState to the legacy integer state code
    pub fn to_i32(&self) -> i32 {
        match self {
            DownloadState::NotStarted => 1,
            DownloadState::Downloaded => 2,
            DownloadState::InvalidRequest => -1,
            DownloadState::Failed => -2,
        }
    }
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Outcome of one download task, returned through its join handle
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadReport {
    /// The requested file name (also the output path, verbatim)
    pub file_name: String,
    /// Terminal state the task reached
    pub state: DownloadState,
    /// Number of bytes written to the local file (0 unless `Downloaded`)
    pub bytes_written: u64,
    /// Failure detail when `state` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadReport {
    /// The exact status line each task emits when it finishes
    pub fn status_line(&self) -> String {
        format!(
            "Attempting to download: {} | Status: {}",
            self.file_name,
            self.state.status_text()
        )
    }
}

/// Event emitted during a download's lifecycle
///
/// Broadcast to all subscribers; if nobody is listening events are dropped.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task launched and about to connect
    Started {
        /// Requested file name
        file_name: String,
    },

    /// Body fully received and persisted
    Completed {
        /// Requested file name
        file_name: String,
        /// Bytes written to disk
        bytes: u64,
    },

    /// Server answered with the invalid-request sentinel
    Rejected {
        /// Requested file name
        file_name: String,
    },

    /// Transport failure, timeout or cancellation
    Failed {
        /// Requested file name
        file_name: String,
        /// Failure detail
        error: String,
    },
}
