//! # multifetch
//!
//! Concurrent one-connection-per-file retrieval client library.
//!
//! Given a server endpoint and a list of file names, `multifetch` opens one TCP
//! connection per file, sends a length-prefixed request for that file, reads
//! back either an invalid-request sentinel or the file's raw bytes, and writes
//! the bytes to local storage under the requested name. Every download runs as
//! an independent task; partial failures are tracked and reported per task and
//! never abort the rest.
//!
//! ## Quick Start
//!
//! ```no_run
//! use multifetch::{Config, FetchClient, ServerEndpoint};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         endpoint: ServerEndpoint::new("files.example.com", 6001),
//!         ..Default::default()
//!     };
//!
//!     let mut client = FetchClient::new(config)?;
//!     client.set_file_names(["a.txt", "b.bin"]);
//!
//!     // Fire-and-forget fan-out; joining is the caller's choice.
//!     let handles = client.start_download();
//!     for report in FetchClient::wait_all(handles).await {
//!         println!("{}", report.status_line());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Client and per-file download tasks
pub mod downloader;
/// Error types
pub mod error;
/// Core types and events
pub mod types;
/// Wire protocol codec
pub mod wire;

// Re-export commonly used types
pub use config::{Config, DEFAULT_HOST, DEFAULT_PORT};
pub use downloader::{DownloadHandle, FetchClient};
pub use error::{Error, Result};
pub use types::{DownloadReport, DownloadState, Event, ServerEndpoint};
