//! Configuration types

use crate::error::{Error, Result};
use crate::types::ServerEndpoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default server host when none is supplied
pub const DEFAULT_HOST: &str = "140.192.39.93";
/// Default server port when none is supplied
pub const DEFAULT_PORT: u16 = 6001;

/// Client configuration
///
/// Every field has a sensible default; `Config::default()` targets the legacy
/// default endpoint and writes into the current working directory, matching the
/// reference client's behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server to download from (shared read-only by all tasks)
    pub endpoint: ServerEndpoint,

    /// Directory output files are written into, flat, under their requested
    /// names. Defaults to the current working directory.
    pub output_dir: PathBuf,

    /// Bound on connection establishment. `None` blocks until the OS gives up.
    pub connect_timeout: Option<Duration>,

    /// Bound on each individual read/write operation during the exchange.
    /// `None` reproduces the reference client's unbounded blocking.
    pub io_timeout: Option<Duration>,

    /// Chunk size for reading the response body
    pub read_chunk_size: usize,

    /// Capacity of the event broadcast channel
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: ServerEndpoint::new(DEFAULT_HOST, DEFAULT_PORT),
            output_dir: PathBuf::from("."),
            connect_timeout: Some(Duration::from_secs(30)),
            io_timeout: Some(Duration::from_secs(60)),
            read_chunk_size: crate::wire::READ_CHUNK_SIZE,
            event_buffer: 256,
        }
    }
}

impl Config {
    /// Validate the configuration, failing fast before any task is launched.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.host.is_empty() {
            return Err(Error::config("endpoint.host", "host must not be empty"));
        }
        if self.endpoint.port == 0 {
            return Err(Error::config("endpoint.port", "port must not be zero"));
        }
        if self.read_chunk_size == 0 {
            return Err(Error::config(
                "read_chunk_size",
                "chunk size must be greater than zero",
            ));
        }
        if self.event_buffer == 0 {
            return Err(Error::config(
                "event_buffer",
                "event buffer capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}
