//! Shared helpers for integration tests: a scripted mock file server speaking
//! the length-prefixed request / status-code / body-to-EOF protocol.

#![allow(dead_code)]

use multifetch::{wire, Config, ServerEndpoint};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// How the mock server treats one requested file name.
///
/// Names with no entry in the behavior map get `Reject`, mirroring a server
/// that refuses unknown files.
#[derive(Clone)]
pub enum Behavior {
    /// Send this status code, then the body, then close (EOF ends the body).
    Serve { code: i64, body: Vec<u8> },
    /// Answer with the invalid-request sentinel and close.
    Reject,
    /// Close cleanly after reading the request, before any status code.
    DropBeforeStatus,
    /// Send the status code and part of the body, then reset the connection.
    ResetMidBody { code: i64, partial: Vec<u8> },
    /// Read the request and never respond.
    Hang,
}

/// Handle to a running mock server.
pub struct MockServer {
    /// Address the server is listening on (always 127.0.0.1, ephemeral port)
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
}

impl MockServer {
    /// Number of connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Spawn a mock server on an ephemeral port. Each accepted connection is
/// handled independently: read one request, look up the behavior, act.
pub async fn spawn_server(behaviors: HashMap<String, Behavior>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server addr");
    let connections = Arc::new(AtomicUsize::new(0));

    let accepted = Arc::clone(&connections);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            accepted.fetch_add(1, Ordering::SeqCst);
            let behaviors = behaviors.clone();
            tokio::spawn(handle_connection(stream, behaviors));
        }
    });

    MockServer { addr, connections }
}

async fn handle_connection(mut stream: TcpStream, behaviors: HashMap<String, Behavior>) {
    let Ok(name) = wire::read_request(&mut stream).await else {
        return;
    };

    match behaviors.get(&name).cloned().unwrap_or(Behavior::Reject) {
        Behavior::Serve { code, body } => {
            wire::write_status(&mut stream, code).await.ok();
            stream.write_all(&body).await.ok();
            stream.shutdown().await.ok();
        }
        Behavior::Reject => {
            wire::write_status(&mut stream, wire::INVALID_REQUEST)
                .await
                .ok();
            stream.shutdown().await.ok();
        }
        Behavior::DropBeforeStatus => {
            drop(stream);
        }
        Behavior::ResetMidBody { code, partial } => {
            wire::write_status(&mut stream, code).await.ok();
            stream.write_all(&partial).await.ok();
            stream.flush().await.ok();
            // Let the partial bytes reach the client before the reset
            tokio::time::sleep(Duration::from_millis(50)).await;
            stream.set_linger(Some(Duration::ZERO)).ok();
            drop(stream);
        }
        Behavior::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
}

/// Config pointed at a mock server, writing into a test-owned directory,
/// with short timeouts so failure tests finish quickly.
pub fn test_config(addr: SocketAddr, output_dir: &Path) -> Config {
    Config {
        endpoint: ServerEndpoint::new(addr.ip().to_string(), addr.port()),
        output_dir: output_dir.to_path_buf(),
        connect_timeout: Some(Duration::from_secs(5)),
        io_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}
