//! Interactive CLI for the multifetch client.
//!
//! Prompts for a server host and port (with legacy defaults), then reads file
//! names one per line until a blank line, launches every download concurrently,
//! and waits for all of them before exiting.

use multifetch::{Config, DownloadState, FetchClient, ServerEndpoint, DEFAULT_HOST, DEFAULT_PORT};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn prompt(text: &str) -> std::io::Result<String> {
    let mut out = std::io::stdout().lock();
    write!(out, "{text}")?;
    out.flush()?;
    drop(out);

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn collect_input() -> std::io::Result<Option<(ServerEndpoint, Vec<String>)>> {
    let host_input = prompt("Enter server host (press enter for default): ")?;
    let host = if host_input.is_empty() {
        DEFAULT_HOST.to_string()
    } else {
        host_input
    };

    let port_input = prompt("Enter server port (press enter for default): ")?;
    let port = if port_input.is_empty() {
        DEFAULT_PORT
    } else {
        match port_input.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                eprintln!("Invalid port number: {port_input}");
                return Ok(None);
            }
        }
    };

    println!("Enter files to download, one per line. An empty line ends the list:");
    let mut names = Vec::new();
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let name = line.trim();
        if name.is_empty() {
            break;
        }
        names.push(name.to_string());
    }

    Ok(Some((ServerEndpoint::new(host, port), names)))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (endpoint, names) = match collect_input() {
        Ok(Some(input)) => input,
        Ok(None) => return ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Failed to read input: {e}");
            return ExitCode::FAILURE;
        }
    };

    if names.is_empty() {
        println!("No files requested.");
        return ExitCode::SUCCESS;
    }

    let config = Config {
        endpoint,
        ..Default::default()
    };
    let mut client = match FetchClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    client.set_file_names(names);

    let handles = client.start_download();
    println!("Started download of {} file(s)!", handles.len());

    let reports = FetchClient::wait_all(handles).await;
    let downloaded = reports
        .iter()
        .filter(|r| r.state == DownloadState::Downloaded)
        .count();
    let rejected = reports
        .iter()
        .filter(|r| r.state == DownloadState::InvalidRequest)
        .count();
    let failed = reports.len() - downloaded - rejected;
    println!("Finished: {downloaded} downloaded, {rejected} rejected, {failed} failed.");

    // Per-task outcomes are reported on their own status lines; the process
    // exit code does not depend on them.
    ExitCode::SUCCESS
}
