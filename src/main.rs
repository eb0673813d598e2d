//! Entry point for `tftpc`.
//!
//! Parses CLI arguments and dispatches into either a send (upload) or
//! receive (download) operation. All protocol work is delegated to library
//! modules; `main.rs` owns only process setup (logging, argument parsing)
//! and the mapping of outcomes to exit codes.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use tftpc::client::{Client, ClientConfig, ClientError, TransferOutcome};

// Exit codes: one per failure class. A server-reported error is a completed
// operation and exits 0 with the server's message printed.
const EXIT_ARGS: u8 = 1;
const EXIT_SOCKET: u8 = 2;
const EXIT_FILE: u8 = 3;
const EXIT_PROTOCOL: u8 = 4;

/// Lock-step TFTP-style file transfer client.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log per-block protocol progress.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    operation: Operation,
}

#[derive(Subcommand)]
enum Operation {
    /// Push a local file to the server.
    Send {
        /// Server host name or IP address.
        host: String,
        /// Server port number.
        port: u16,
        /// Local file to read.
        local_path: PathBuf,
        /// File name to write on the server.
        remote_path: String,
    },
    /// Pull a remote file to local storage.
    Receive {
        /// Server host name or IP address.
        host: String,
        /// Server port number.
        port: u16,
        /// Local file to create or overwrite.
        local_path: PathBuf,
        /// File name to read on the server.
        remote_path: String,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_ARGS);
        }
    };

    // Set RUST_LOG to override; --debug raises the default level.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.debug { "debug" } else { "info" }),
    )
    .init();

    match run(&cli) {
        Ok(TransferOutcome::Completed { .. }) => {
            println!("Operation completed");
            ExitCode::SUCCESS
        }
        Ok(TransferOutcome::ServerError { code, message }) => {
            println!("Server replied: {code}, {message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Map a failure back to its exit-code class.
///
/// `run` reports through `anyhow`, so the typed [`ClientError`] is
/// recovered by downcasting; anything unclassified counts as a protocol
/// failure.
fn exit_code_for(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ClientError>() {
        Some(ClientError::Socket(_)) => EXIT_SOCKET,
        Some(ClientError::FileAccess(_)) => EXIT_FILE,
        Some(ClientError::Transfer(_)) | None => EXIT_PROTOCOL,
    }
}

fn run(cli: &Cli) -> Result<TransferOutcome> {
    match &cli.operation {
        Operation::Send {
            host,
            port,
            local_path,
            remote_path,
        } => {
            let config = ClientConfig::new(resolve(host, *port)?, *port);
            Ok(Client::new(config).put(local_path, remote_path)?)
        }
        Operation::Receive {
            host,
            port,
            local_path,
            remote_path,
        } => {
            let config = ClientConfig::new(resolve(host, *port)?, *port);
            Ok(Client::new(config).get(remote_path, local_path)?)
        }
    }
}

/// Resolve a host name or address literal to a single IP address.
fn resolve(host: &str, port: u16) -> std::result::Result<IpAddr, ClientError> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(ClientError::Socket)?
        .next()
        .ok_or_else(|| {
            ClientError::Socket(io::Error::new(
                io::ErrorKind::NotFound,
                format!("unable to resolve host name: {host}"),
            ))
        })?;
    Ok(addr.ip())
}
