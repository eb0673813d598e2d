use std::fs::File;
use std::io;
use std::path::Path;

use super::config::ClientConfig;
use super::transfer::{self, TransferError, TransferOutcome};
use crate::core::UdpTransport;

/// Transfer client.
///
/// One instance drives one transfer at a time: [`Client::put`] pushes a
/// local file to the server, [`Client::get`] pulls a remote file to local
/// storage. The local file is opened before any network activity, so a bad
/// path fails without touching the wire.
///
/// # Example
///
/// ```rust,no_run
/// use tftpc::client::{Client, ClientConfig};
/// use std::path::Path;
///
/// let config = ClientConfig::new("192.168.1.100".parse().unwrap(), 69);
/// let client = Client::new(config);
///
/// // Download a file
/// client.get("remote.txt", Path::new("local.txt")).unwrap();
///
/// // Upload a file
/// client.put(Path::new("local.txt"), "remote.txt").unwrap();
/// ```
pub struct Client {
    config: ClientConfig,
}

/// Failures of a whole session, classified for exit-code reporting.
///
/// A server-reported error is deliberately absent here: the peer answering
/// with an ERROR packet ends the transfer normally (see
/// [`TransferOutcome::ServerError`]).
#[derive(Debug)]
pub enum ClientError {
    /// Opening the local file failed.
    FileAccess(io::Error),
    /// Binding the UDP socket failed.
    Socket(io::Error),
    /// The transfer itself aborted.
    Transfer(TransferError),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::FileAccess(e) => write!(f, "unable to open file: {e}"),
            ClientError::Socket(e) => write!(f, "unable to create UDP socket: {e}"),
            ClientError::Transfer(e) => write!(f, "unable to complete operation: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::FileAccess(e) | ClientError::Socket(e) => Some(e),
            ClientError::Transfer(e) => Some(e),
        }
    }
}

impl Client {
    /// Create a new transfer client.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Upload a file to the server (WRQ - Write Request)
    ///
    /// # Arguments
    ///
    /// * `local_file` - Local file path
    /// * `remote_file` - File name on the server
    pub fn put(&self, local_file: &Path, remote_file: &str) -> Result<TransferOutcome, ClientError> {
        log::info!("Uploading {} to {}", local_file.display(), remote_file);

        let mut file = File::open(local_file).map_err(ClientError::FileAccess)?;
        let mut transport =
            UdpTransport::bind(self.config.server_addr()).map_err(ClientError::Socket)?;

        let outcome = transfer::upload(&mut transport, &mut file, remote_file, &self.config.mode)
            .map_err(ClientError::Transfer)?;

        self.log_outcome(&outcome);
        Ok(outcome)
    }

    /// Download a file from the server (RRQ - Read Request)
    ///
    /// # Arguments
    ///
    /// * `remote_file` - File name on the server
    /// * `local_file` - Local save path
    pub fn get(&self, remote_file: &str, local_file: &Path) -> Result<TransferOutcome, ClientError> {
        log::info!("Downloading {} to {}", remote_file, local_file.display());

        let mut file = File::create(local_file).map_err(ClientError::FileAccess)?;
        let mut transport =
            UdpTransport::bind(self.config.server_addr()).map_err(ClientError::Socket)?;

        let outcome = transfer::download(&mut transport, &mut file, remote_file, &self.config.mode)
            .map_err(ClientError::Transfer)?;

        self.log_outcome(&outcome);
        Ok(outcome)
    }

    fn log_outcome(&self, outcome: &TransferOutcome) {
        match outcome {
            TransferOutcome::Completed { blocks, bytes } => {
                log::info!("Transfer complete: {blocks} blocks, {bytes} bytes");
            }
            TransferOutcome::ServerError { code, message } => {
                log::warn!("Server replied: {code}, {message}");
            }
        }
    }
}
