//! Transfer client.
//!
//! - `client`: session driver, opens files and runs a transfer to its end
//! - `config`: client configuration
//! - `transfer`: lock-step upload/download state machines

mod client;
mod config;
pub mod transfer;

pub use client::{Client, ClientError};
pub use config::ClientConfig;
pub use transfer::{TransferError, TransferOutcome};
