//! Lock-step TFTP-style file transfer client over UDP.
//!
//! Implements the classic lock-step transfer scheme: files move in 512-byte
//! blocks, each block acknowledged before the next one is sent, with a
//! short final block marking the end of the transfer. Five packet kinds
//! exist on the wire: read request, write request, data, acknowledgement
//! and error.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── core/           # Protocol core (no file or CLI concerns)
//! │   ├── packet      # Packet serialization/deserialization
//! │   └── socket      # Datagram transport abstraction
//! │
//! └── client/         # Transfer client
//!     ├── client      # Session driver (put/get)
//!     ├── config      # Client configuration
//!     └── transfer    # Lock-step upload/download state machines
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use tftpc::client::{Client, ClientConfig};
//! use std::path::Path;
//!
//! let config = ClientConfig::new("192.168.1.100".parse().unwrap(), 69);
//! let client = Client::new(config);
//! client.put(Path::new("local.bin"), "remote.bin").unwrap();
//! ```
//!
//! Known boundaries: there is no receive timeout (a silent peer blocks the
//! transfer until the process is signalled) and block numbers wrap after
//! 65536 blocks (~32 MB), both inherited from the wire format.

// Submodules
pub mod client;
pub mod core;
