//! Protocol core.
//!
//! The pieces here are free of file and CLI concerns:
//! - `packet`: packet serialization and deserialization
//! - `socket`: datagram transport abstraction and its UDP implementation

mod packet;
mod socket;

pub use packet::{BLOCK_SIZE, Opcode, Packet, PacketError};
pub use socket::{Transport, UdpTransport};
