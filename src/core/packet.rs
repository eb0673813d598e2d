//! Packet serialization and deserialization.
//!
//! Every datagram exchanged with the server is one [`Packet`]. This module
//! owns the on-wire binary layout and nothing else — no I/O happens here.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//! RRQ/WRQ:  [opcode: 2][filename][0x00][mode][0x00]
//! DATA:     [0x0003][block: 2][payload: 0..=512 bytes]
//! ACK:      [0x0004][block: 2]
//! ERROR:    [0x0005][code: 2][message]
//! ```
//!
//! A DATA payload shorter than [`BLOCK_SIZE`] marks the final block of the
//! transfer; no explicit end-of-transfer packet exists.

/// Fixed transfer block size in bytes. A shorter DATA payload ends the
/// transfer.
pub const BLOCK_SIZE: usize = 512;

/// Byte length of the DATA/ACK/ERROR header: opcode plus block number or
/// error code.
const HEADER_LEN: usize = 4;

/// The 16-bit operation code at the start of every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Opcode {
    /// Read request: ask the server to send a file.
    Rrq = 1,
    /// Write request: ask the server to accept a file.
    Wrq = 2,
    /// One block of file data.
    Data = 3,
    /// Acknowledgement of a single block.
    Ack = 4,
    /// Error report from the peer.
    Error = 5,
}

impl Opcode {
    /// Read the opcode from the first two bytes of a raw datagram.
    ///
    /// Fails with [`PacketError::Truncated`] on a datagram too short to
    /// carry an opcode, and [`PacketError::UnknownOpcode`] when the value
    /// is outside 1..=5. Callers typically ignore such datagrams rather
    /// than abort (stray traffic on a UDP port is not fatal).
    pub fn from_wire(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < 2 {
            return Err(PacketError::Truncated);
        }
        match u16::from_be_bytes([buf[0], buf[1]]) {
            1 => Ok(Opcode::Rrq),
            2 => Ok(Opcode::Wrq),
            3 => Ok(Opcode::Data),
            4 => Ok(Opcode::Ack),
            5 => Ok(Opcode::Error),
            other => Err(PacketError::UnknownOpcode(other)),
        }
    }
}

/// A complete protocol packet.
///
/// Decoded packets own their data; nothing borrows the receive buffer past
/// the [`Packet::deserialize`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Read request (download).
    Rrq { filename: String, mode: String },
    /// Write request (upload).
    Wrq { filename: String, mode: String },
    /// One block of file data. Block numbers start at 1 and wrap at
    /// 65536 blocks (~32 MB at 512 bytes/block), a limit inherited from
    /// the wire format.
    Data { block: u16, data: Vec<u8> },
    /// Acknowledgement of `block`. Block 0 acknowledges a write request.
    Ack(u16),
    /// Error report; `message` is free text for the human on this end.
    Error { code: u16, message: String },
}

impl Packet {
    /// The opcode this packet serializes with.
    pub fn opcode(&self) -> Opcode {
        match self {
            Packet::Rrq { .. } => Opcode::Rrq,
            Packet::Wrq { .. } => Opcode::Wrq,
            Packet::Data { .. } => Opcode::Data,
            Packet::Ack(_) => Opcode::Ack,
            Packet::Error { .. } => Opcode::Error,
        }
    }

    /// Serialize this packet into a newly allocated byte vector.
    ///
    /// # Errors
    ///
    /// - [`PacketError::EmbeddedNul`] if a request filename or mode
    ///   contains a NUL byte (both strings are NUL-terminated on the wire).
    /// - [`PacketError::OversizedPayload`] if a DATA payload exceeds
    ///   [`BLOCK_SIZE`] bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let opcode = (self.opcode() as u16).to_be_bytes();
        match self {
            Packet::Rrq { filename, mode } | Packet::Wrq { filename, mode } => {
                if filename.as_bytes().contains(&0) || mode.as_bytes().contains(&0) {
                    return Err(PacketError::EmbeddedNul);
                }
                let mut buf = Vec::with_capacity(2 + filename.len() + mode.len() + 2);
                buf.extend_from_slice(&opcode);
                buf.extend_from_slice(filename.as_bytes());
                buf.push(0);
                buf.extend_from_slice(mode.as_bytes());
                buf.push(0);
                Ok(buf)
            }
            Packet::Data { block, data } => {
                if data.len() > BLOCK_SIZE {
                    return Err(PacketError::OversizedPayload(data.len()));
                }
                let mut buf = Vec::with_capacity(HEADER_LEN + data.len());
                buf.extend_from_slice(&opcode);
                buf.extend_from_slice(&block.to_be_bytes());
                buf.extend_from_slice(data);
                Ok(buf)
            }
            Packet::Ack(block) => {
                let mut buf = Vec::with_capacity(HEADER_LEN);
                buf.extend_from_slice(&opcode);
                buf.extend_from_slice(&block.to_be_bytes());
                Ok(buf)
            }
            Packet::Error { code, message } => {
                let mut buf = Vec::with_capacity(HEADER_LEN + message.len());
                buf.extend_from_slice(&opcode);
                buf.extend_from_slice(&code.to_be_bytes());
                buf.extend_from_slice(message.as_bytes());
                Ok(buf)
            }
        }
    }

    /// Parse a [`Packet`] from a raw datagram of the length actually
    /// received on the wire.
    ///
    /// # Errors
    ///
    /// - [`PacketError::UnknownOpcode`] for opcodes outside 1..=5.
    /// - [`PacketError::Truncated`] if the buffer is shorter than the
    ///   4-byte header of a DATA/ACK/ERROR packet.
    /// - [`PacketError::BadString`] if a request body is missing one of
    ///   its NUL terminators or holds non-UTF-8 text.
    pub fn deserialize(buf: &[u8]) -> Result<Self, PacketError> {
        match Opcode::from_wire(buf)? {
            op @ (Opcode::Rrq | Opcode::Wrq) => {
                let (filename, rest) = read_cstr(&buf[2..])?;
                let (mode, _) = read_cstr(rest)?;
                Ok(match op {
                    Opcode::Rrq => Packet::Rrq { filename, mode },
                    _ => Packet::Wrq { filename, mode },
                })
            }
            Opcode::Data => {
                if buf.len() < HEADER_LEN {
                    return Err(PacketError::Truncated);
                }
                Ok(Packet::Data {
                    block: u16::from_be_bytes([buf[2], buf[3]]),
                    data: buf[HEADER_LEN..].to_vec(),
                })
            }
            Opcode::Ack => {
                if buf.len() < HEADER_LEN {
                    return Err(PacketError::Truncated);
                }
                Ok(Packet::Ack(u16::from_be_bytes([buf[2], buf[3]])))
            }
            Opcode::Error => {
                if buf.len() < HEADER_LEN {
                    return Err(PacketError::Truncated);
                }
                Ok(Packet::Error {
                    code: u16::from_be_bytes([buf[2], buf[3]]),
                    // Error text is not required to be NUL-terminated.
                    message: String::from_utf8_lossy(&buf[HEADER_LEN..]).into_owned(),
                })
            }
        }
    }
}

/// Split one NUL-terminated string off the front of `buf`, returning it
/// together with the bytes after the terminator.
fn read_cstr(buf: &[u8]) -> Result<(String, &[u8]), PacketError> {
    let nul = buf
        .iter()
        .position(|&b| b == 0)
        .ok_or(PacketError::BadString)?;
    let s = std::str::from_utf8(&buf[..nul]).map_err(|_| PacketError::BadString)?;
    Ok((s.to_owned(), &buf[nul + 1..]))
}

/// Errors that can arise when building or parsing a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Datagram shorter than the header of the packet kind it claims.
    Truncated,
    /// Opcode outside the 1..=5 range the protocol defines.
    UnknownOpcode(u16),
    /// A request filename or mode contains a NUL byte and cannot be
    /// represented on the wire.
    EmbeddedNul,
    /// A DATA payload longer than [`BLOCK_SIZE`].
    OversizedPayload(usize),
    /// A request body is missing a NUL terminator or holds invalid UTF-8.
    BadString,
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::Truncated => write!(f, "datagram too short for its packet header"),
            PacketError::UnknownOpcode(op) => write!(f, "unknown opcode {op}"),
            PacketError::EmbeddedNul => write!(f, "filename or mode contains a NUL byte"),
            PacketError::OversizedPayload(len) => {
                write!(f, "data payload of {len} bytes exceeds the {BLOCK_SIZE}-byte block")
            }
            PacketError::BadString => write!(f, "malformed string field in request body"),
        }
    }
}

impl std::error::Error for PacketError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        for pkt in [
            Packet::Rrq {
                filename: "remote.bin".into(),
                mode: "octet".into(),
            },
            Packet::Wrq {
                filename: "dest/path.txt".into(),
                mode: "octet".into(),
            },
        ] {
            let bytes = pkt.serialize().unwrap();
            assert_eq!(Packet::deserialize(&bytes).unwrap(), pkt);
        }
    }

    #[test]
    fn request_wire_layout() {
        let bytes = Packet::Rrq {
            filename: "f".into(),
            mode: "octet".into(),
        }
        .serialize()
        .unwrap();
        assert_eq!(bytes, b"\x00\x01f\x00octet\x00");
    }

    #[test]
    fn empty_filename_is_allowed() {
        let pkt = Packet::Wrq {
            filename: String::new(),
            mode: "octet".into(),
        };
        let bytes = pkt.serialize().unwrap();
        assert_eq!(Packet::deserialize(&bytes).unwrap(), pkt);
    }

    #[test]
    fn embedded_nul_is_rejected() {
        let pkt = Packet::Wrq {
            filename: "bad\0name".into(),
            mode: "octet".into(),
        };
        assert_eq!(pkt.serialize(), Err(PacketError::EmbeddedNul));
    }

    #[test]
    fn request_missing_terminator_is_rejected() {
        // Opcode + filename, but no NUL after the mode.
        assert_eq!(
            Packet::deserialize(b"\x00\x01file\x00octet"),
            Err(PacketError::BadString)
        );
    }

    #[test]
    fn data_roundtrip_all_boundary_lengths() {
        for len in [0usize, 1, 511, 512] {
            let pkt = Packet::Data {
                block: 4711,
                data: vec![0xa5; len],
            };
            let bytes = pkt.serialize().unwrap();
            assert_eq!(bytes.len(), 4 + len);
            assert_eq!(Packet::deserialize(&bytes).unwrap(), pkt);
        }
    }

    #[test]
    fn data_block_number_is_big_endian() {
        let bytes = Packet::Data {
            block: 0x0102,
            data: vec![0xff],
        }
        .serialize()
        .unwrap();
        assert_eq!(bytes, [0x00, 0x03, 0x01, 0x02, 0xff]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let pkt = Packet::Data {
            block: 1,
            data: vec![0; BLOCK_SIZE + 1],
        };
        assert_eq!(pkt.serialize(), Err(PacketError::OversizedPayload(513)));
    }

    #[test]
    fn ack_roundtrip_extremes() {
        for block in [0u16, 1, 0x7fff, u16::MAX] {
            let bytes = Packet::Ack(block).serialize().unwrap();
            assert_eq!(bytes.len(), 4);
            assert_eq!(Packet::deserialize(&bytes).unwrap(), Packet::Ack(block));
        }
    }

    #[test]
    fn error_roundtrip_has_no_trailing_nul() {
        let pkt = Packet::Error {
            code: 2,
            message: "Access violation".into(),
        };
        let bytes = pkt.serialize().unwrap();
        assert_eq!(bytes.last(), Some(&b'n'));
        assert_eq!(Packet::deserialize(&bytes).unwrap(), pkt);
    }

    #[test]
    fn error_with_empty_text() {
        let bytes = Packet::Error {
            code: 0,
            message: String::new(),
        }
        .serialize()
        .unwrap();
        assert_eq!(bytes.len(), 4);
        assert_eq!(
            Packet::deserialize(&bytes).unwrap(),
            Packet::Error {
                code: 0,
                message: String::new()
            }
        );
    }

    #[test]
    fn opcode_from_wire() {
        assert_eq!(Opcode::from_wire(&[0x00, 0x03, 0x00]), Ok(Opcode::Data));
        assert_eq!(Opcode::from_wire(&[0x00]), Err(PacketError::Truncated));
        assert_eq!(Opcode::from_wire(&[]), Err(PacketError::Truncated));
        assert_eq!(
            Opcode::from_wire(&[0x00, 0x06]),
            Err(PacketError::UnknownOpcode(6))
        );
        assert_eq!(
            Opcode::from_wire(&[0x00, 0x00]),
            Err(PacketError::UnknownOpcode(0))
        );
        assert_eq!(
            Opcode::from_wire(&[0xff, 0x05]),
            Err(PacketError::UnknownOpcode(0xff05))
        );
    }

    #[test]
    fn short_body_is_truncated_for_each_kind() {
        for opcode in [3u8, 4, 5] {
            assert_eq!(
                Packet::deserialize(&[0x00, opcode, 0x00]),
                Err(PacketError::Truncated)
            );
        }
    }
}
