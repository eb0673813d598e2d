//! Lock-step transfer state machines.
//!
//! [`upload`] pushes a local file to the peer block by block, waiting for
//! the matching ACK before each next block. [`download`] pulls a remote
//! file, writing each DATA payload at the offset its block number implies
//! and acknowledging it. In both directions a DATA payload shorter than
//! [`BLOCK_SIZE`] is the only end-of-transfer signal.
//!
//! The machines are generic over [`Transport`] and a seekable file handle,
//! so unit tests drive them with scripted datagrams and in-memory files.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::core::{BLOCK_SIZE, Opcode, Packet, PacketError, Transport};

/// Terminal state of a transfer.
///
/// A server-reported error is a normal terminal state, not a failure: the
/// peer declined or aborted the transfer and said why. The session simply
/// ends and the message is surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The final short block (and, for uploads, its ACK) was processed.
    Completed { blocks: u16, bytes: u64 },
    /// The peer answered with an ERROR packet.
    ServerError { code: u16, message: String },
}

/// Failures that abort a transfer mid-flight.
#[derive(Debug)]
pub enum TransferError {
    /// A send or receive syscall failed.
    Transport(io::Error),
    /// An expected ACK/DATA/ERROR packet was malformed, or an outbound
    /// packet could not be encoded.
    Packet(PacketError),
    /// Reading or writing the local file failed.
    File(io::Error),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::Transport(e) => write!(f, "transport failure: {e}"),
            TransferError::Packet(e) => write!(f, "protocol failure: {e}"),
            TransferError::File(e) => write!(f, "local file failure: {e}"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Transport(e) | TransferError::File(e) => Some(e),
            TransferError::Packet(e) => Some(e),
        }
    }
}

/// Push the contents of `file` to the peer under `remote_name`.
///
/// Sends a WRQ, then alternates between waiting for the ACK of the current
/// block and sending the next one. Datagrams that are not the awaited ACK
/// (unknown opcodes, stray requests, ACKs for other blocks) are logged and
/// ignored; only an ERROR packet or a malformed expected packet ends the
/// loop early. There is no receive timeout, so an unresponsive peer blocks
/// this call indefinitely.
pub fn upload<T, F>(
    transport: &mut T,
    file: &mut F,
    remote_name: &str,
    mode: &str,
) -> Result<TransferOutcome, TransferError>
where
    T: Transport,
    F: Read + Seek,
{
    let wrq = Packet::Wrq {
        filename: remote_name.to_owned(),
        mode: mode.to_owned(),
    };
    send_packet(transport, &wrq)?;

    // The WRQ is acknowledged with block 0; data blocks start at 1.
    let mut current: u16 = 0;
    let mut final_sent = false;
    let mut bytes_sent: u64 = 0;

    loop {
        let datagram = transport.recv().map_err(TransferError::Transport)?;
        if datagram.is_empty() {
            log::debug!("empty datagram, still waiting");
            continue;
        }
        let opcode = match Opcode::from_wire(&datagram) {
            Ok(op) => op,
            Err(e) => {
                log::warn!("ignoring unrecognized datagram: {e}");
                continue;
            }
        };
        match opcode {
            Opcode::Error => {
                if let Packet::Error { code, message } =
                    Packet::deserialize(&datagram).map_err(TransferError::Packet)?
                {
                    return Ok(TransferOutcome::ServerError { code, message });
                }
            }
            Opcode::Ack => {
                let packet = Packet::deserialize(&datagram).map_err(TransferError::Packet)?;
                if let Packet::Ack(block) = packet {
                    if block != current {
                        log::warn!("ignoring ack for block {block}, waiting for {current}");
                        continue;
                    }
                    if final_sent {
                        log::debug!("final block {current} acknowledged");
                        return Ok(TransferOutcome::Completed {
                            blocks: current,
                            bytes: bytes_sent,
                        });
                    }
                    let next = current.wrapping_add(1);
                    let chunk = read_block_at(file, next).map_err(TransferError::File)?;
                    final_sent = chunk.len() < BLOCK_SIZE;
                    bytes_sent += chunk.len() as u64;
                    log::debug!("sending block {next} ({} bytes)", chunk.len());
                    send_packet(
                        transport,
                        &Packet::Data {
                            block: next,
                            data: chunk,
                        },
                    )?;
                    current = next;
                }
            }
            other => {
                log::warn!("ignoring unexpected {other:?} packet while awaiting ack");
            }
        }
    }
}

/// Pull `remote_name` from the peer into `file`.
///
/// Sends an RRQ, then writes every DATA payload at the offset its block
/// number implies and acknowledges it. Writing by offset rather than
/// appending makes a duplicated or retransmitted block harmless: it
/// re-writes the same region. Everything that is not DATA or ERROR is
/// logged and ignored. As with [`upload`], there is no receive timeout.
pub fn download<T, F>(
    transport: &mut T,
    file: &mut F,
    remote_name: &str,
    mode: &str,
) -> Result<TransferOutcome, TransferError>
where
    T: Transport,
    F: Write + Seek,
{
    let rrq = Packet::Rrq {
        filename: remote_name.to_owned(),
        mode: mode.to_owned(),
    };
    send_packet(transport, &rrq)?;

    let mut expected: u16 = 1;
    let mut bytes_written: u64 = 0;

    loop {
        let datagram = transport.recv().map_err(TransferError::Transport)?;
        if datagram.is_empty() {
            log::debug!("empty datagram, still waiting");
            continue;
        }
        let opcode = match Opcode::from_wire(&datagram) {
            Ok(op) => op,
            Err(e) => {
                log::warn!("ignoring unrecognized datagram: {e}");
                continue;
            }
        };
        match opcode {
            Opcode::Error => {
                if let Packet::Error { code, message } =
                    Packet::deserialize(&datagram).map_err(TransferError::Packet)?
                {
                    return Ok(TransferOutcome::ServerError { code, message });
                }
            }
            Opcode::Data => {
                let packet = Packet::deserialize(&datagram).map_err(TransferError::Packet)?;
                if let Packet::Data { block, data } = packet {
                    if block == 0 {
                        // A conforming sender numbers data blocks from 1;
                        // block 0 has no file offset to land on.
                        log::warn!("ignoring data packet with block number 0");
                        continue;
                    }
                    if block != expected {
                        // Re-written region, not new data; keep the byte
                        // total at what the in-sequence blocks delivered.
                        log::warn!("out-of-sequence block {block}, expected {expected}");
                    } else {
                        expected = block.wrapping_add(1);
                        bytes_written += data.len() as u64;
                    }
                    write_block_at(file, block, &data).map_err(TransferError::File)?;
                    log::debug!("received block {block} ({} bytes)", data.len());
                    send_packet(transport, &Packet::Ack(block))?;
                    if data.len() < BLOCK_SIZE {
                        return Ok(TransferOutcome::Completed {
                            blocks: block,
                            bytes: bytes_written,
                        });
                    }
                }
            }
            other => {
                log::warn!("ignoring unexpected {other:?} packet while awaiting data");
            }
        }
    }
}

fn send_packet<T: Transport>(transport: &mut T, packet: &Packet) -> Result<(), TransferError> {
    let bytes = packet.serialize().map_err(TransferError::Packet)?;
    transport.send(&bytes).map_err(TransferError::Transport)
}

/// Read up to one block at the position block `block` implies.
///
/// Short reads are retried until the block is full or the file ends; a
/// short result therefore really is the final block.
fn read_block_at<F: Read + Seek>(file: &mut F, block: u16) -> io::Result<Vec<u8>> {
    // wrapping_sub keeps the 65536-block wraparound from panicking; the
    // resulting offsets repeat, a limitation inherited from the 16-bit
    // block number on the wire.
    let offset = u64::from(block.wrapping_sub(1)) * BLOCK_SIZE as u64;
    file.seek(SeekFrom::Start(offset))?;
    let mut chunk = vec![0u8; BLOCK_SIZE];
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match file.read(&mut chunk[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    chunk.truncate(filled);
    Ok(chunk)
}

/// Write one block's payload at the position its block number implies.
fn write_block_at<F: Write + Seek>(file: &mut F, block: u16, data: &[u8]) -> io::Result<()> {
    let offset = u64::from(block.wrapping_sub(1)) * BLOCK_SIZE as u64;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(data)
}
