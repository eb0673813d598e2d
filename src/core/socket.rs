//! Datagram transport abstraction.
//!
//! The transfer state machines speak [`Transport`] instead of a concrete
//! socket type, so tests can script a peer without touching the network.
//! [`UdpTransport`] is the real implementation over `std::net::UdpSocket`.

use std::io;
use std::net::{SocketAddr, UdpSocket};

/// Largest datagram we are prepared to receive. Protocol packets never
/// exceed 4 + 512 bytes, but a foreign datagram on our port may be bigger
/// and must not be truncated into something that parses.
const MAX_DATAGRAM: usize = 65_536;

/// One send/receive endpoint bound to a single peer.
///
/// `recv` blocks until a datagram arrives; no timeout is applied, so a
/// silent peer blocks the caller indefinitely. Stopping a stuck transfer
/// takes an external signal to the process.
pub trait Transport {
    /// Send one datagram to the peer.
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Block until the next datagram arrives and return an owned copy of
    /// its payload.
    fn recv(&mut self) -> io::Result<Vec<u8>>;
}

/// UDP implementation of [`Transport`].
///
/// The socket binds an ephemeral local port and addresses the peer with
/// `send_to`. The server side of this protocol answers from a freshly
/// allocated transfer port, so `recv` retargets the peer address to the
/// source of every datagram it accepts.
///
/// # Example
///
/// ```rust,no_run
/// use tftpc::core::Transport;
/// use tftpc::core::UdpTransport;
///
/// let mut t = UdpTransport::bind("192.0.2.10:69".parse().unwrap()).unwrap();
/// t.send(&[0, 4, 0, 0]).unwrap();
/// let reply = t.recv().unwrap();
/// ```
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Bind a local ephemeral socket directed at `peer`.
    pub fn bind(peer: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self { socket, peer })
    }

    /// The address the next `send` will target.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.socket.send_to(buf, self.peer)?;
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (n, from) = self.socket.recv_from(&mut buf)?;
        if from != self.peer {
            log::debug!("peer moved from {} to {}", self.peer, from);
            self.peer = from;
        }
        buf.truncate(n);
        Ok(buf)
    }
}
