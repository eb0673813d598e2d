use std::net::{IpAddr, SocketAddr};

/// Transfer client configuration.
///
/// All knobs are carried here and handed to the client at construction;
/// there is no global state. Per-block progress is emitted through the
/// `log` facade at debug level, so verbosity is a logger concern rather
/// than a client flag.
///
/// # Example
///
/// ```rust
/// use tftpc::client::ClientConfig;
///
/// let config = ClientConfig::new("192.168.1.100".parse().unwrap(), 69)
///     .with_mode("octet");
/// ```
pub struct ClientConfig {
    /// Server IP address.
    pub server_ip: IpAddr,
    /// Server port number.
    pub server_port: u16,
    /// Transfer mode string sent in requests (always "octet" in practice).
    pub mode: String,
}

impl ClientConfig {
    /// Create a new client configuration.
    ///
    /// # Arguments
    ///
    /// * `server_ip` - Server IP address
    /// * `server_port` - Server port number (usually 69)
    pub fn new(server_ip: IpAddr, server_port: u16) -> Self {
        Self {
            server_ip,
            server_port,
            mode: "octet".to_string(),
        }
    }

    /// Set the transfer mode string.
    pub fn with_mode(mut self, mode: &str) -> Self {
        self.mode = mode.to_string();
        self
    }

    /// The initial address requests are sent to.
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_ip, self.server_port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("127.0.0.1".parse().unwrap(), 69)
    }
}
