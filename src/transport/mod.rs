//! Transport seam between the session and the network.
//!
//! The session never opens sockets itself. A driver owns the connection,
//! hands the session a [`Transport`] for outbound frames, and feeds inbound
//! frames to `Session::on_receive`.

use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::trace;

use crate::error::TransportError;

/// Outbound half of a connection.
pub trait Transport: Send {
    /// Sends one serialized message.
    fn send(&mut self, raw: &str) -> Result<(), TransportError>;

    /// Closes the connection. Further sends fail with `NotConnected`.
    fn close(&mut self);
}

/// Server address a session is connected to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Transport backed by a crossbeam channel.
///
/// Each sent frame becomes one `String` on the receiving end. Useful for
/// embedding the client in a process that owns the socket, and for tests.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: Sender<String>,
    open: bool,
}

impl ChannelTransport {
    /// Creates an open transport sending into `tx`.
    #[must_use]
    pub const fn new(tx: Sender<String>) -> Self {
        Self { tx, open: true }
    }

    /// Creates a transport together with the receiver of its frames.
    #[must_use]
    pub fn pair() -> (Self, Receiver<String>) {
        let (tx, rx) = unbounded();
        (Self::new(tx), rx)
    }

    /// Returns true until the transport is closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, raw: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.tx
            .send(raw.to_string())
            .map_err(|e| TransportError::SendFailed {
                message: e.to_string(),
            })?;
        trace!(bytes = raw.len(), "frame sent");
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }
}
