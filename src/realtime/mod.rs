//! Realtime game update stream over Socket.IO.

pub mod channel;
pub mod frame;
pub mod transport;

pub use channel::SessionChannel;
pub use transport::{Connector, Transport, TransportError, WebSocketConnector, WebSocketTransport};
