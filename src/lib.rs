//! Reconnecting real-time presence client for vault collaboration rooms.
//!
//! SYSTEM CONTEXT
//! ==============
//! A [`PresenceClient`] owns one WebSocket session to the backend's
//! `/api/realtime/ws` endpoint for a single (room, user) identity. A private
//! connection task holds the socket, the reconnect timer, and the room's
//! presence list; the facade talks to it over a control channel and observes
//! it through a `watch` subscription.
//!
//! `connection` holds the state enum and bounded retry counter, `presence`
//! the membership reducers, `dispatch` the outbound write path, and
//! `transport` the socket seam with its tokio-tungstenite implementation.

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod presence;
pub mod transport;

pub use client::{Identity, PresenceClient, PresenceSnapshot};
pub use config::PresenceConfig;
pub use connection::{ConnectionState, ReconnectCounter, ReconnectPolicy};
pub use error::{ConfigError, PresenceError};
pub use frames::{Command, Event, Outbound, PresenceEntry};
pub use presence::PresenceList;
pub use transport::{Connector, Transport, WsConnector};
