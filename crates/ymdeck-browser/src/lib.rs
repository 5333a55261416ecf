//! DevTools plumbing for the ymdeck bridge.
//!
//! The player is a Chromium-based desktop app started with
//! `--remote-debugging-port`. This crate finds its page target, attaches
//! over the Chrome DevTools Protocol, and keeps one shared connection alive
//! for everything else in the plugin.
//!
//! # Architecture
//!
//! - **`cdp`**: WebSocket client with JSON-RPC command/response correlation
//!   and `Runtime.evaluate` support.
//! - **`discovery`**: `/json/list` lookup of the page target.
//! - **`session`**: the [`RemoteSession`] and [`Connector`] traits and their
//!   CDP-backed implementations.
//! - **`connection`**: [`ConnectionManager`], the reentrant connect,
//!   disconnect detection, and bounded reconnect.

pub mod cdp;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod session;

pub use cdp::CdpClient;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::BrowserError;
pub use session::{CdpConnector, CdpSession, Connector, RemoteSession};
