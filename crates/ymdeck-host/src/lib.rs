//! Plugin host glue for the Stream Deck / Stream Dock protocol.
//!
//! The host launches the plugin with its WebSocket port and identifiers,
//! then exchanges JSON frames: lifecycle and key events come in, title,
//! image, state, and inspector updates go out.
//!
//! - [`launch`]: argument normalization and the `-info` document
//! - [`event`]: typed inbound events and inspector commands
//! - [`outbound`]: outbound frames and the [`HostSink`] trait
//! - [`action`]: the static action table
//! - [`transport`]: the WebSocket connection

pub mod action;
pub mod error;
pub mod event;
pub mod launch;
pub mod outbound;
pub mod transport;

pub use action::{lookup, ActionSpec, ACTIONS};
pub use error::HostError;
pub use event::{port_from_value, ActionEvent, GlobalSettings, HostEvent, PluginCommand};
pub use launch::{normalize_args, HostInfo, LaunchInfo};
pub use outbound::{HostSink, OutboundMessage};
pub use transport::{connect, HostEvents, HostHandle};
