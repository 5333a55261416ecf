//! Player actions for the Yandex Music desktop app.
//!
//! Commands click controls in the player bar and state reads probe them,
//! all through `Runtime.evaluate` on the shared connection. Each control is
//! described as a [`ControlQuery`] with fallback strategies, see
//! [`selectors`].

pub mod error;
pub mod player;
pub mod query;
pub mod remote;
pub mod selectors;

pub use error::PlayerError;
pub use player::{upgrade_cover_url, Player};
pub use query::{ControlQuery, Effect, FieldQuery, QueryOutcome};
pub use remote::MediaRemote;
