//! State synchronization between the player and the deck's buttons.
//!
//! The [`Relay`] turns host events into registry changes and player
//! commands. The [`Scheduler`] polls the player per capability and pushes
//! changes to every registered button, using the caches in [`cache`] to
//! suppress redundant work.

pub mod cache;
pub mod cover;
pub mod demo;
pub mod marquee;
pub mod registry;
pub mod relay;
pub mod scheduler;

pub use cache::{SyncState, NO_DATA};
pub use cover::{data_url, CoverError, CoverFetcher, HttpCoverFetcher};
pub use demo::DemoTimers;
pub use marquee::{scroll, ScrollCursor};
pub use registry::Registry;
pub use relay::Relay;
pub use scheduler::Scheduler;
