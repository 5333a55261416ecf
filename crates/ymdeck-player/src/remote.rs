//! The player as seen by the synchronization engine.

use async_trait::async_trait;
use ymdeck_types::{PlayerCommand, TimeReading, TrackSnapshot};

use crate::player::Player;

/// Everything the scheduler and the relay need from the player.
///
/// [`Player`] is the real implementation. Reads return `None` and commands
/// return `false` on any failure.
#[async_trait]
pub trait MediaRemote: Send + Sync {
    /// Whether the player can be reached right now.
    async fn check_connection(&self) -> bool;

    async fn playback_state(&self) -> Option<bool>;

    async fn like_state(&self) -> Option<bool>;

    async fn mute_state(&self) -> Option<bool>;

    async fn track_info(&self) -> Option<TrackSnapshot>;

    async fn track_time(&self) -> Option<TimeReading>;

    async fn execute(&self, command: PlayerCommand) -> bool;

    /// Reconnect on another debug port. `false` when unchanged or failed.
    async fn set_port(&self, port: u16) -> bool;

    fn port(&self) -> u16;
}

#[async_trait]
impl MediaRemote for Player {
    async fn check_connection(&self) -> bool {
        let connected = self.connection().check_connection().await;
        tracing::debug!(connected, "player connection check");
        connected
    }

    async fn playback_state(&self) -> Option<bool> {
        Player::playback_state(self).await
    }

    async fn like_state(&self) -> Option<bool> {
        Player::like_state(self).await
    }

    async fn mute_state(&self) -> Option<bool> {
        Player::mute_state(self).await
    }

    async fn track_info(&self) -> Option<TrackSnapshot> {
        Player::track_info(self).await
    }

    async fn track_time(&self) -> Option<TimeReading> {
        Player::track_time(self).await
    }

    async fn execute(&self, command: PlayerCommand) -> bool {
        Player::execute(self, command).await
    }

    async fn set_port(&self, port: u16) -> bool {
        self.connection().set_port(port).await
    }

    fn port(&self) -> u16 {
        self.connection().port()
    }
}
