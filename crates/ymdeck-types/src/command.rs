//! Remote operations a button press or inspector command can trigger.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A mutation of player state performed by clicking a control in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerCommand {
    TogglePlayback,
    PreviousTrack,
    NextTrack,
    LikeTrack,
    DislikeTrack,
    ToggleMute,
}

impl PlayerCommand {
    /// Wire name, identical to the inspector's `command` value.
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerCommand::TogglePlayback => "togglePlayback",
            PlayerCommand::PreviousTrack => "previousTrack",
            PlayerCommand::NextTrack => "nextTrack",
            PlayerCommand::LikeTrack => "likeTrack",
            PlayerCommand::DislikeTrack => "dislikeTrack",
            PlayerCommand::ToggleMute => "toggleMute",
        }
    }
}

impl fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
