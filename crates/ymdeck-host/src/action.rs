//! Static table of the plugin's actions.
//!
//! Actions are identified by the suffix of their UUID as declared in the
//! plugin manifest (`com.example.yandexmusic.ym-like` -> `ym-like`).

use ymdeck_types::{Capability, PlayerCommand};

/// What one action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub suffix: &'static str,
    /// State the action's buttons display, if any.
    pub capability: Option<Capability>,
    /// Command run when the key is released.
    pub key_command: Option<PlayerCommand>,
    /// Counter demo; shows a ticking image instead of player state.
    pub demo: bool,
}

impl ActionSpec {
    const fn new(
        suffix: &'static str,
        capability: Option<Capability>,
        key_command: Option<PlayerCommand>,
    ) -> Self {
        Self {
            suffix,
            capability,
            key_command,
            demo: false,
        }
    }
}

pub static ACTIONS: &[ActionSpec] = &[
    ActionSpec::new(
        "ym-play-pause",
        Some(Capability::PlayPause),
        Some(PlayerCommand::TogglePlayback),
    ),
    ActionSpec::new("ym-previous", None, Some(PlayerCommand::PreviousTrack)),
    ActionSpec::new("ym-next", None, Some(PlayerCommand::NextTrack)),
    ActionSpec::new(
        "ym-like",
        Some(Capability::Like),
        Some(PlayerCommand::LikeTrack),
    ),
    ActionSpec::new("ym-dislike", None, Some(PlayerCommand::DislikeTrack)),
    ActionSpec::new(
        "ym-mute",
        Some(Capability::Mute),
        Some(PlayerCommand::ToggleMute),
    ),
    ActionSpec::new("ym-cover", Some(Capability::Cover), None),
    ActionSpec::new("ym-track-info", Some(Capability::TrackInfo), None),
    ActionSpec::new("ym-time", Some(Capability::TrackTime), None),
    ActionSpec {
        suffix: "demo",
        capability: None,
        key_command: Some(PlayerCommand::TogglePlayback),
        demo: true,
    },
];

/// Find the entry for a full action UUID or a bare suffix.
pub fn lookup(action: &str) -> Option<&'static ActionSpec> {
    let suffix = action.rsplit('.').next().unwrap_or(action);
    ACTIONS.iter().find(|entry| entry.suffix == suffix)
}
