//! Categories of synchronized player state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One category of state that buttons observe and the scheduler polls.
///
/// Every capability owns its own context set in the registry and its own
/// poller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Play/pause toggle, rendered through `setState`.
    PlayPause,
    /// Like toggle, rendered through `setState`.
    Like,
    /// Mute toggle, rendered through `setState`.
    Mute,
    /// Cover art, rendered through `setImage`.
    Cover,
    /// Scrolling "title - artist" text, rendered through `setTitle`.
    TrackInfo,
    /// Elapsed and total time, rendered through `setTitle`.
    TrackTime,
}

impl Capability {
    /// All capabilities in scheduler start order.
    pub const ALL: [Capability; 6] = [
        Capability::PlayPause,
        Capability::Like,
        Capability::Mute,
        Capability::Cover,
        Capability::TrackInfo,
        Capability::TrackTime,
    ];

    /// Short stable name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::PlayPause => "play_pause",
            Capability::Like => "like",
            Capability::Mute => "mute",
            Capability::Cover => "cover",
            Capability::TrackInfo => "track_info",
            Capability::TrackTime => "track_time",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
