//! Immutable records of last-observed player state.

use serde::{Deserialize, Serialize};

/// The track currently loaded in the player bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshot {
    pub title: String,
    pub artist: String,
    /// Cover URL after the resolution upgrade.
    pub cover_url: String,
    /// Cover URL exactly as the page reported it.
    pub original_cover_url: String,
}

impl TrackSnapshot {
    /// Whether `other` shows the same track with the same cover.
    ///
    /// Used by the cover poller to decide whether a download is needed;
    /// `original_cover_url` does not take part.
    pub fn same_identity(&self, other: &TrackSnapshot) -> bool {
        self.title == other.title
            && self.artist == other.artist
            && self.cover_url == other.cover_url
    }

    /// Text shown on track-info buttons.
    pub fn display_text(&self) -> String {
        format!("{} - {}", self.title, self.artist)
    }
}

/// Elapsed and total time as the player renders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    pub current_time_text: String,
    pub total_time_text: String,
}

impl TimeSnapshot {
    /// Two-line title shown on time buttons.
    pub fn display_text(&self) -> String {
        format!("{}\n{}", self.current_time_text, self.total_time_text)
    }
}

/// A time read together with the progress slider position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeReading {
    pub time: TimeSnapshot,
    pub progress_value: f64,
    pub progress_max: f64,
    pub progress_percent: f64,
}
