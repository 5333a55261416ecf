//! Last-known state shared by the pollers and the relay.

use ymdeck_types::{MarqueeConfig, TimeSnapshot, TrackSnapshot};

use crate::marquee::ScrollCursor;

/// Title shown on track-info buttons when no track can be read.
pub const NO_DATA: &str = "No data";

/// In-memory caches; nothing here is persisted.
#[derive(Debug)]
pub struct SyncState {
    /// Track whose cover was last broadcast.
    track: Option<TrackSnapshot>,
    /// Encoded cover for `track`. Kept across invalidation so that
    /// re-appearing buttons can be restored at once.
    image: Option<String>,
    time: Option<TimeSnapshot>,
    cursor: ScrollCursor,
    frame: Option<String>,
}

impl SyncState {
    pub fn new(marquee: &MarqueeConfig) -> Self {
        Self {
            track: None,
            image: None,
            time: None,
            cursor: ScrollCursor::new(marquee.window, marquee.step),
            frame: None,
        }
    }

    /// Whether `track` differs from the track whose cover is cached.
    pub fn cover_needs_refresh(&self, track: &TrackSnapshot) -> bool {
        self.track
            .as_ref()
            .map_or(true, |cached| !cached.same_identity(track))
    }

    pub fn store_cover(&mut self, track: TrackSnapshot, image: String) {
        self.track = Some(track);
        self.image = Some(image);
    }

    /// Force the next cover tick to download again.
    pub fn invalidate_cover(&mut self) {
        self.track = None;
    }

    /// Forget the cached track and its image.
    pub fn clear_cover(&mut self) {
        self.track = None;
        self.image = None;
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Store `time`, returning `true` when it differs from the cached value.
    pub fn update_time(&mut self, time: TimeSnapshot) -> bool {
        if self.time.as_ref() == Some(&time) {
            return false;
        }
        self.time = Some(time);
        true
    }

    pub fn clear_time(&mut self) {
        self.time = None;
    }

    pub fn time(&self) -> Option<&TimeSnapshot> {
        self.time.as_ref()
    }

    /// Next track-info frame; [`NO_DATA`] when `text` is absent.
    pub fn next_frame(&mut self, text: Option<&str>) -> String {
        let frame = match text {
            Some(text) => self.cursor.tick(text),
            None => {
                self.cursor.reset();
                NO_DATA.to_string()
            }
        };
        self.frame = Some(frame.clone());
        frame
    }

    /// Frame most recently emitted to track-info buttons.
    pub fn frame(&self) -> Option<&str> {
        self.frame.as_deref()
    }
}
