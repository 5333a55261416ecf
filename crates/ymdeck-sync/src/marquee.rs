//! Scrolling text for titles longer than a button can show.
//!
//! Text that fits is shown as is. Longer text gets three spaces appended
//! and is read circularly through a fixed-width window. Lengths count
//! Unicode scalar values.

/// Separator between the end of the text and its restart.
const GAP: &str = "   ";

/// The `window` characters of `text` visible at `position`.
pub fn scroll(text: &str, position: usize, window: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= window {
        return text.to_string();
    }

    let extended: Vec<char> = chars.into_iter().chain(GAP.chars()).collect();
    let len = extended.len();
    let start = position % len;
    (0..window).map(|i| extended[(start + i) % len]).collect()
}

/// Scroll position over one source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollCursor {
    source: String,
    position: f64,
    window: usize,
    step: f64,
}

impl ScrollCursor {
    pub fn new(window: usize, step: f64) -> Self {
        Self {
            source: String::new(),
            position: 0.0,
            window,
            step,
        }
    }

    /// Frame for `text` at the current position, then advance.
    ///
    /// A different `text` than last time restarts from the beginning.
    pub fn tick(&mut self, text: &str) -> String {
        if text != self.source {
            self.source = text.to_string();
            self.position = 0.0;
        }

        let frame = scroll(&self.source, self.position.floor() as usize, self.window);

        let period = self.source.chars().count() + GAP.chars().count();
        self.position += self.step;
        if self.position >= period as f64 {
            self.position -= period as f64;
        }
        frame
    }

    pub fn reset(&mut self) {
        self.source.clear();
        self.position = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_identity() {
        for p in 0..20 {
            assert_eq!(scroll("Song - A", p, 10), "Song - A");
        }
        assert_eq!(scroll("0123456789", 3, 10), "0123456789");
    }

    #[test]
    fn window_length_is_fixed() {
        let text = "A Rather Long Title - Somebody";
        for p in 0..100 {
            assert_eq!(scroll(text, p, 10).chars().count(), 10);
        }
    }

    #[test]
    fn position_zero_is_prefix() {
        assert_eq!(scroll("Hello, wonderful world", 0, 10), "Hello, won");
    }

    #[test]
    fn periodic_in_extended_length() {
        let text = "Hello, wonderful world";
        let m = text.chars().count() + 3;
        for p in 0..m {
            assert_eq!(scroll(text, p, 10), scroll(text, p + m, 10));
        }
    }

    #[test]
    fn wraps_through_gap() {
        // "abcdefghijk" + "   ", read from index 9.
        assert_eq!(scroll("abcdefghijk", 9, 5), "jk   ");
        assert_eq!(scroll("abcdefghijk", 12, 5), " abcd");
    }

    #[test]
    fn counts_scalar_values() {
        let text = "Кино - Группа крови";
        let frame = scroll(text, 0, 10);
        assert_eq!(frame, "Кино - Гру");
        assert_eq!(frame.chars().count(), 10);
    }

    #[test]
    fn cursor_advances_half_a_char_per_tick() {
        let mut cursor = ScrollCursor::new(5, 0.5);
        let text = "abcdefghijk";
        assert_eq!(cursor.tick(text), "abcde");
        assert_eq!(cursor.tick(text), "abcde");
        assert_eq!(cursor.tick(text), "bcdef");
        assert_eq!(cursor.tick(text), "bcdef");
        assert_eq!(cursor.tick(text), "cdefg");
    }

    #[test]
    fn cursor_resets_on_new_text() {
        let mut cursor = ScrollCursor::new(5, 1.0);
        cursor.tick("abcdefghijk");
        cursor.tick("abcdefghijk");
        assert_eq!(cursor.tick("abcdefghijk"), "cdefg");
        assert_eq!(cursor.tick("zyxwvutsrq"), "zyxwv");
        assert_eq!(cursor.tick("zyxwvutsrq"), "yxwvu");
    }

    #[test]
    fn cursor_wraps_after_full_period() {
        let mut cursor = ScrollCursor::new(5, 1.0);
        let text = "abcdefghijk";
        let frames: Vec<_> = (0..15).map(|_| cursor.tick(text)).collect();
        assert_eq!(frames[0], "abcde");
        assert_eq!(frames[14], "abcde");
    }
}
