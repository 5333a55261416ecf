//! Queries against the Yandex Music desktop player bar.
//!
//! Selectors follow the player's current markup. Class names carry build
//! hashes, so each control has a sprite-icon fallback and like/dislike
//! also have a positional one.

use crate::query::{
    ControlQuery, Effect, Field, FieldQuery, FieldRead, Pick, Scope, StateRule, Strategy,
};

pub const PLAYER_BAR: &str = ".PlayerBarDesktopWithBackgroundProgressBar_root__bpmwN";
pub const PLAYER_BAR_FALLBACK: &str = "[data-test-id=\"PLAYERBAR_DESKTOP\"]";
const SONATA_SECTION: &str = ".PlayerBarDesktopWithBackgroundProgressBar_sonata__mGFb_";

const PAUSE_BUTTON: &str =
    "button.BaseSonataControlsDesktop_sonataButton__GbwFt[data-test-id='PAUSE_BUTTON']";
const PLAY_BUTTON: &str =
    "button.BaseSonataControlsDesktop_sonataButton__GbwFt[data-test-id='PLAY_BUTTON']";
/// The big play button on album covers shares the test id.
const COVER_PLAY_BUTTON_CLASS: &str = "PlayButtonWithCover_playButton__rV9pQ";
const PAUSE_SPRITE: &str = "svg.BaseSonataControlsDesktop_playButtonIcon__TlFqv use[xlink:href='/icons/sprite.svg#pause_filled_l']";
const PLAY_SPRITE: &str = "svg.BaseSonataControlsDesktop_playButtonIcon__TlFqv use[xlink:href='/icons/sprite.svg#play_filled_l']";

const VOLUME_BUTTON: &str =
    "button.ChangeVolume_button__4HLEr[data-test-id='CHANGE_VOLUME_BUTTON']";
/// `aria-label` of the volume button while the player is muted.
pub const UNMUTE_LABEL: &str = "Включить звук";
const VOLUME_OFF_SPRITE: &str =
    "svg.ChangeVolume_icon__5Zv2a use[xlink:href='/icons/sprite.svg#volumeOff_xs']";
const VOLUME_ON_SPRITE: &str =
    "svg.ChangeVolume_icon__5Zv2a use[xlink:href='/icons/sprite.svg#volume_xs']";

const LIKED_SPRITE_TOKEN: &str = "liked_xs";

fn player_bar() -> Scope {
    Scope::Within {
        selectors: vec![PLAYER_BAR.to_string(), PLAYER_BAR_FALLBACK.to_string()],
    }
}

fn test_id(id: &str) -> String {
    format!("[data-test-id='{id}']")
}

/// Play/pause control; the reported state is "playing".
pub fn playback(effect: Effect) -> ControlQuery {
    ControlQuery {
        name: "playback".into(),
        scope: Scope::Document,
        strategies: vec![
            Strategy::css("pause-button", PAUSE_BUTTON, StateRule::Implied { state: true }),
            Strategy::css("play-button", PLAY_BUTTON, StateRule::Implied { state: false })
                .excluding_class(COVER_PLAY_BUTTON_CLASS),
            Strategy::sprite("pause-sprite", PAUSE_SPRITE, StateRule::Implied { state: true }),
            Strategy::sprite("play-sprite", PLAY_SPRITE, StateRule::Implied { state: false }),
        ],
        effect,
    }
}

/// Like control; the reported state is "liked".
pub fn like(effect: Effect) -> ControlQuery {
    let pressed = || StateRule::Pressed {
        sprite_token: LIKED_SPRITE_TOKEN.to_string(),
    };
    ControlQuery {
        name: "like".into(),
        scope: player_bar(),
        strategies: vec![
            Strategy::css("like-button", &test_id("LIKE_BUTTON"), pressed()),
            Strategy::positional("like-position", SONATA_SECTION, Pick::Last, pressed()),
        ],
        effect,
    }
}

pub fn dislike() -> ControlQuery {
    ControlQuery {
        name: "dislike".into(),
        scope: player_bar(),
        strategies: vec![
            Strategy::css("dislike-button", &test_id("DISLIKE_BUTTON"), StateRule::Unknown),
            Strategy::positional(
                "dislike-position",
                SONATA_SECTION,
                Pick::First,
                StateRule::Unknown,
            ),
        ],
        effect: Effect::Click,
    }
}

pub fn previous_track() -> ControlQuery {
    ControlQuery {
        name: "previous track".into(),
        scope: player_bar(),
        strategies: vec![Strategy::css(
            "previous-button",
            &test_id("PREVIOUS_TRACK_BUTTON"),
            StateRule::Unknown,
        )],
        effect: Effect::Click,
    }
}

pub fn next_track() -> ControlQuery {
    ControlQuery {
        name: "next track".into(),
        scope: player_bar(),
        strategies: vec![Strategy::css(
            "next-button",
            &test_id("NEXT_TRACK_BUTTON"),
            StateRule::Unknown,
        )],
        effect: Effect::Click,
    }
}

/// Volume control; the reported state is "muted".
pub fn mute(effect: Effect) -> ControlQuery {
    ControlQuery {
        name: "mute".into(),
        scope: Scope::Document,
        strategies: vec![
            Strategy::css(
                "volume-button",
                VOLUME_BUTTON,
                StateRule::AriaLabel {
                    equals: UNMUTE_LABEL.to_string(),
                },
            ),
            Strategy::sprite(
                "volume-off-sprite",
                VOLUME_OFF_SPRITE,
                StateRule::Implied { state: true },
            ),
            Strategy::sprite(
                "volume-on-sprite",
                VOLUME_ON_SPRITE,
                StateRule::Implied { state: false },
            ),
        ],
        effect,
    }
}

pub const FIELD_TITLE: &str = "title";
pub const FIELD_ARTIST: &str = "artist";
pub const FIELD_COVER: &str = "cover";

pub fn track_info() -> FieldQuery {
    FieldQuery {
        name: "track info".into(),
        scope: player_bar(),
        fields: vec![
            Field::new(
                FIELD_COVER,
                "img.PlayerBarDesktopWithBackgroundProgressBar_cover__MKmEt",
                FieldRead::Property { name: "src".into() },
            ),
            Field::new(
                FIELD_TITLE,
                "[data-test-id=\"TRACK_TITLE\"] .Meta_title__GGBnH",
                FieldRead::Text,
            ),
            Field::new(
                FIELD_ARTIST,
                "[data-test-id=\"SEPARATED_ARTIST_TITLE\"] .Meta_artistCaption__JESZi",
                FieldRead::Text,
            ),
        ],
    }
}

pub const FIELD_CURRENT: &str = "current";
pub const FIELD_TOTAL: &str = "total";
pub const FIELD_PROGRESS: &str = "progress";
pub const FIELD_PROGRESS_MAX: &str = "progressMax";

pub fn track_time() -> FieldQuery {
    let slider = "[data-test-id=\"TIMECODE_SLIDER\"]";
    FieldQuery {
        name: "track time".into(),
        scope: player_bar(),
        fields: vec![
            Field::new(
                FIELD_CURRENT,
                "[data-test-id=\"TIMECODE_TIME_START\"]",
                FieldRead::TrimmedText,
            ),
            Field::new(
                FIELD_TOTAL,
                "[data-test-id=\"TIMECODE_TIME_END\"]",
                FieldRead::TrimmedText,
            ),
            Field::new(
                FIELD_PROGRESS,
                slider,
                FieldRead::Property {
                    name: "value".into(),
                },
            ),
            Field::new(
                FIELD_PROGRESS_MAX,
                slider,
                FieldRead::Property { name: "max".into() },
            ),
        ],
    }
}
