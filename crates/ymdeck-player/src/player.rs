//! Action executors and state reads against the player page.
//!
//! Every operation takes a session from the shared [`ConnectionManager`],
//! evaluates one query, and reduces the outcome to a `bool` (commands) or
//! an `Option` (reads). Faults are logged here and never propagate.

use std::collections::HashMap;

use serde_json::Value;
use ymdeck_browser::ConnectionManager;
use ymdeck_types::{PlayerCommand, TimeReading, TimeSnapshot, TrackSnapshot};

use crate::error::PlayerError;
use crate::query::{ControlQuery, Effect, FieldQuery, QueryOutcome};
use crate::selectors;

/// Executes player actions through the shared connection.
#[derive(Debug, Clone)]
pub struct Player {
    connection: ConnectionManager,
}

impl Player {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub async fn toggle_playback(&self) -> bool {
        self.click(selectors::playback(Effect::Click)).await
    }

    pub async fn previous_track(&self) -> bool {
        self.click(selectors::previous_track()).await
    }

    pub async fn next_track(&self) -> bool {
        self.click(selectors::next_track()).await
    }

    pub async fn like_track(&self) -> bool {
        self.click(selectors::like(Effect::Click)).await
    }

    pub async fn dislike_track(&self) -> bool {
        self.click(selectors::dislike()).await
    }

    pub async fn toggle_mute(&self) -> bool {
        self.click(selectors::mute(Effect::Click)).await
    }

    /// Run the click behind a command.
    pub async fn execute(&self, command: PlayerCommand) -> bool {
        match command {
            PlayerCommand::TogglePlayback => self.toggle_playback().await,
            PlayerCommand::PreviousTrack => self.previous_track().await,
            PlayerCommand::NextTrack => self.next_track().await,
            PlayerCommand::LikeTrack => self.like_track().await,
            PlayerCommand::DislikeTrack => self.dislike_track().await,
            PlayerCommand::ToggleMute => self.toggle_mute().await,
        }
    }

    /// `Some(true)` while a track is playing.
    pub async fn playback_state(&self) -> Option<bool> {
        self.probe(selectors::playback(Effect::Probe)).await
    }

    /// `Some(true)` when the current track is liked.
    pub async fn like_state(&self) -> Option<bool> {
        self.probe(selectors::like(Effect::Probe)).await
    }

    /// `Some(true)` while the player is muted.
    pub async fn mute_state(&self) -> Option<bool> {
        self.probe(selectors::mute(Effect::Probe)).await
    }

    /// Title, artist, and cover of the loaded track.
    pub async fn track_info(&self) -> Option<TrackSnapshot> {
        let query = selectors::track_info();
        let mut fields = match self.read_fields(&query).await {
            Ok(fields) => fields,
            Err(e) => {
                log_failure(&query.name, &e, true);
                return None;
            }
        };

        let original_cover_url = fields.remove(selectors::FIELD_COVER).unwrap_or_default();
        let track = TrackSnapshot {
            title: fields.remove(selectors::FIELD_TITLE).unwrap_or_default(),
            artist: fields.remove(selectors::FIELD_ARTIST).unwrap_or_default(),
            cover_url: upgrade_cover_url(&original_cover_url),
            original_cover_url,
        };
        tracing::debug!(
            title = %track.title,
            artist = %track.artist,
            cover = %track.cover_url,
            "read track info"
        );
        Some(track)
    }

    /// Elapsed and total time plus the progress slider position.
    pub async fn track_time(&self) -> Option<TimeReading> {
        let query = selectors::track_time();
        let mut fields = match self.read_fields(&query).await {
            Ok(fields) => fields,
            Err(e) => {
                log_failure(&query.name, &e, true);
                return None;
            }
        };

        let progress_value = parse_progress(fields.get(selectors::FIELD_PROGRESS), 0.0);
        let progress_max = parse_progress(fields.get(selectors::FIELD_PROGRESS_MAX), 100.0);
        let reading = TimeReading {
            time: TimeSnapshot {
                current_time_text: fields.remove(selectors::FIELD_CURRENT).unwrap_or_default(),
                total_time_text: fields.remove(selectors::FIELD_TOTAL).unwrap_or_default(),
            },
            progress_value,
            progress_max,
            progress_percent: progress_value / progress_max * 100.0,
        };
        tracing::trace!(
            current = %reading.time.current_time_text,
            total = %reading.time.total_time_text,
            percent = reading.progress_percent,
            "read track time"
        );
        Some(reading)
    }

    async fn click(&self, query: ControlQuery) -> bool {
        match self.run_control(&query).await {
            Ok(outcome) => {
                tracing::info!(
                    query = %query.name,
                    strategy = outcome.strategy.as_deref().unwrap_or("-"),
                    previous_state = ?outcome.was_previous_state,
                    "{}",
                    outcome.message
                );
                true
            }
            Err(e) => {
                log_failure(&query.name, &e, false);
                false
            }
        }
    }

    async fn probe(&self, query: ControlQuery) -> Option<bool> {
        match self.run_control(&query).await {
            Ok(outcome) => outcome.was_previous_state,
            Err(e) => {
                log_failure(&query.name, &e, true);
                None
            }
        }
    }

    async fn run_control(&self, query: &ControlQuery) -> Result<QueryOutcome, PlayerError> {
        let value = self.evaluate(&query.to_expression()).await?;
        checked(&query.name, value)
    }

    async fn read_fields(&self, query: &FieldQuery) -> Result<HashMap<String, String>, PlayerError> {
        let value = self.evaluate(&query.to_expression()).await?;
        Ok(checked(&query.name, value)?.fields)
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, PlayerError> {
        let session = self
            .connection
            .get_client()
            .await
            .ok_or(PlayerError::Unreachable)?;
        Ok(session.evaluate(expression).await?)
    }
}

/// Decode a script result and turn reported failures into errors.
fn checked(query: &str, value: Value) -> Result<QueryOutcome, PlayerError> {
    if !value.is_object() {
        return Err(PlayerError::Decode {
            query: query.to_string(),
            detail: format!("expected an object, got {value}"),
        });
    }
    let outcome: QueryOutcome =
        serde_json::from_value(value).map_err(|e| PlayerError::Decode {
            query: query.to_string(),
            detail: e.to_string(),
        })?;

    if outcome.success {
        Ok(outcome)
    } else if outcome.not_found {
        Err(PlayerError::ElementNotFound {
            query: query.to_string(),
            message: outcome.message,
        })
    } else {
        Err(PlayerError::Script {
            query: query.to_string(),
            message: outcome.message,
            detail: outcome.error,
        })
    }
}

/// Log a failed query. Polling reads pass `quiet` to keep misses at debug.
fn log_failure(query: &str, err: &PlayerError, quiet: bool) {
    match err {
        PlayerError::ElementNotFound { .. } if quiet => {
            tracing::debug!(query, error = %err, "control not on screen");
        }
        PlayerError::ElementNotFound { .. } => {
            tracing::info!(query, error = %err, "control not on screen");
        }
        PlayerError::Unreachable => {
            tracing::debug!(query, "skipped, player not reachable");
        }
        PlayerError::Script { detail, .. } => {
            tracing::warn!(query, error = %err, detail = detail.as_deref().unwrap_or("-"), "player script failed");
        }
        PlayerError::Decode { .. } | PlayerError::Browser(_) => {
            tracing::warn!(query, error = %err, "player query failed");
        }
    }
}

/// Ask the image CDN for the 400x400 rendition of a cover.
pub fn upgrade_cover_url(url: &str) -> String {
    for size in ["/100x100", "/200x200"] {
        if url.contains(size) {
            return url.replacen(size, "/400x400", 1);
        }
    }
    url.to_string()
}

/// Parse a slider property; empty, zero, or unparsable values use `default`.
fn parse_progress(raw: Option<&String>, default: f64) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use ymdeck_browser::{BrowserError, Connector, RemoteSession};
    use ymdeck_types::ReconnectConfig;

    /// Answers evaluations from a script of canned results.
    #[derive(Default)]
    struct ScriptedSession {
        answers: Mutex<VecDeque<Result<Value, BrowserError>>>,
        expressions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RemoteSession for ScriptedSession {
        async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
            self.expressions.lock().unwrap().push(expression.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }

        async fn close(&self) {}

        async fn closed(&self) {
            std::future::pending::<()>().await;
        }
    }

    struct ScriptedConnector {
        session: Option<Arc<ScriptedSession>>,
    }

    #[async_trait]
    impl Connector for ScriptedConnector {
        async fn connect(
            &self,
            _host: &str,
            port: u16,
        ) -> Result<Arc<dyn RemoteSession>, BrowserError> {
            match &self.session {
                Some(session) => {
                    let session: Arc<dyn RemoteSession> = session.clone();
                    Ok(session)
                }
                None => Err(BrowserError::ConnectionRefused { port }),
            }
        }
    }

    fn player_with(answers: Vec<Result<Value, BrowserError>>) -> (Player, Arc<ScriptedSession>) {
        let session = Arc::new(ScriptedSession {
            answers: Mutex::new(answers.into()),
            expressions: Mutex::default(),
        });
        let connector = Arc::new(ScriptedConnector {
            session: Some(session.clone()),
        });
        let connection =
            ConnectionManager::new(connector, "127.0.0.1", 9222, ReconnectConfig::default());
        (Player::new(connection), session)
    }

    fn unreachable_player() -> Player {
        let connector = Arc::new(ScriptedConnector { session: None });
        Player::new(ConnectionManager::new(
            connector,
            "127.0.0.1",
            9222,
            ReconnectConfig::default(),
        ))
    }

    #[tokio::test]
    async fn toggle_playback_clicks_through_interpreter() {
        let (player, session) = player_with(vec![Ok(serde_json::json!({
            "success": true,
            "message": "playback via pause-button",
            "strategy": "pause-button",
            "wasPreviousState": true
        }))]);

        assert!(player.toggle_playback().await);
        let expressions = session.expressions.lock().unwrap();
        assert_eq!(expressions.len(), 1);
        assert!(expressions[0].contains("\"effect\":\"click\""));
        assert!(expressions[0].contains("PAUSE_BUTTON"));
    }

    #[tokio::test]
    async fn missing_control_is_false() {
        let (player, _) = player_with(vec![Ok(serde_json::json!({
            "success": false,
            "notFound": true,
            "message": "next track: no matching element"
        }))]);
        assert!(!player.next_track().await);
    }

    #[tokio::test]
    async fn js_exception_is_false() {
        let (player, _) = player_with(vec![Err(BrowserError::JsException {
            message: "TypeError".into(),
        })]);
        assert!(!player.execute(PlayerCommand::ToggleMute).await);
    }

    #[tokio::test]
    async fn unreachable_player_fails_fast() {
        let player = unreachable_player();
        assert!(!player.toggle_playback().await);
        assert_eq!(player.playback_state().await, None);
        assert_eq!(player.track_info().await, None);
    }

    #[tokio::test]
    async fn probes_report_previous_state() {
        let (player, session) = player_with(vec![
            Ok(serde_json::json!({ "success": true, "wasPreviousState": true })),
            Ok(serde_json::json!({ "success": false, "notFound": true })),
            Ok(serde_json::json!({ "success": true, "strategy": "volume-off-sprite", "wasPreviousState": true })),
        ]);

        assert_eq!(player.like_state().await, Some(true));
        assert_eq!(player.playback_state().await, None);
        assert_eq!(player.mute_state().await, Some(true));
        assert!(session.expressions.lock().unwrap()[0].contains("\"effect\":\"probe\""));
    }

    #[tokio::test]
    async fn non_object_result_is_none() {
        let (player, _) = player_with(vec![Ok(Value::Null)]);
        assert_eq!(player.like_state().await, None);
    }

    #[tokio::test]
    async fn track_info_upgrades_cover() {
        let (player, _) = player_with(vec![Ok(serde_json::json!({
            "success": true,
            "fields": {
                "title": "Song",
                "artist": "Band",
                "cover": "https://avatars.yandex.net/get-music-content/1/abc/100x100"
            }
        }))]);

        let track = player.track_info().await.unwrap();
        assert_eq!(track.title, "Song");
        assert_eq!(track.artist, "Band");
        assert_eq!(
            track.cover_url,
            "https://avatars.yandex.net/get-music-content/1/abc/400x400"
        );
        assert_eq!(
            track.original_cover_url,
            "https://avatars.yandex.net/get-music-content/1/abc/100x100"
        );
    }

    #[tokio::test]
    async fn track_info_missing_fields_is_none() {
        let (player, _) = player_with(vec![Ok(serde_json::json!({
            "success": false,
            "notFound": true,
            "missing": ["cover"]
        }))]);
        assert!(player.track_info().await.is_none());
    }

    #[tokio::test]
    async fn track_time_applies_slider_defaults() {
        let (player, _) = player_with(vec![
            Ok(serde_json::json!({
                "success": true,
                "fields": { "current": "1:30", "total": "3:00", "progress": "90", "progressMax": "180" }
            })),
            Ok(serde_json::json!({
                "success": true,
                "fields": { "current": "0:00", "total": "3:00", "progress": "", "progressMax": "0" }
            })),
        ]);

        let first = player.track_time().await.unwrap();
        assert_eq!(first.time.display_text(), "1:30\n3:00");
        assert_eq!(first.progress_percent, 50.0);

        let second = player.track_time().await.unwrap();
        assert_eq!(second.progress_value, 0.0);
        assert_eq!(second.progress_max, 100.0);
        assert_eq!(second.progress_percent, 0.0);
    }

    #[test]
    fn cover_upgrade_rules() {
        assert_eq!(upgrade_cover_url("https://x/200x200"), "https://x/400x400");
        assert_eq!(upgrade_cover_url("https://x/400x400"), "https://x/400x400");
        assert_eq!(upgrade_cover_url("https://x/m1000x1000"), "https://x/m1000x1000");
        assert_eq!(upgrade_cover_url(""), "");
    }
}
