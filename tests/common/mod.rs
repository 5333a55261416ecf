//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::watch;

use ymdeck_browser::{BrowserError, ConnectionManager, Connector, RemoteSession};
use ymdeck_host::{HostEvent, HostSink, OutboundMessage};
use ymdeck_player::{MediaRemote, Player};
use ymdeck_sync::{CoverError, CoverFetcher, Relay, Scheduler};
use ymdeck_types::{ContextId, MarqueeConfig, PollingConfig, ReconnectConfig};

/// A player page that answers the player's queries from in-memory state.
pub struct FakePage {
    pub playing: AtomicBool,
    pub liked: AtomicBool,
    pub muted: AtomicBool,
    /// (title, artist, cover src)
    pub track: Mutex<Option<(String, String, String)>>,
    /// (current, total)
    pub time: Mutex<Option<(String, String)>>,
    pub evaluations: AtomicUsize,
    closed: watch::Sender<bool>,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            playing: AtomicBool::new(false),
            liked: AtomicBool::new(false),
            muted: AtomicBool::new(false),
            track: Mutex::new(None),
            time: Mutex::new(None),
            evaluations: AtomicUsize::new(0),
            closed: watch::channel(false).0,
        })
    }

    pub fn set_track(&self, title: &str, artist: &str, cover: &str) {
        *self.track.lock().unwrap() = Some((title.into(), artist.into(), cover.into()));
    }

    pub fn clear_track(&self) {
        *self.track.lock().unwrap() = None;
    }

    pub fn set_time(&self, current: &str, total: &str) {
        *self.time.lock().unwrap() = Some((current.into(), total.into()));
    }

    pub fn clear_time(&self) {
        *self.time.lock().unwrap() = None;
    }

    /// Simulate the browser dropping the debugging connection.
    pub fn drop_connection(&self) {
        self.closed.send_replace(true);
    }

    fn reopen(&self) {
        self.closed.send_replace(false);
    }

    fn control(flag: &AtomicBool, click: bool) -> Value {
        let previous = flag.load(Ordering::SeqCst);
        if click {
            flag.store(!previous, Ordering::SeqCst);
        }
        json!({ "success": true, "message": "ok", "strategy": "fake", "wasPreviousState": previous })
    }

    fn not_found() -> Value {
        json!({ "success": false, "notFound": true, "message": "not on screen" })
    }
}

#[async_trait]
impl RemoteSession for FakePage {
    async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        let click = expression.contains(r#""effect":"click""#);
        let named = |name: &str| expression.contains(&format!(r#""name":"{name}""#));

        let value = if named("playback") {
            Self::control(&self.playing, click)
        } else if named("like") {
            Self::control(&self.liked, click)
        } else if named("mute") {
            Self::control(&self.muted, click)
        } else if named("track info") {
            match self.track.lock().unwrap().clone() {
                Some((title, artist, cover)) => json!({
                    "success": true,
                    "fields": { "title": title, "artist": artist, "cover": cover }
                }),
                None => Self::not_found(),
            }
        } else if named("track time") {
            match self.time.lock().unwrap().clone() {
                Some((current, total)) => json!({
                    "success": true,
                    "fields": { "current": current, "total": total, "progress": "30", "progressMax": "120" }
                }),
                None => Self::not_found(),
            }
        } else {
            json!({ "success": true, "message": "clicked", "strategy": "fake" })
        };
        Ok(value)
    }

    async fn close(&self) {
        self.closed.send_replace(true);
    }

    async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// A browser exposing one page per debugging port.
#[derive(Default)]
pub struct FakeBrowser {
    pages: Mutex<HashMap<u16, Arc<FakePage>>>,
    pub connects: AtomicUsize,
}

impl FakeBrowser {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, port: u16, page: Arc<FakePage>) {
        self.pages.lock().unwrap().insert(port, page);
    }

    pub fn shut_down(&self, port: u16) {
        self.pages.lock().unwrap().remove(&port);
    }
}

#[async_trait]
impl Connector for FakeBrowser {
    async fn connect(
        &self,
        _host: &str,
        port: u16,
    ) -> Result<Arc<dyn RemoteSession>, BrowserError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let page = self.pages.lock().unwrap().get(&port).cloned();
        match page {
            Some(page) => {
                page.reopen();
                let session: Arc<dyn RemoteSession> = page;
                Ok(session)
            }
            None => Err(BrowserError::ConnectionRefused { port }),
        }
    }
}

/// Records everything sent to the host.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    /// Payloads of `sendToPropertyInspector` messages, draining the log.
    pub fn inspector_payloads(&self) -> Vec<Value> {
        self.take()
            .into_iter()
            .filter_map(|m| match m {
                OutboundMessage::SendToPropertyInspector { payload, .. } => Some(payload),
                _ => None,
            })
            .collect()
    }
}

impl HostSink for RecordingSink {
    fn send(&self, message: OutboundMessage) {
        self.sent.lock().unwrap().push(message);
    }

    fn plugin_uuid(&self) -> &str {
        "PLUGIN-UUID"
    }
}

/// Cover fetcher that encodes the URL itself and counts downloads.
#[derive(Default)]
pub struct FakeCovers {
    pub downloads: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeCovers {
    pub fn image_for(url: &str) -> String {
        format!("data:image/jpeg;base64,{url}")
    }
}

#[async_trait]
impl CoverFetcher for FakeCovers {
    async fn fetch(&self, url: &str) -> Result<String, CoverError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoverError::Transport {
                url: url.to_string(),
                reason: "connection reset".into(),
            });
        }
        Ok(Self::image_for(url))
    }
}

/// The full plugin stack wired to fakes at its edges.
pub struct Bridge {
    pub browser: Arc<FakeBrowser>,
    pub connection: ConnectionManager,
    pub sink: Arc<RecordingSink>,
    pub covers: Arc<FakeCovers>,
    pub relay: Relay,
}

impl Bridge {
    pub fn scheduler(&self) -> &Scheduler {
        self.relay.scheduler()
    }
}

/// Build the stack against `browser`, starting on `port`.
pub fn bridge(browser: Arc<FakeBrowser>, port: u16) -> Bridge {
    let connection = ConnectionManager::new(
        browser.clone(),
        "127.0.0.1",
        port,
        ReconnectConfig::default(),
    );
    let player: Arc<dyn MediaRemote> = Arc::new(Player::new(connection.clone()));
    let sink = Arc::new(RecordingSink::default());
    let covers = Arc::new(FakeCovers::default());
    let scheduler = Scheduler::new(
        player.clone(),
        sink.clone(),
        covers.clone(),
        PollingConfig::default(),
        &MarqueeConfig::default(),
    );
    let relay = Relay::new(player, sink.clone(), scheduler);
    Bridge {
        browser,
        connection,
        sink,
        covers,
        relay,
    }
}

pub const ACTION_PREFIX: &str = "com.whxtelxs.streamdock.yandexmusicajazz";

pub fn event(value: Value) -> HostEvent {
    HostEvent::decode(&value.to_string()).unwrap()
}

pub fn will_appear(suffix: &str, context: &str) -> HostEvent {
    event(json!({
        "event": "willAppear",
        "action": format!("{ACTION_PREFIX}.{suffix}"),
        "context": context,
        "device": "DEV",
        "payload": { "settings": {} }
    }))
}

pub fn will_disappear(suffix: &str, context: &str) -> HostEvent {
    event(json!({
        "event": "willDisappear",
        "action": format!("{ACTION_PREFIX}.{suffix}"),
        "context": context,
        "payload": {}
    }))
}

pub fn key_up(suffix: &str, context: &str) -> HostEvent {
    event(json!({
        "event": "keyUp",
        "action": format!("{ACTION_PREFIX}.{suffix}"),
        "context": context,
        "payload": {}
    }))
}

pub fn send_to_plugin(context: &str, payload: Value) -> HostEvent {
    event(json!({
        "event": "sendToPlugin",
        "action": format!("{ACTION_PREFIX}.demo"),
        "context": context,
        "payload": payload
    }))
}

pub fn ctx(id: &str) -> ContextId {
    ContextId::from(id)
}
