//! Fixed-interval pollers, one per capability.
//!
//! Each poller runs its ticks sequentially inside its own task, so ticks of
//! one capability never overlap and a slow capability never delays another.
//! A tick does nothing while no button observes the capability or while the
//! player is unreachable.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use ymdeck_host::HostSink;
use ymdeck_player::MediaRemote;
use ymdeck_types::{Capability, ContextId, MarqueeConfig, PollingConfig};

use crate::cache::SyncState;
use crate::cover::CoverFetcher;
use crate::registry::Registry;

/// Owns the registry, the caches, and the poller tasks.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn MediaRemote>,
    sink: Arc<dyn HostSink>,
    covers: Arc<dyn CoverFetcher>,
    polling: PollingConfig,
    registry: Mutex<Registry>,
    state: Mutex<SyncState>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    pub fn new(
        remote: Arc<dyn MediaRemote>,
        sink: Arc<dyn HostSink>,
        covers: Arc<dyn CoverFetcher>,
        polling: PollingConfig,
        marquee: &MarqueeConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                sink,
                covers,
                polling,
                registry: Mutex::new(Registry::new()),
                state: Mutex::new(SyncState::new(marquee)),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Start one poller per capability, replacing any running pollers.
    pub fn start(&self) {
        let mut tasks = lock(&self.inner.tasks);
        for task in tasks.drain(..) {
            task.abort();
        }
        for capability in Capability::ALL {
            let period = self.inner.polling.interval(capability);
            let weak = Arc::downgrade(&self.inner);
            tasks.push(tokio::spawn(run_poller(weak, capability, period)));
        }
        tracing::info!(pollers = tasks.len(), "state polling started");
    }

    /// Abort every poller.
    pub fn stop(&self) {
        let mut tasks = lock(&self.inner.tasks);
        if tasks.is_empty() {
            return;
        }
        for task in tasks.drain(..) {
            task.abort();
        }
        tracing::info!("state polling stopped");
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.tasks).iter().any(|t| !t.is_finished())
    }

    pub fn contexts(&self, capability: Capability) -> Vec<ContextId> {
        lock(&self.inner.registry).contexts(capability)
    }

    /// Register a button and bring it up to date.
    ///
    /// Cover buttons seen for the first time force a fresh download on the
    /// next tick. Cached images and titles are pushed right away; toggle
    /// buttons are polled immediately.
    pub async fn on_appear(&self, capability: Capability, context: ContextId) {
        let added = lock(&self.inner.registry).register(capability, context.clone());
        tracing::debug!(capability = %capability, context = %context, added, "button appeared");

        match capability {
            Capability::Cover => {
                let image = {
                    let mut state = lock(&self.inner.state);
                    if added {
                        state.invalidate_cover();
                    }
                    state.image().map(str::to_owned)
                };
                if let Some(image) = image {
                    self.inner.sink.set_image(&context, &image);
                }
            }
            Capability::TrackInfo => {
                let frame = lock(&self.inner.state).frame().map(str::to_owned);
                if let Some(frame) = frame {
                    self.inner.sink.set_title(&context, &frame);
                }
            }
            Capability::TrackTime => {
                let text = lock(&self.inner.state).time().map(|t| t.display_text());
                if let Some(text) = text {
                    self.inner.sink.set_title(&context, &text);
                }
            }
            Capability::PlayPause | Capability::Like | Capability::Mute => {
                self.poll_once(capability).await;
            }
        }
    }

    pub fn on_disappear(&self, capability: Capability, context: &ContextId) {
        let removed = lock(&self.inner.registry).unregister(capability, context);
        tracing::debug!(capability = %capability, context = %context, removed, "button disappeared");
    }

    /// Run a single tick for `capability`.
    pub async fn poll_once(&self, capability: Capability) {
        if lock(&self.inner.registry).is_empty(capability) {
            return;
        }
        if !self.inner.remote.check_connection().await {
            tracing::trace!(capability = %capability, "player unreachable, skipping tick");
            return;
        }

        match capability {
            Capability::PlayPause => {
                let state = self.inner.remote.playback_state().await;
                self.broadcast_state(capability, state);
            }
            Capability::Like => {
                let state = self.inner.remote.like_state().await;
                self.broadcast_state(capability, state);
            }
            Capability::Mute => {
                let state = self.inner.remote.mute_state().await;
                self.broadcast_state(capability, state);
            }
            Capability::Cover => self.sync_cover().await,
            Capability::TrackInfo => self.sync_track_info().await,
            Capability::TrackTime => self.sync_time().await,
        }
    }

    fn broadcast_state(&self, capability: Capability, state: Option<bool>) {
        let Some(on) = state else {
            tracing::debug!(capability = %capability, "state unavailable");
            return;
        };
        for context in self.contexts(capability) {
            self.inner.sink.set_state(&context, on);
        }
    }

    async fn sync_cover(&self) {
        let Some(track) = self.inner.remote.track_info().await else {
            lock(&self.inner.state).clear_cover();
            return;
        };
        if !lock(&self.inner.state).cover_needs_refresh(&track) {
            return;
        }
        if track.cover_url.is_empty() {
            tracing::debug!(title = %track.title, "track has no cover");
            return;
        }

        let image = match self.inner.covers.fetch(&track.cover_url).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "cover download failed, will retry");
                return;
            }
        };

        tracing::info!(title = %track.title, artist = %track.artist, "cover changed");
        lock(&self.inner.state).store_cover(track, image.clone());
        for context in self.contexts(Capability::Cover) {
            self.inner.sink.set_image(&context, &image);
        }
    }

    async fn sync_track_info(&self) {
        let text = self
            .inner
            .remote
            .track_info()
            .await
            .map(|track| track.display_text());
        let frame = lock(&self.inner.state).next_frame(text.as_deref());
        for context in self.contexts(Capability::TrackInfo) {
            self.inner.sink.set_title(&context, &frame);
        }
    }

    async fn sync_time(&self) {
        let Some(reading) = self.inner.remote.track_time().await else {
            lock(&self.inner.state).clear_time();
            return;
        };
        let text = reading.time.display_text();
        if !lock(&self.inner.state).update_time(reading.time) {
            return;
        }
        for context in self.contexts(Capability::TrackTime) {
            self.inner.sink.set_title(&context, &text);
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("polling", &self.inner.polling)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run_poller(inner: Weak<Inner>, capability: Capability, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        Scheduler { inner }.poll_once(capability).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use ymdeck_host::OutboundMessage;
    use ymdeck_types::{PlayerCommand, TimeReading, TimeSnapshot, TrackSnapshot};

    use crate::cover::CoverError;

    #[derive(Default)]
    struct FakeRemote {
        reachable: AtomicBool,
        liked: Mutex<Option<bool>>,
        track: Mutex<Option<TrackSnapshot>>,
        time: Mutex<Option<TimeSnapshot>>,
        checks: AtomicUsize,
    }

    #[async_trait]
    impl MediaRemote for FakeRemote {
        async fn check_connection(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.reachable.load(Ordering::SeqCst)
        }
        async fn playback_state(&self) -> Option<bool> {
            Some(true)
        }
        async fn like_state(&self) -> Option<bool> {
            *self.liked.lock().unwrap()
        }
        async fn mute_state(&self) -> Option<bool> {
            Some(false)
        }
        async fn track_info(&self) -> Option<TrackSnapshot> {
            self.track.lock().unwrap().clone()
        }
        async fn track_time(&self) -> Option<TimeReading> {
            self.time.lock().unwrap().clone().map(|time| TimeReading {
                time,
                progress_value: 0.0,
                progress_max: 100.0,
                progress_percent: 0.0,
            })
        }
        async fn execute(&self, _command: PlayerCommand) -> bool {
            true
        }
        async fn set_port(&self, _port: u16) -> bool {
            false
        }
        fn port(&self) -> u16 {
            9222
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<OutboundMessage> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    impl HostSink for Recorder {
        fn send(&self, message: OutboundMessage) {
            self.sent.lock().unwrap().push(message);
        }
        fn plugin_uuid(&self) -> &str {
            "UUID"
        }
    }

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl CoverFetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<String, CoverError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(CoverError::Status {
                    url: url.to_string(),
                    status: 500,
                });
            }
            Ok(format!("data:image/jpeg;base64,{url}"))
        }
    }

    struct Fixture {
        remote: Arc<FakeRemote>,
        sink: Arc<Recorder>,
        covers: Arc<CountingFetcher>,
        scheduler: Scheduler,
    }

    fn fixture() -> Fixture {
        let remote = Arc::new(FakeRemote::default());
        remote.reachable.store(true, Ordering::SeqCst);
        let sink = Arc::new(Recorder::default());
        let covers = Arc::new(CountingFetcher::default());
        let scheduler = Scheduler::new(
            remote.clone(),
            sink.clone(),
            covers.clone(),
            PollingConfig::default(),
            &MarqueeConfig::default(),
        );
        Fixture {
            remote,
            sink,
            covers,
            scheduler,
        }
    }

    fn track(title: &str) -> TrackSnapshot {
        TrackSnapshot {
            title: title.into(),
            artist: "Artist".into(),
            cover_url: format!("https://img/{title}/400x400"),
            original_cover_url: format!("https://img/{title}/100x100"),
        }
    }

    fn time(current: &str) -> TimeSnapshot {
        TimeSnapshot {
            current_time_text: current.into(),
            total_time_text: "3:45".into(),
        }
    }

    #[tokio::test]
    async fn empty_registry_skips_remote() {
        let f = fixture();
        f.scheduler.poll_once(Capability::Like).await;
        assert_eq!(f.remote.checks.load(Ordering::SeqCst), 0);
        assert!(f.sink.take().is_empty());
    }

    #[tokio::test]
    async fn unreachable_player_skips_tick() {
        let f = fixture();
        f.remote.reachable.store(false, Ordering::SeqCst);
        *f.remote.time.lock().unwrap() = Some(time("0:01"));
        f.scheduler.on_appear(Capability::TrackTime, "T".into()).await;

        f.scheduler.poll_once(Capability::TrackTime).await;
        assert_eq!(f.remote.checks.load(Ordering::SeqCst), 1);
        assert!(f.sink.take().is_empty());
    }

    #[tokio::test]
    async fn toggles_broadcast_every_tick() {
        let f = fixture();
        *f.remote.liked.lock().unwrap() = Some(true);
        f.scheduler.on_appear(Capability::Like, "A".into()).await;
        f.scheduler.on_appear(Capability::Like, "B".into()).await;
        f.sink.take();

        f.scheduler.poll_once(Capability::Like).await;
        f.scheduler.poll_once(Capability::Like).await;
        let sent = f.sink.take();
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0], OutboundMessage::set_state(&"A".into(), true));
        assert_eq!(sent[1], OutboundMessage::set_state(&"B".into(), true));
    }

    #[tokio::test]
    async fn toggle_appearance_polls_immediately() {
        let f = fixture();
        f.scheduler.on_appear(Capability::PlayPause, "P".into()).await;
        assert_eq!(
            f.sink.take(),
            vec![OutboundMessage::set_state(&"P".into(), true)]
        );
    }

    #[tokio::test]
    async fn unknown_toggle_state_sends_nothing() {
        let f = fixture();
        f.scheduler.on_appear(Capability::Like, "A".into()).await;
        assert!(f.sink.take().is_empty());
    }

    #[tokio::test]
    async fn unchanged_cover_is_downloaded_once() {
        let f = fixture();
        *f.remote.track.lock().unwrap() = Some(track("a"));
        f.scheduler.on_appear(Capability::Cover, "C".into()).await;

        for _ in 0..5 {
            f.scheduler.poll_once(Capability::Cover).await;
        }
        assert_eq!(f.covers.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.sink.take().len(), 1);

        *f.remote.track.lock().unwrap() = Some(track("b"));
        f.scheduler.poll_once(Capability::Cover).await;
        assert_eq!(f.covers.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            f.sink.take(),
            vec![OutboundMessage::set_image(
                &"C".into(),
                "data:image/jpeg;base64,https://img/b/400x400"
            )]
        );
    }

    #[tokio::test]
    async fn new_cover_button_forces_refresh() {
        let f = fixture();
        *f.remote.track.lock().unwrap() = Some(track("a"));
        f.scheduler.on_appear(Capability::Cover, "C1".into()).await;
        f.scheduler.poll_once(Capability::Cover).await;
        f.sink.take();

        f.scheduler.on_appear(Capability::Cover, "C2".into()).await;
        // The cached image is restored at once.
        assert_eq!(f.sink.take().len(), 1);

        f.scheduler.poll_once(Capability::Cover).await;
        assert_eq!(f.covers.calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.sink.take().len(), 2);
    }

    #[tokio::test]
    async fn known_cover_button_does_not_force_refresh() {
        let f = fixture();
        *f.remote.track.lock().unwrap() = Some(track("a"));
        f.scheduler.on_appear(Capability::Cover, "C".into()).await;
        f.scheduler.poll_once(Capability::Cover).await;

        f.scheduler.on_appear(Capability::Cover, "C".into()).await;
        f.scheduler.poll_once(Capability::Cover).await;
        assert_eq!(f.covers.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_download_retries_next_tick() {
        let f = fixture();
        *f.remote.track.lock().unwrap() = Some(track("a"));
        f.covers.fail.store(true, Ordering::SeqCst);
        f.scheduler.on_appear(Capability::Cover, "C".into()).await;

        f.scheduler.poll_once(Capability::Cover).await;
        assert!(f.sink.take().is_empty());

        f.covers.fail.store(false, Ordering::SeqCst);
        f.scheduler.poll_once(Capability::Cover).await;
        assert_eq!(f.covers.calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.sink.take().len(), 1);
    }

    #[tokio::test]
    async fn failed_track_query_clears_cover_cache() {
        let f = fixture();
        *f.remote.track.lock().unwrap() = Some(track("a"));
        f.scheduler.on_appear(Capability::Cover, "C".into()).await;
        f.scheduler.poll_once(Capability::Cover).await;

        *f.remote.track.lock().unwrap() = None;
        f.scheduler.poll_once(Capability::Cover).await;

        *f.remote.track.lock().unwrap() = Some(track("a"));
        f.scheduler.poll_once(Capability::Cover).await;
        assert_eq!(f.covers.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn time_is_pushed_only_on_change() {
        let f = fixture();
        *f.remote.time.lock().unwrap() = Some(time("0:01"));
        f.scheduler.on_appear(Capability::TrackTime, "T".into()).await;

        f.scheduler.poll_once(Capability::TrackTime).await;
        f.scheduler.poll_once(Capability::TrackTime).await;
        assert_eq!(
            f.sink.take(),
            vec![OutboundMessage::set_title(&"T".into(), "0:01\n3:45")]
        );

        // A failed read clears the cache, so the same text is pushed again.
        *f.remote.time.lock().unwrap() = None;
        f.scheduler.poll_once(Capability::TrackTime).await;
        *f.remote.time.lock().unwrap() = Some(time("0:01"));
        f.scheduler.poll_once(Capability::TrackTime).await;
        assert_eq!(f.sink.take().len(), 1);
    }

    #[tokio::test]
    async fn reappearing_buttons_are_restored() {
        let f = fixture();
        *f.remote.time.lock().unwrap() = Some(time("1:00"));
        *f.remote.track.lock().unwrap() = Some(track("Song"));
        f.scheduler.on_appear(Capability::TrackTime, "T".into()).await;
        f.scheduler.on_appear(Capability::TrackInfo, "I".into()).await;
        f.scheduler.poll_once(Capability::TrackTime).await;
        f.scheduler.poll_once(Capability::TrackInfo).await;
        f.sink.take();

        f.scheduler.on_disappear(Capability::TrackTime, &"T".into());
        f.scheduler.on_disappear(Capability::TrackInfo, &"I".into());
        f.scheduler.on_appear(Capability::TrackTime, "T".into()).await;
        f.scheduler.on_appear(Capability::TrackInfo, "I".into()).await;
        assert_eq!(
            f.sink.take(),
            vec![
                OutboundMessage::set_title(&"T".into(), "1:00\n3:45"),
                OutboundMessage::set_title(&"I".into(), "Song - Art"),
            ]
        );
    }

    #[tokio::test]
    async fn track_info_scrolls_or_shows_placeholder() {
        let f = fixture();
        f.scheduler.on_appear(Capability::TrackInfo, "I".into()).await;

        f.scheduler.poll_once(Capability::TrackInfo).await;
        assert_eq!(
            f.sink.take(),
            vec![OutboundMessage::set_title(&"I".into(), "No data")]
        );

        *f.remote.track.lock().unwrap() = Some(track("Song"));
        f.scheduler.poll_once(Capability::TrackInfo).await;
        f.scheduler.poll_once(Capability::TrackInfo).await;
        f.scheduler.poll_once(Capability::TrackInfo).await;
        let titles: Vec<_> = f
            .sink
            .take()
            .into_iter()
            .map(|m| match m {
                OutboundMessage::SetTitle { payload, .. } => payload.title,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(titles, ["Song - Art", "Song - Art", "ong - Arti"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pollers_tick_until_stopped() {
        let f = fixture();
        *f.remote.time.lock().unwrap() = Some(time("0:01"));
        f.scheduler.on_appear(Capability::TrackTime, "T".into()).await;

        f.scheduler.start();
        assert!(f.scheduler.is_running());
        tokio::time::sleep(Duration::from_millis(1250)).await;
        // Ticks at 0, 500 and 1000 ms.
        assert_eq!(f.remote.checks.load(Ordering::SeqCst), 3);

        f.scheduler.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(f.remote.checks.load(Ordering::SeqCst), 4);

        f.scheduler.stop();
        assert!(!f.scheduler.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(f.remote.checks.load(Ordering::SeqCst), 4);
    }
}
