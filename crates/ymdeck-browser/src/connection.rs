//! The single shared connection to the player's debugging port.
//!
//! [`ConnectionManager`] is a cloneable handle. Every clone sees the same
//! state: at most one live session, at most one in-flight connect attempt
//! (concurrent callers await the same shared future), and at most one
//! outstanding reconnect chain.
//!
//! Lifecycle:
//! - `connect` / `get_client` open a session lazily on first use.
//! - When the transport reports a disconnect, the session is dropped and up
//!   to `max_attempts` reconnects are scheduled with linearly growing delay.
//! - `disconnect` and `set_port` cancel the reconnect chain and invalidate
//!   any attempt still in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::task::JoinHandle;
use ymdeck_types::ReconnectConfig;

use crate::error::BrowserError;
use crate::session::{Connector, RemoteSession};

type SessionResult = Result<Arc<dyn RemoteSession>, BrowserError>;
type PendingConnect = Shared<BoxFuture<'static, SessionResult>>;

/// Observable state of the shared connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Inner {
    host: String,
    port: u16,
    state: ConnectionState,
    session: Option<Arc<dyn RemoteSession>>,
    pending: Option<PendingConnect>,
    reconnect_attempts: u32,
    /// Bumped by `disconnect`; work started under an older value is stale.
    generation: u64,
    reconnect_task: Option<JoinHandle<()>>,
    watcher_task: Option<JoinHandle<()>>,
}

/// Owns the connection to the player and recovers it after drops.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Mutex<Inner>>,
    connector: Arc<dyn Connector>,
    reconnect: ReconnectConfig,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        host: impl Into<String>,
        port: u16,
        reconnect: ReconnectConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                host: host.into(),
                port,
                state: ConnectionState::Disconnected,
                session: None,
                pending: None,
                reconnect_attempts: 0,
                generation: 0,
                reconnect_task: None,
                watcher_task: None,
            })),
            connector,
            reconnect,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Port the manager connects to.
    pub fn port(&self) -> u16 {
        self.lock().port
    }

    /// Reconnect attempts made since the last successful connect.
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock().reconnect_attempts
    }

    /// Return the live session, or open one.
    ///
    /// While an attempt is in flight every caller awaits that same attempt.
    pub async fn connect(&self) -> SessionResult {
        let pending = {
            let mut inner = self.lock();
            if let Some(session) = &inner.session {
                return Ok(Arc::clone(session));
            }
            match &inner.pending {
                Some(pending) => pending.clone(),
                None => {
                    let attempt = self
                        .clone()
                        .attempt(inner.host.clone(), inner.port, inner.generation)
                        .boxed()
                        .shared();
                    inner.pending = Some(attempt.clone());
                    inner.state = ConnectionState::Connecting;
                    attempt
                }
            }
        };
        pending.await
    }

    /// Like [`connect`](Self::connect), but failures are logged and become
    /// `None`.
    pub async fn get_client(&self) -> Option<Arc<dyn RemoteSession>> {
        match self.connect().await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(error = %e, "no usable player connection");
                None
            }
        }
    }

    /// Whether a usable session exists or can be opened now.
    pub async fn check_connection(&self) -> bool {
        self.get_client().await.is_some()
    }

    /// Close the session and cancel reconnects and in-flight attempts.
    pub async fn disconnect(&self) {
        let session = Self::reset(&mut self.lock());
        Self::close_session(session).await;
    }

    /// Switch to a different debug port.
    ///
    /// Returns `false` without side effects when the port is unchanged.
    /// Otherwise reconnects on the new port and returns whether that worked.
    pub async fn set_port(&self, port: u16) -> bool {
        // Port and generation change together: no attempt may start on the
        // old port once the switch begins.
        let session = {
            let mut inner = self.lock();
            let old = inner.port;
            if old == port {
                tracing::info!(port, "debug port unchanged");
                return false;
            }
            tracing::info!(old, new = port, "changing debug port");
            inner.port = port;
            inner.reconnect_attempts = 0;
            Self::reset(&mut inner)
        };
        Self::close_session(session).await;

        match self.connect().await {
            Ok(_) => {
                tracing::info!(port, "connected on new debug port");
                true
            }
            Err(e) => {
                tracing::error!(port, error = %e, "failed to connect on new debug port");
                false
            }
        }
    }

    /// Invalidate in-flight work and take the live session.
    fn reset(inner: &mut Inner) -> Option<Arc<dyn RemoteSession>> {
        inner.generation += 1;
        if let Some(task) = inner.reconnect_task.take() {
            task.abort();
        }
        if let Some(task) = inner.watcher_task.take() {
            task.abort();
        }
        inner.pending = None;
        inner.state = ConnectionState::Disconnected;
        inner.session.take()
    }

    async fn close_session(session: Option<Arc<dyn RemoteSession>>) {
        if let Some(session) = session {
            session.close().await;
            tracing::info!("player connection closed");
        }
    }

    /// One connect attempt. Publishes its outcome unless superseded.
    async fn attempt(self, host: String, port: u16, generation: u64) -> SessionResult {
        tracing::info!(port, "opening player connection");
        let result = self.connector.connect(&host, port).await;

        let mut inner = self.lock();
        if inner.generation != generation {
            drop(inner);
            if let Ok(session) = result {
                tokio::spawn(async move { session.close().await });
            }
            return Err(BrowserError::Protocol {
                detail: "connection attempt superseded".to_string(),
            });
        }
        inner.pending = None;

        match result {
            Ok(session) => {
                inner.session = Some(Arc::clone(&session));
                inner.state = ConnectionState::Connected;
                inner.reconnect_attempts = 0;
                if let Some(task) = inner.reconnect_task.take() {
                    task.abort();
                }
                if let Some(task) = inner.watcher_task.take() {
                    task.abort();
                }
                inner.watcher_task = Some(self.spawn_watcher(Arc::clone(&session), generation));
                tracing::info!(port, "player connection established");
                Ok(session)
            }
            Err(e) => {
                inner.state = ConnectionState::Disconnected;
                if e.is_connection_refused() {
                    tracing::error!(
                        port,
                        "connection refused; start the player with --remote-debugging-port={port}"
                    );
                } else {
                    tracing::error!(port, error = %e, "failed to connect to player");
                }
                Err(e)
            }
        }
    }

    fn spawn_watcher(&self, session: Arc<dyn RemoteSession>, generation: u64) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            session.closed().await;
            manager.handle_disconnect(&session, generation);
        })
    }

    fn handle_disconnect(&self, session: &Arc<dyn RemoteSession>, generation: u64) {
        let mut inner = self.lock();
        let current = inner
            .session
            .as_ref()
            .is_some_and(|live| Arc::ptr_eq(live, session));
        if inner.generation != generation || !current {
            return;
        }

        tracing::warn!(port = inner.port, "player connection lost");
        inner.session = None;
        inner.state = ConnectionState::Disconnected;
        // The watcher is the running task; drop its handle without aborting.
        inner.watcher_task = None;
        self.schedule_reconnect(&mut inner);
    }

    fn schedule_reconnect(&self, inner: &mut Inner) {
        if inner.reconnect_attempts >= self.reconnect.max_attempts {
            tracing::warn!(
                attempts = inner.reconnect_attempts,
                "giving up on reconnect until the connection is next needed"
            );
            return;
        }

        inner.reconnect_attempts += 1;
        let attempt = inner.reconnect_attempts;
        let delay = self.reconnect.delay_for(attempt);
        let generation = inner.generation;
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");

        if let Some(task) = inner.reconnect_task.take() {
            task.abort();
        }
        let manager = self.clone();
        inner.reconnect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.run_reconnect(generation, attempt).await;
        }));
    }

    async fn run_reconnect(&self, generation: u64, attempt: u32) {
        {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            // This task is running; forget its handle so nothing aborts it.
            inner.reconnect_task = None;
        }

        tracing::info!(attempt, "reconnecting to player");
        if self.connect().await.is_ok() {
            tracing::info!(attempt, "reconnected to player");
            return;
        }

        let mut inner = self.lock();
        if inner.generation == generation && inner.session.is_none() {
            self.schedule_reconnect(&mut inner);
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConnectionManager")
            .field("host", &inner.host)
            .field("port", &inner.port)
            .field("state", &inner.state)
            .field("reconnect_attempts", &inner.reconnect_attempts)
            .finish()
    }
}
