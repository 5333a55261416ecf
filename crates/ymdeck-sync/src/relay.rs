//! Dispatch of host events to the registry, the player, and the inspector.

use std::sync::Arc;

use serde_json::json;
use ymdeck_host::{
    lookup, port_from_value, ActionEvent, GlobalSettings, HostEvent, HostEvents, HostSink,
    PluginCommand,
};
use ymdeck_player::MediaRemote;
use ymdeck_types::{ContextId, PlayerCommand};

use crate::demo::DemoTimers;
use crate::scheduler::Scheduler;

/// Connects host events to the rest of the plugin.
///
/// Cloning yields another handle to the same relay.
#[derive(Clone)]
pub struct Relay {
    remote: Arc<dyn MediaRemote>,
    sink: Arc<dyn HostSink>,
    scheduler: Scheduler,
    demos: Arc<DemoTimers>,
}

impl Relay {
    pub fn new(remote: Arc<dyn MediaRemote>, sink: Arc<dyn HostSink>, scheduler: Scheduler) -> Self {
        Self {
            remote,
            sink,
            scheduler,
            demos: Arc::new(DemoTimers::new()),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Start polling and handle events until the host closes the socket.
    ///
    /// Each event is handled on its own task so that slow player calls do
    /// not hold up the socket. Registry changes happen before a handler's
    /// first await, so lifecycle events still apply in arrival order.
    pub async fn run(&self, mut events: HostEvents) {
        self.scheduler.start();
        while let Some(event) = events.next_event().await {
            let relay = self.clone();
            tokio::spawn(async move { relay.handle(event).await });
        }
        self.shutdown();
    }

    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.demos.stop_all();
    }

    /// Handle one event to completion.
    pub async fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::WillAppear(e) => self.will_appear(e).await,
            HostEvent::WillDisappear(e) => self.will_disappear(&e),
            HostEvent::KeyUp(e) => self.key_up(e).await,
            HostEvent::SendToPlugin(e) => self.send_to_plugin(e).await,
            HostEvent::DidReceiveGlobalSettings(e) => {
                self.apply_global_settings(&e.payload.settings).await
            }
            HostEvent::KeyDown(e)
            | HostEvent::DidReceiveSettings(e)
            | HostEvent::PropertyInspectorDidAppear(e) => {
                tracing::trace!(action = %e.action, context = %e.context, "event ignored");
            }
            HostEvent::Other => {}
        }
    }

    async fn will_appear(&self, event: ActionEvent) {
        let Some(entry) = lookup(&event.action) else {
            tracing::debug!(action = %event.action, "unknown action appeared");
            return;
        };
        tracing::info!(action = entry.suffix, context = %event.context, "button appeared");

        if entry.demo {
            self.demos.start(self.sink.clone(), event.context.clone());
        }
        if let Some(capability) = entry.capability {
            self.scheduler
                .on_appear(capability, event.context.clone())
                .await;
        }
        if entry.key_command.is_some() && !self.remote.check_connection().await {
            tracing::warn!(
                action = entry.suffix,
                port = self.remote.port(),
                "player unreachable on button appearance"
            );
            if !entry.demo {
                self.sink.show_alert(&event.context);
            }
        }
    }

    fn will_disappear(&self, event: &ActionEvent) {
        let Some(entry) = lookup(&event.action) else {
            return;
        };
        if entry.demo {
            self.demos.stop(&event.context);
        }
        if let Some(capability) = entry.capability {
            self.scheduler.on_disappear(capability, &event.context);
        }
    }

    async fn key_up(&self, event: ActionEvent) {
        let Some(command) = lookup(&event.action).and_then(|entry| entry.key_command) else {
            tracing::debug!(action = %event.action, "key has no command");
            return;
        };
        self.run_command(&event.context, command).await;
    }

    /// Check the connection, run `command`, and alert on `context` on failure.
    pub async fn run_command(&self, context: &ContextId, command: PlayerCommand) -> bool {
        if !self.remote.check_connection().await {
            tracing::warn!(command = %command, port = self.remote.port(), "player unreachable");
            self.sink.show_alert(context);
            return false;
        }
        let ok = self.remote.execute(command).await;
        tracing::info!(command = %command, ok, "command executed");
        if !ok {
            self.sink.show_alert(context);
        }
        ok
    }

    async fn send_to_plugin(&self, event: ActionEvent) {
        let Some(command) = event.command() else {
            return;
        };
        tracing::debug!(?command, context = %event.context, "inspector command");

        match &command {
            PluginCommand::TogglePlayback
            | PluginCommand::PreviousTrack
            | PluginCommand::NextTrack
            | PluginCommand::LikeTrack
            | PluginCommand::DislikeTrack
            | PluginCommand::ToggleMute => {
                if let Some(player_command) = command.player_command() {
                    self.run_command(&event.context, player_command).await;
                }
            }
            PluginCommand::CheckConnection => {
                let connected = self.remote.check_connection().await;
                let status = if connected { "connected" } else { "disconnected" };
                tracing::info!(status, "connection status requested");
                self.sink.send_to_property_inspector(
                    &event.action,
                    &event.context,
                    json!({ "command": "connectionStatus", "status": status }),
                );
            }
            PluginCommand::ChangePort { port } => {
                let port = match port_from_value(port) {
                    Ok(port) => port,
                    Err(e) => {
                        tracing::warn!(error = %e, "rejected port change");
                        self.sink.show_alert(&event.context);
                        return;
                    }
                };
                let connected = self.switch_port(port).await;
                self.sink.set_global_settings(json!({ "debugPort": port }));
                self.sink.send_to_property_inspector(
                    &event.action,
                    &event.context,
                    json!({ "command": "portChanged", "port": port, "connected": connected }),
                );
            }
            PluginCommand::Unknown => {
                tracing::debug!(payload = %event.payload, "unknown inspector command");
            }
        }
    }

    /// Point the player at `port` and report whether it is reachable there.
    async fn switch_port(&self, port: u16) -> bool {
        if port == self.remote.port() {
            return self.remote.check_connection().await;
        }
        tracing::info!(from = self.remote.port(), to = port, "changing debug port");
        self.remote.set_port(port).await
    }

    async fn apply_global_settings(&self, settings: &GlobalSettings) {
        match settings.debug_port() {
            None => {}
            Some(Err(e)) => tracing::warn!(error = %e, "ignoring stored debug port"),
            Some(Ok(port)) if port == self.remote.port() => {}
            Some(Ok(port)) => {
                tracing::info!(port, "applying stored debug port");
                let connected = self.remote.set_port(port).await;
                tracing::info!(port, connected, "stored debug port applied");
            }
        }
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("scheduler", &self.scheduler)
            .field("demos", &self.demos.len())
            .finish()
    }
}
