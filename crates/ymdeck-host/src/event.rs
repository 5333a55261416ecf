//! Inbound host events and inspector commands.
//!
//! Both are decoded with serde: [`HostEvent`] is tagged by `event`, and the
//! `sendToPlugin` payload decodes into a [`PluginCommand`] tagged by
//! `command`. Unknown tags decode to a catch-all variant instead of failing.

use serde::Deserialize;
use serde_json::Value;
use ymdeck_types::{validate_port, BridgeError, ContextId, PlayerCommand};

use crate::error::HostError;

/// An event delivered by the plugin host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum HostEvent {
    WillAppear(ActionEvent),
    WillDisappear(ActionEvent),
    KeyDown(ActionEvent),
    KeyUp(ActionEvent),
    SendToPlugin(ActionEvent),
    DidReceiveSettings(ActionEvent),
    PropertyInspectorDidAppear(ActionEvent),
    DidReceiveGlobalSettings(GlobalSettingsEvent),
    #[serde(other)]
    Other,
}

impl HostEvent {
    /// Decode one WebSocket text frame.
    pub fn decode(text: &str) -> Result<Self, HostError> {
        serde_json::from_str(text).map_err(|e| HostError::MalformedMessage {
            detail: e.to_string(),
        })
    }

    /// Event name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::WillAppear(_) => "willAppear",
            HostEvent::WillDisappear(_) => "willDisappear",
            HostEvent::KeyDown(_) => "keyDown",
            HostEvent::KeyUp(_) => "keyUp",
            HostEvent::SendToPlugin(_) => "sendToPlugin",
            HostEvent::DidReceiveSettings(_) => "didReceiveSettings",
            HostEvent::PropertyInspectorDidAppear(_) => "propertyInspectorDidAppear",
            HostEvent::DidReceiveGlobalSettings(_) => "didReceiveGlobalSettings",
            HostEvent::Other => "other",
        }
    }
}

/// An event addressed to one button instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionEvent {
    /// Full action UUID, e.g. `com.example.yandexmusic.ym-like`.
    #[serde(default)]
    pub action: String,
    pub context: ContextId,
    #[serde(default)]
    pub payload: Value,
}

impl ActionEvent {
    /// Decode the payload as an inspector command.
    pub fn command(&self) -> Option<PluginCommand> {
        if self.payload.get("command").is_none() {
            return None;
        }
        match serde_json::from_value(self.payload.clone()) {
            Ok(command) => Some(command),
            Err(e) => {
                tracing::warn!(error = %e, "malformed inspector command");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobalSettingsEvent {
    pub payload: GlobalSettingsPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobalSettingsPayload {
    pub settings: GlobalSettings,
}

/// Settings persisted by the host for the whole plugin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    /// Raw value; the inspector may store it as a number or a string.
    pub debug_port: Option<Value>,
}

impl GlobalSettings {
    /// The stored debug port, if present and valid.
    pub fn debug_port(&self) -> Option<Result<u16, BridgeError>> {
        self.debug_port.as_ref().map(port_from_value)
    }
}

/// A command sent from the property inspector through `sendToPlugin`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PluginCommand {
    CheckConnection,
    TogglePlayback,
    PreviousTrack,
    NextTrack,
    LikeTrack,
    DislikeTrack,
    ToggleMute,
    /// `port` is kept raw; see [`port_from_value`].
    ChangePort { port: Value },
    #[serde(other)]
    Unknown,
}

impl PluginCommand {
    /// The player mutation this command maps to, if any.
    pub fn player_command(&self) -> Option<PlayerCommand> {
        match self {
            PluginCommand::TogglePlayback => Some(PlayerCommand::TogglePlayback),
            PluginCommand::PreviousTrack => Some(PlayerCommand::PreviousTrack),
            PluginCommand::NextTrack => Some(PlayerCommand::NextTrack),
            PluginCommand::LikeTrack => Some(PlayerCommand::LikeTrack),
            PluginCommand::DislikeTrack => Some(PlayerCommand::DislikeTrack),
            PluginCommand::ToggleMute => Some(PlayerCommand::ToggleMute),
            PluginCommand::CheckConnection
            | PluginCommand::ChangePort { .. }
            | PluginCommand::Unknown => None,
        }
    }
}

/// Accept a port given as a JSON number or a numeric string.
pub fn port_from_value(value: &Value) -> Result<u16, BridgeError> {
    let number = match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| BridgeError::InvalidPort(format!("{n} is not an integer")))?,
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| BridgeError::InvalidPort(format!("{s:?} is not a number")))?,
        other => {
            return Err(BridgeError::InvalidPort(format!(
                "unsupported port value {other}"
            )))
        }
    };
    validate_port(number)
}
