//! Messages the plugin sends to the host.

use serde::Serialize;
use serde_json::Value;
use ymdeck_types::ContextId;

use crate::error::HostError;

/// `target` value addressing both the hardware and the software display.
const TARGET_BOTH: u8 = 0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePayload {
    pub target: u8,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePayload {
    pub target: u8,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatePayload {
    pub state: u8,
}

/// One outbound frame, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundMessage {
    SetTitle {
        context: ContextId,
        payload: TitlePayload,
    },
    SetImage {
        context: ContextId,
        payload: ImagePayload,
    },
    SetState {
        context: ContextId,
        payload: StatePayload,
    },
    ShowAlert {
        context: ContextId,
    },
    SendToPropertyInspector {
        action: String,
        context: ContextId,
        payload: Value,
    },
    /// `context` is the plugin UUID.
    SetGlobalSettings {
        context: String,
        payload: Value,
    },
    GetGlobalSettings {
        context: String,
    },
}

impl OutboundMessage {
    pub fn set_title(context: &ContextId, title: impl Into<String>) -> Self {
        OutboundMessage::SetTitle {
            context: context.clone(),
            payload: TitlePayload {
                target: TARGET_BOTH,
                title: title.into(),
            },
        }
    }

    pub fn set_image(context: &ContextId, image: impl Into<String>) -> Self {
        OutboundMessage::SetImage {
            context: context.clone(),
            payload: ImagePayload {
                target: TARGET_BOTH,
                image: image.into(),
            },
        }
    }

    /// `on` selects state 1 of a two-state action.
    pub fn set_state(context: &ContextId, on: bool) -> Self {
        OutboundMessage::SetState {
            context: context.clone(),
            payload: StatePayload { state: u8::from(on) },
        }
    }

    pub fn show_alert(context: &ContextId) -> Self {
        OutboundMessage::ShowAlert {
            context: context.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, HostError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Event name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundMessage::SetTitle { .. } => "setTitle",
            OutboundMessage::SetImage { .. } => "setImage",
            OutboundMessage::SetState { .. } => "setState",
            OutboundMessage::ShowAlert { .. } => "showAlert",
            OutboundMessage::SendToPropertyInspector { .. } => "sendToPropertyInspector",
            OutboundMessage::SetGlobalSettings { .. } => "setGlobalSettings",
            OutboundMessage::GetGlobalSettings { .. } => "getGlobalSettings",
        }
    }
}

/// The registration frame; its event name comes from the launch arguments.
pub fn register_message(register_event: &str, plugin_uuid: &str) -> String {
    serde_json::json!({ "event": register_event, "uuid": plugin_uuid }).to_string()
}

/// Where outbound messages go.
///
/// Sending never blocks and never fails: once the host has gone away the
/// process is shutting down and messages are dropped.
pub trait HostSink: Send + Sync {
    fn send(&self, message: OutboundMessage);

    /// UUID of this plugin instance, used as the global-settings context.
    fn plugin_uuid(&self) -> &str;

    fn set_title(&self, context: &ContextId, title: &str) {
        self.send(OutboundMessage::set_title(context, title));
    }

    fn set_image(&self, context: &ContextId, image: &str) {
        self.send(OutboundMessage::set_image(context, image));
    }

    fn set_state(&self, context: &ContextId, on: bool) {
        self.send(OutboundMessage::set_state(context, on));
    }

    fn show_alert(&self, context: &ContextId) {
        self.send(OutboundMessage::show_alert(context));
    }

    fn send_to_property_inspector(&self, action: &str, context: &ContextId, payload: Value) {
        self.send(OutboundMessage::SendToPropertyInspector {
            action: action.to_string(),
            context: context.clone(),
            payload,
        });
    }

    fn set_global_settings(&self, settings: Value) {
        self.send(OutboundMessage::SetGlobalSettings {
            context: self.plugin_uuid().to_string(),
            payload: settings,
        });
    }

    fn get_global_settings(&self) {
        self.send(OutboundMessage::GetGlobalSettings {
            context: self.plugin_uuid().to_string(),
        });
    }
}
