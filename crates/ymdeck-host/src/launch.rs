//! Launch arguments passed by the plugin host.
//!
//! The host starts the plugin as
//! `ymdeck -port 28196 -pluginUUID <uuid> -registerEvent registerPlugin -info '{...}'`.
//! Its flags use a single dash, so they are rewritten to `--` before the
//! CLI parser sees them.

use serde::Deserialize;

use crate::error::HostError;

/// Flags the host passes with a single dash.
const HOST_FLAGS: &[&str] = &["port", "pluginUUID", "registerEvent", "info"];

/// Rewrite `-port` style host flags to `--port`. Everything else is kept.
pub fn normalize_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.strip_prefix('-') {
            Some(name) if !name.starts_with('-') && HOST_FLAGS.contains(&name) => {
                format!("--{name}")
            }
            _ => arg,
        })
        .collect()
}

/// Everything needed to register with the host.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchInfo {
    pub port: u16,
    pub plugin_uuid: String,
    pub register_event: String,
    pub info: HostInfo,
}

impl LaunchInfo {
    pub fn new(
        port: u16,
        plugin_uuid: String,
        register_event: String,
        info: Option<&str>,
    ) -> Result<Self, HostError> {
        if plugin_uuid.trim().is_empty() {
            return Err(HostError::InvalidArgs("pluginUUID is empty".into()));
        }
        if register_event.trim().is_empty() {
            return Err(HostError::InvalidArgs("registerEvent is empty".into()));
        }
        let info = match info {
            Some(raw) => HostInfo::parse(raw)?,
            None => HostInfo::default(),
        };
        Ok(Self {
            port,
            plugin_uuid,
            register_event,
            info,
        })
    }

    /// Address of the host's WebSocket.
    pub fn host_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }
}

/// The `-info` JSON document. Only the fields the plugin logs are kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    pub application: ApplicationInfo,
    pub plugin: PluginInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApplicationInfo {
    pub language: Option<String>,
    pub platform: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    pub uuid: Option<String>,
    pub version: Option<String>,
}

impl HostInfo {
    pub fn parse(raw: &str) -> Result<Self, HostError> {
        serde_json::from_str(raw).map_err(|e| {
            HostError::InvalidArgs(format!("-info is not valid JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_dash_host_flags_are_normalized() {
        let args = normalize_args([
            "ymdeck",
            "-port",
            "28196",
            "-pluginUUID",
            "com.example.ym",
            "-registerEvent",
            "registerPlugin",
            "-info",
            "{}",
        ]);
        assert_eq!(
            args,
            vec![
                "ymdeck",
                "--port",
                "28196",
                "--pluginUUID",
                "com.example.ym",
                "--registerEvent",
                "registerPlugin",
                "--info",
                "{}",
            ]
        );
    }

    #[test]
    fn other_args_are_untouched() {
        let args = normalize_args(["ymdeck", "check", "--debug-port", "9333", "-v", "-5"]);
        assert_eq!(args, vec!["ymdeck", "check", "--debug-port", "9333", "-v", "-5"]);
    }

    #[test]
    fn info_json_is_decoded() {
        let info = HostInfo::parse(
            r#"{"application":{"language":"ru","platform":"windows","version":"3.10"},
                "plugin":{"uuid":"com.example.ym","version":"1.0.0"},
                "devices":[]}"#,
        )
        .unwrap();
        assert_eq!(info.application.language.as_deref(), Some("ru"));
        assert_eq!(info.plugin.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn launch_info_validates() {
        let launch = LaunchInfo::new(28196, "uuid".into(), "registerPlugin".into(), None).unwrap();
        assert_eq!(launch.host_url(), "ws://127.0.0.1:28196");
        assert!(LaunchInfo::new(1, "".into(), "registerPlugin".into(), None).is_err());
        assert!(LaunchInfo::new(1, "uuid".into(), "registerPlugin".into(), Some("{")).is_err());
    }
}
