//! Layered configuration loading with sources merged in priority order.
//!
//! The priority chain (later overrides earlier):
//! 1. Built-in defaults ([`BridgeConfig::default()`])
//! 2. User-level: `~/.ymdeck/config.toml`
//! 3. Plugin-level: `./ymdeck.toml` (next to the plugin executable's cwd)
//! 4. `YMDECK_*` environment variables
//!
//! Each top-level and nested key in the final [`EffectiveConfig`] is
//! annotated with the [`ConfigSource`] that determined its value.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{BridgeConfig, CONFIG_FILENAME};
use crate::BridgeError;

/// Maximum config file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Where a configuration value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    BuiltinDefault,
    UserFile(PathBuf),
    PluginFile(PathBuf),
    EnvVar(String),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::BuiltinDefault => write!(f, "built-in default"),
            ConfigSource::UserFile(p) => write!(f, "user file: {}", p.display()),
            ConfigSource::PluginFile(p) => write!(f, "plugin file: {}", p.display()),
            ConfigSource::EnvVar(name) => write!(f, "env var: {name}"),
        }
    }
}

/// The merged config plus provenance for each field.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub config: BridgeConfig,
    /// Dot-separated field path -> the source that determined its value.
    pub sources: HashMap<String, ConfigSource>,
    /// Config files that were found and loaded, in priority order.
    pub source_files: Vec<PathBuf>,
}

impl EffectiveConfig {
    /// Keys set by a file or env var rather than by defaults, sorted by path.
    pub fn overrides(&self) -> Vec<(&str, &ConfigSource)> {
        let mut keys: Vec<_> = self
            .sources
            .iter()
            .filter(|(_, source)| **source != ConfigSource::BuiltinDefault)
            .map(|(key, source)| (key.as_str(), source))
            .collect();
        keys.sort_by(|a, b| a.0.cmp(b.0));
        keys
    }
}

/// Layered configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Override for the user config path (for testing).
    user_config_path: Option<PathBuf>,
    /// Override for the plugin config path (for testing).
    plugin_config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the user config file path.
    #[must_use]
    pub fn with_user_path(mut self, path: PathBuf) -> Self {
        self.user_config_path = Some(path);
        self
    }

    /// Override the plugin config file path.
    #[must_use]
    pub fn with_plugin_path(mut self, path: PathBuf) -> Self {
        self.plugin_config_path = Some(path);
        self
    }

    /// Load and merge configuration from all sources.
    pub fn load(&self) -> Result<EffectiveConfig, BridgeError> {
        let mut sources = HashMap::new();
        let mut source_files = Vec::new();

        let mut merged = toml::Value::try_from(BridgeConfig::default())
            .map_err(|e| BridgeError::Config(format!("failed to serialize defaults: {e}")))?;
        if let toml::Value::Table(ref table) = merged {
            for key in table.keys() {
                sources.insert(key.clone(), ConfigSource::BuiltinDefault);
            }
        }

        let user_path = self.user_config_path.clone().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".ymdeck").join("config.toml")
        });
        if user_path.exists() {
            let layer = read_layer(&user_path, "user")?;
            deep_merge(&mut merged, &layer);
            record_sources(&layer, &mut sources, &ConfigSource::UserFile(user_path.clone()), "");
            source_files.push(user_path);
        }

        let plugin_path = self
            .plugin_config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
        if plugin_path.exists() {
            let layer = read_layer(&plugin_path, "plugin")?;
            deep_merge(&mut merged, &layer);
            record_sources(
                &layer,
                &mut sources,
                &ConfigSource::PluginFile(plugin_path.clone()),
                "",
            );
            source_files.push(plugin_path);
        }

        apply_env_overrides(&mut merged, &mut sources)?;

        let config: BridgeConfig = merged
            .try_into()
            .map_err(|e| BridgeError::Config(format!("failed to parse merged config: {e}")))?;
        config.validate()?;

        Ok(EffectiveConfig {
            config,
            sources,
            source_files,
        })
    }
}

/// Read and parse one config file with a size limit and null-byte check.
fn read_layer(path: &Path, label: &str) -> Result<toml::Value, BridgeError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        BridgeError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(BridgeError::Config(format!(
            "config file {} exceeds maximum size of {MAX_CONFIG_FILE_SIZE} bytes",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        BridgeError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;
    if content.contains('\0') {
        return Err(BridgeError::Config(format!(
            "config file {} contains null bytes",
            path.display()
        )));
    }

    toml::from_str(&content)
        .map_err(|e| BridgeError::Config(format!("invalid {label} config: {e}")))
}

/// Deep-merge `overlay` into `base`. Tables merge field-by-field; arrays and
/// scalars replace.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Record which source contributed each key, nested keys as dot paths.
fn record_sources(
    layer: &toml::Value,
    sources: &mut HashMap<String, ConfigSource>,
    source: &ConfigSource,
    prefix: &str,
) {
    if let toml::Value::Table(table) = layer {
        for (key, value) in table {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            sources.insert(path.clone(), source.clone());
            record_sources(value, sources, source, &path);
        }
    }
}

/// Known environment variable mappings.
pub struct EnvMapping {
    pub env_var: &'static str,
    /// Dot-separated TOML path segments.
    pub toml_path: &'static [&'static str],
    pub numeric: bool,
}

/// All supported `YMDECK_*` environment variables. Double underscore means
/// nesting.
pub const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        env_var: "YMDECK_DEBUG_HOST",
        toml_path: &["debug_host"],
        numeric: false,
    },
    EnvMapping {
        env_var: "YMDECK_DEBUG_PORT",
        toml_path: &["debug_port"],
        numeric: true,
    },
    EnvMapping {
        env_var: "YMDECK_LOG_DIR",
        toml_path: &["log_dir"],
        numeric: false,
    },
    EnvMapping {
        env_var: "YMDECK_RECONNECT__MAX_ATTEMPTS",
        toml_path: &["reconnect", "max_attempts"],
        numeric: true,
    },
    EnvMapping {
        env_var: "YMDECK_RECONNECT__BASE_DELAY_MS",
        toml_path: &["reconnect", "base_delay_ms"],
        numeric: true,
    },
];

fn apply_env_overrides(
    merged: &mut toml::Value,
    sources: &mut HashMap<String, ConfigSource>,
) -> Result<(), BridgeError> {
    for mapping in ENV_MAPPINGS {
        let Ok(raw) = std::env::var(mapping.env_var) else {
            continue;
        };
        if raw.chars().any(|c| c.is_control()) {
            return Err(BridgeError::Config(format!(
                "environment variable {} contains control characters",
                mapping.env_var
            )));
        }

        let value = if mapping.numeric {
            let num: i64 = raw.trim().parse().map_err(|e| {
                BridgeError::Config(format!(
                    "environment variable {} must be numeric: {e}",
                    mapping.env_var
                ))
            })?;
            toml::Value::Integer(num)
        } else {
            toml::Value::String(raw)
        };

        set_nested_value(merged, mapping.toml_path, value);
        sources.insert(
            mapping.toml_path.join("."),
            ConfigSource::EnvVar(mapping.env_var.to_string()),
        );
    }
    Ok(())
}

/// Set a value at a nested path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, path: &[&str], value: toml::Value) {
    let Some((first, rest)) = path.split_first() else {
        return;
    };
    let toml::Value::Table(table) = root else {
        return;
    };
    if rest.is_empty() {
        table.insert((*first).to_string(), value);
        return;
    }
    let entry = table
        .entry((*first).to_string())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    set_nested_value(entry, rest, value);
}
