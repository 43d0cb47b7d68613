//! Load-time settings read from the process environment.

use renderstream_core::logging::DEFAULT_FILTER;

/// `tracing` filter directive, e.g. `debug` or `native_rendering_plugin=trace`.
pub const LOG_FILTER_VAR: &str = "RENDERSTREAM_NATIVE_LOG";

/// Default for the `srgb` flag of `CreateNativeTexture`.
pub const SRGB_VAR: &str = "RENDERSTREAM_NATIVE_SRGB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub log_filter: String,
    /// Used when the caller does not say whether it wants sRGB storage.
    pub default_srgb: bool,
    /// Variables that were set but could not be parsed.
    pub rejected: Vec<&'static str>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_FILTER.to_owned(),
            default_srgb: false,
            rejected: Vec::new(),
        }
    }
}

impl PluginConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unset, empty and unparsable
    /// values keep their defaults; the latter two are listed in `rejected`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_FILTER_VAR) {
            let filter = filter.trim();
            if filter.is_empty() {
                config.rejected.push(LOG_FILTER_VAR);
            } else {
                config.log_filter = filter.to_owned();
            }
        }
        if let Some(flag) = lookup(SRGB_VAR) {
            match parse_flag(&flag) {
                Some(srgb) => config.default_srgb = srgb,
                None => config.rejected.push(SRGB_VAR),
            }
        }
        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
