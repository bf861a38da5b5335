//! Engine configuration and its process-wide default.

use once_cell::sync::OnceCell;

/// Environment variable read when no process-wide configuration was installed.
pub const SORT_SUM_GRADIENT_ENV: &str = "FLAGS_sort_sum_gradient";

static GLOBAL_CONFIG: OnceCell<EngineConfig> = OnceCell::new();

/// Options of the gradient engine that are not specific to one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Visit ready records by descending sequence number and sum each node's
    /// gradient contributions in a canonical order, so that results do not
    /// depend on discovery order. When false, records are visited in discovery
    /// order and contributions are summed as they arrive.
    pub sort_sum_gradient: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort_sum_gradient(mut self, sort_sum_gradient: bool) -> Self {
        self.sort_sum_gradient = sort_sum_gradient;
        self
    }

    /// The process-wide default: the value passed to `init_global`, or else
    /// the environment, read once.
    pub fn global() -> EngineConfig {
        *GLOBAL_CONFIG.get_or_init(EngineConfig::from_env)
    }

    /// Reads `FLAGS_sort_sum_gradient`. Unset or unparsable values give the default.
    pub fn from_env() -> EngineConfig {
        let sort_sum_gradient = match std::env::var(SORT_SUM_GRADIENT_ENV) {
            Ok(value) => parse_flag(&value).unwrap_or_else(|| {
                log::warn!(
                    "ignoring {}={:?}: expected a boolean",
                    SORT_SUM_GRADIENT_ENV,
                    value
                );
                false
            }),
            Err(_) => false,
        };
        EngineConfig { sort_sum_gradient }
    }
}

/// Installs the process-wide default. Only the first call succeeds; later calls
/// (or a call after `EngineConfig::global()` was first used) get their value back.
pub fn init_global(config: EngineConfig) -> Result<(), EngineConfig> {
    GLOBAL_CONFIG.set(config)
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
