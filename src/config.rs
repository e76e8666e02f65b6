//! Application configuration.
//!
//! Defaults are compiled in; an optional `voicepilot.toml` and
//! `VOICEPILOT_*` environment variables override them.

use std::path::Path;

use action_executor::{ExecutorConfig, MediaSiteConfig};
use anyhow::{Context, Result};
use nav_controller::ControllerConfig;
use serde::{Deserialize, Serialize};

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_inject_settle_ms() -> u64 {
    500
}

fn default_load_timeout_ms() -> u64 {
    10_000
}

fn default_wait_timeout_ms() -> u64 {
    5_000
}

fn default_media_result_settle_ms() -> u64 {
    2_000
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model used by the intent collaborator.
    #[serde(default = "default_model")]
    pub model: String,

    /// Delay between executor injection and command delivery.
    #[serde(default = "default_inject_settle_ms")]
    pub inject_settle_ms: u64,

    /// How long a navigation may take before the state machine gives up.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Element-resolution budget per strategy chain.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,

    /// Settle before auto-selecting the first media result.
    #[serde(default = "default_media_result_settle_ms")]
    pub media_result_settle_ms: u64,

    /// Media-site selector chains; defaults target YouTube.
    #[serde(default)]
    pub media_site: MediaSiteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            inject_settle_ms: default_inject_settle_ms(),
            load_timeout_ms: default_load_timeout_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
            media_result_settle_ms: default_media_result_settle_ms(),
            media_site: MediaSiteConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration, layering an optional file and the
    /// environment over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = match path {
            Some(path) => builder.add_source(
                config::File::from(path.to_path_buf()).required(true),
            ),
            None => builder.add_source(config::File::with_name("voicepilot").required(false)),
        };

        let settings = builder
            .add_source(config::Environment::with_prefix("VOICEPILOT"))
            .build()
            .context("building configuration")?;

        settings
            .try_deserialize::<AppConfig>()
            .context("parsing configuration")
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            inject_settle_ms: self.inject_settle_ms,
            load_timeout_ms: self.load_timeout_ms,
            media_results_base: self.media_site.results_base.clone(),
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            wait_timeout_ms: self.wait_timeout_ms,
            media_result_settle_ms: self.media_result_settle_ms,
            media_site: self.media_site.clone(),
            ..ExecutorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_tuned_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.inject_settle_ms, 500);
        assert_eq!(cfg.media_result_settle_ms, 2_000);
        assert_eq!(cfg.media_site.host_fragment, "youtube.com");
    }

    #[test]
    fn derived_configs_carry_overrides() {
        let cfg = AppConfig {
            inject_settle_ms: 42,
            wait_timeout_ms: 99,
            ..Default::default()
        };
        assert_eq!(cfg.controller_config().inject_settle_ms, 42);
        assert_eq!(cfg.executor_config().wait_timeout_ms, 99);
    }
}
