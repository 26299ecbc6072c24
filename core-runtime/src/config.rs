//! # Configuration
//!
//! The companion service owns the user's configuration and hands it to the
//! host process as a JSON document. This module parses, validates and holds
//! that document.
//!
//! ## Overview
//!
//! - [`ModConfig`] is the parsed document. Missing keys take their defaults
//!   and unknown keys are ignored, so older and newer companions interoperate.
//! - [`ModConfigBuilder`] builds a validated config in code (tests, hosts
//!   without a companion-side config).
//! - [`ConfigHandle`] holds the current config. Every reload replaces it
//!   wholesale; readers keep the `Arc` they already have.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::{ConfigHandle, ModConfig};
//!
//! let config = ModConfig::builder()
//!     .locale("fr_FR")
//!     .native_hooks(true)
//!     .resume_skip_count(1)
//!     .build()
//!     .expect("valid config");
//!
//! let handle = ConfigHandle::new(config);
//! assert_eq!(handle.current().locale, "fr_FR");
//! ```

use crate::error::{Error, Result};
use bridge_traits::BridgeClient;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Locale used when the companion does not provide one.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Upper bound for the bridge connect timeout (10 minutes).
pub const MAX_CONNECT_TIMEOUT_MS: u64 = 600_000;

/// Configuration document provided by the companion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModConfig {
    /// User interface locale, e.g. `en_US`
    pub locale: String,

    /// Experimental switches
    pub experimental: ExperimentalConfig,

    /// Bootstrap tuning
    pub bootstrap: BootstrapConfig,
}

impl Default for ModConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            experimental: ExperimentalConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

/// Experimental feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentalConfig {
    /// Intercept native unary calls. Only takes effect with an active session.
    pub native_hooks: bool,
}

/// Bootstrap tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Bound on the bridge handshake. `None` waits indefinitely.
    pub connect_timeout_ms: Option<u64>,

    /// Number of resumes after attach that are ignored. The host framework
    /// delivers a spurious resume on cold start.
    pub resume_skip_count: u32,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            resume_skip_count: 1,
        }
    }
}

impl ModConfig {
    /// Creates a new builder.
    pub fn builder() -> ModConfigBuilder {
        ModConfigBuilder::default()
    }

    /// Parses and validates a configuration document.
    ///
    /// An empty document yields the defaults: a companion that never saved
    /// a config sends nothing.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let config: ModConfig = serde_json::from_slice(bytes)
            .map_err(|e| Error::Config(format!("Malformed configuration document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration document.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.locale.trim().is_empty() {
            return Err(Error::Config("Locale cannot be empty".to_string()));
        }

        if let Some(timeout) = self.bootstrap.connect_timeout_ms {
            if timeout == 0 {
                return Err(Error::Config(
                    "Connect timeout must be greater than 0ms".to_string(),
                ));
            }
            if timeout > MAX_CONNECT_TIMEOUT_MS {
                return Err(Error::Config(format!(
                    "Connect timeout exceeds maximum of {}ms",
                    MAX_CONNECT_TIMEOUT_MS
                )));
            }
        }

        Ok(())
    }

    /// Bridge connect timeout, if bounded.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.bootstrap.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for [`ModConfig`].
#[derive(Debug, Default)]
pub struct ModConfigBuilder {
    locale: Option<String>,
    native_hooks: bool,
    connect_timeout_ms: Option<u64>,
    resume_skip_count: Option<u32>,
}

impl ModConfigBuilder {
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn native_hooks(mut self, enabled: bool) -> Self {
        self.native_hooks = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn resume_skip_count(mut self, count: u32) -> Self {
        self.resume_skip_count = Some(count);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ModConfig> {
        let defaults = BootstrapConfig::default();
        let config = ModConfig {
            locale: self.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            experimental: ExperimentalConfig {
                native_hooks: self.native_hooks,
            },
            bootstrap: BootstrapConfig {
                connect_timeout_ms: self.connect_timeout_ms,
                resume_skip_count: self
                    .resume_skip_count
                    .unwrap_or(defaults.resume_skip_count),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Shared holder of the current configuration.
#[derive(Debug)]
pub struct ConfigHandle {
    current: RwLock<Arc<ModConfig>>,
}

impl ConfigHandle {
    pub fn new(config: ModConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<ModConfig> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the configuration.
    pub fn replace(&self, config: ModConfig) -> Arc<ModConfig> {
        let config = Arc::new(config);
        *self.current.write() = Arc::clone(&config);
        config
    }

    /// Fetches the configuration from the companion and replaces the
    /// current one. On failure the previous configuration stays in place.
    pub async fn reload_from_bridge(&self, bridge: &dyn BridgeClient) -> Result<Arc<ModConfig>> {
        let raw = bridge.reload_config().await?;
        let config = ModConfig::from_json(&raw)?;
        debug!(
            locale = %config.locale,
            native_hooks = config.experimental.native_hooks,
            "Configuration reloaded"
        );
        Ok(self.replace(config))
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(ModConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        bridge::{ConnectCallback, SyncCallback},
        error::{BridgeError, Result as BridgeResult},
        scripting::ScriptingInterface,
        storage::FileStore,
    };
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Bridge {}

        #[async_trait::async_trait]
        impl BridgeClient for Bridge {
            fn connect(&self, on_result: ConnectCallback);
            async fn register_sync(&self, callback: Arc<dyn SyncCallback>) -> BridgeResult<()>;
            async fn reload_config(&self) -> BridgeResult<Bytes>;
            async fn fetch_translations(&self, locale: &str) -> BridgeResult<HashMap<String, String>>;
            async fn close_overlay(&self) -> BridgeResult<()>;
            async fn push_directory(&self, groups: Vec<String>, friends: Vec<String>) -> BridgeResult<()>;
            fn files(&self) -> Arc<dyn FileStore>;
            fn scripting_interface(&self) -> BridgeResult<Arc<dyn ScriptingInterface>>;
        }
    }

    #[test]
    fn test_defaults() {
        let config = ModConfig::default();
        assert_eq!(config.locale, DEFAULT_LOCALE);
        assert!(!config.experimental.native_hooks);
        assert_eq!(config.bootstrap.resume_skip_count, 1);
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn test_builder_validates_timeout() {
        let err = ModConfig::builder()
            .connect_timeout(Duration::from_millis(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ModConfig::builder()
            .connect_timeout(Duration::from_secs(3600))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("maximum"));

        let config = ModConfig::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_empty_locale_rejected() {
        assert!(ModConfig::builder().locale("  ").build().is_err());
    }

    #[test]
    fn test_from_json_partial_document() {
        let config =
            ModConfig::from_json(br#"{"experimental":{"native_hooks":true},"extra":1}"#).unwrap();
        assert!(config.experimental.native_hooks);
        assert_eq!(config.locale, DEFAULT_LOCALE);
        assert_eq!(config.bootstrap.resume_skip_count, 1);
    }

    #[test]
    fn test_from_json_empty_document_is_default() {
        assert_eq!(ModConfig::from_json(b"").unwrap(), ModConfig::default());
        assert_eq!(ModConfig::from_json(b" \n").unwrap(), ModConfig::default());
    }

    #[test]
    fn test_from_json_malformed() {
        let err = ModConfig::from_json(b"{not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_skip_count() {
        let config = ModConfig::builder().resume_skip_count(2).build().unwrap();
        let parsed = ModConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.bootstrap.resume_skip_count, 2);
    }

    #[test]
    fn test_handle_replace_keeps_old_snapshot() {
        let handle = ConfigHandle::default();
        let before = handle.current();
        handle.replace(ModConfig::builder().locale("de_DE").build().unwrap());
        assert_eq!(before.locale, DEFAULT_LOCALE);
        assert_eq!(handle.current().locale, "de_DE");
    }

    #[tokio::test]
    async fn test_reload_from_bridge() {
        let mut bridge = MockBridge::new();
        bridge
            .expect_reload_config()
            .times(1)
            .returning(|| Ok(Bytes::from_static(br#"{"locale":"it_IT"}"#)));

        let handle = ConfigHandle::default();
        let config = handle.reload_from_bridge(&bridge).await.unwrap();
        assert_eq!(config.locale, "it_IT");
        assert_eq!(handle.current().locale, "it_IT");
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_previous() {
        let mut bridge = MockBridge::new();
        bridge
            .expect_reload_config()
            .returning(|| Err(BridgeError::Disconnected));

        let handle = ConfigHandle::new(ModConfig::builder().locale("es_ES").build().unwrap());
        let err = handle.reload_from_bridge(&bridge).await.unwrap_err();
        assert!(matches!(err, Error::Bridge(BridgeError::Disconnected)));
        assert_eq!(handle.current().locale, "es_ES");
    }
}
