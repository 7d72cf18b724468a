//! Runtime configuration for the bridge.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use vibe_core::host::HostConnector;
use vibe_core::host::memory::{MemoryConnector, MemoryHost};
use vibe_core::host::script::ScriptHostConnector;

/// Default HTTP listen address for the live bridge.
const DEFAULT_LISTEN: &str = "127.0.0.1:8000";
/// Default request body limit. Fits a 65³ LUT with room to spare.
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address `{value}`: {source}")]
    InvalidListen {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Runtime configuration for the bridge and the import command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// HTTP listen address.
    pub listen: String,
    /// Resolve's LUT root; assets go under `VibeEngine/` inside it.
    pub lut_root: PathBuf,
    /// Helper process that bridges to Resolve's scripting API.
    pub host_command: Vec<String>,
    /// Maximum accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Use the in-memory host instead of Resolve.
    pub offline: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl BridgeConfig {
    /// Build from an environment-like lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            listen: lookup("VIBE_BRIDGE_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            lut_root: lookup("VIBE_LUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(default_lut_root),
            host_command: lookup("VIBE_HOST_COMMAND")
                .map(|s| split_command(&s))
                .unwrap_or_default(),
            max_body_bytes: lookup("VIBE_MAX_BODY_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            offline: lookup("VIBE_OFFLINE").is_some(),
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|source| ConfigError::InvalidListen {
                value: self.listen.clone(),
                source,
            })
    }

    /// Connector for the configured host.
    pub fn connector(&self) -> Arc<dyn HostConnector> {
        if self.offline {
            tracing::warn!("Running offline: grades go to an in-memory host");
            Arc::new(MemoryConnector::new(MemoryHost::new()))
        } else {
            Arc::new(ScriptHostConnector::new(self.host_command.clone()))
        }
    }
}

/// Whitespace-split a helper command line.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

/// Resolve's system LUT directory for this platform.
fn default_lut_root() -> PathBuf {
    if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\ProgramData\Blackmagic Design\DaVinci Resolve\Support\LUT")
    } else if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/Blackmagic Design/DaVinci Resolve/LUT")
    } else {
        PathBuf::from("/opt/resolve/LUT")
    }
}
