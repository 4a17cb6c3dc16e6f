use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Base URL of the sandbox control plane (e.g., https://sandbox.example.com)
    pub sandbox_url: String,

    /// Bearer secret sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            sandbox_url: String::new(),
            secret: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SandboxConfig {
    pub fn new(sandbox_url: impl Into<String>) -> Self {
        Self {
            sandbox_url: sandbox_url.into(),
            ..Self::default()
        }
    }

    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "sandbox-fs", "sandbox-fs") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("sandbox-fs.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// URL of a control-plane endpoint, e.g. `endpoint("read_file")`
    pub fn endpoint(&self, name: &str) -> String {
        let base = self.sandbox_url.trim_end_matches('/');
        format!("{}/{}", base, name.trim_start_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
