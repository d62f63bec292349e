//! Pin configuration file.
//!
//! Maps host names to the certificate files pinned for them. Relative
//! certificate paths are resolved against the directory of the config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default bound on a single trust evaluation.
const DEFAULT_EVALUATION_TIMEOUT_SECS: u64 = 10;

/// Pinned certificates for one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinnedHost {
    /// Host name as it appears in URLs (no port)
    pub host: String,
    /// DER certificate files trusted for this host
    pub certificates: Vec<PathBuf>,
    /// Optional label
    pub label: Option<String>,
}

/// Contents of `pins.toml`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PinConfig {
    /// Upper bound on one offline trust evaluation, in seconds
    #[serde(default = "default_evaluation_timeout_secs")]
    pub evaluation_timeout_secs: u64,
    #[serde(default)]
    pub pins: Vec<PinnedHost>,
    /// Directory relative certificate paths are resolved against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_evaluation_timeout_secs() -> u64 {
    DEFAULT_EVALUATION_TIMEOUT_SECS
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            evaluation_timeout_secs: DEFAULT_EVALUATION_TIMEOUT_SECS,
            pins: Vec::new(),
            base_dir: None,
        }
    }
}

impl PinConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used and a missing file yields an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            tracing::debug!(path = %path.display(), "no pin config, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read pin config at {}", path.display()))?;
        Self::parse(&content, path.parent())
            .with_context(|| format!("Failed to parse pin config at {}", path.display()))
    }

    /// Parse TOML content, resolving relative paths against `base_dir`.
    pub fn parse(content: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut config: PinConfig = toml::from_str(content)?;
        config.base_dir = base_dir.map(Path::to_path_buf);
        Ok(config)
    }

    /// Get the path to the default config file.
    fn default_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "certpin", "certpin")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("pins.toml"))
    }

    /// Certificate files pinned for `host`, resolved to usable paths.
    ///
    /// Hosts compare case-insensitively. Multiple entries for the same host
    /// are concatenated in file order.
    pub fn certificates_for(&self, host: &str) -> Vec<PathBuf> {
        self.pins
            .iter()
            .filter(|pin| pin.host.eq_ignore_ascii_case(host))
            .flat_map(|pin| pin.certificates.iter())
            .map(|path| self.resolve(path))
            .collect()
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluation_timeout_secs)
    }
}
