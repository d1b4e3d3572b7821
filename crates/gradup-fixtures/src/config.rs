//! Configuration and source factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use gradup_core::attempt::TraversalPolicy;
use gradup_core::traits::AssessmentSource;

use crate::builtin::{BuiltinSource, DEFAULT_DELAY};
use crate::directory::DirectorySource;
use crate::http::HttpSource;

/// Name under which the bundled catalog is always available.
pub const BUILTIN: &str = "builtin";

/// Configuration for a single assessment source.
///
/// Note: Custom Debug impl masks API keys.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Builtin {
        #[serde(default = "default_delay_ms")]
        delay_ms: u64,
    },
    Directory {
        path: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
    },
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceConfig::Builtin { delay_ms } => f
                .debug_struct("Builtin")
                .field("delay_ms", delay_ms)
                .finish(),
            SourceConfig::Directory { path } => {
                f.debug_struct("Directory").field("path", path).finish()
            }
            SourceConfig::Http {
                base_url,
                api_key,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .finish(),
        }
    }
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY.as_millis() as u64
}

/// Traversal policy settings (`[policy]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Auto-advance delay after a single-choice answer; 0 disables.
    #[serde(default = "default_auto_advance_ms")]
    pub auto_advance_ms: u64,
    #[serde(default)]
    pub allow_cross_phase_retreat: bool,
}

fn default_auto_advance_ms() -> u64 {
    400
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            auto_advance_ms: default_auto_advance_ms(),
            allow_cross_phase_retreat: false,
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> TraversalPolicy {
        TraversalPolicy {
            auto_advance: (self.auto_advance_ms > 0)
                .then(|| Duration::from_millis(self.auto_advance_ms)),
            allow_cross_phase_retreat: self.allow_cross_phase_retreat,
        }
    }
}

/// Top-level gradup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradupConfig {
    /// Source configurations keyed by name.
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
    #[serde(default = "default_source")]
    pub default_source: String,
    #[serde(default = "default_assessment")]
    pub default_assessment: String,
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Output directory for attempt reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_source() -> String {
    BUILTIN.to_string()
}
fn default_assessment() -> String {
    "placement-simulation".to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./gradup-results")
}

impl Default for GradupConfig {
    fn default() -> Self {
        Self {
            sources: HashMap::new(),
            default_source: default_source(),
            default_assessment: default_assessment(),
            policy: PolicyConfig::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl GradupConfig {
    /// Build the named source, falling back to the bundled catalog for
    /// `builtin` when it is not configured explicitly.
    pub fn source(&self, name: &str) -> Result<Box<dyn AssessmentSource>> {
        match self.sources.get(name) {
            Some(config) => create_source(name, config),
            None if name == BUILTIN => create_source(
                name,
                &SourceConfig::Builtin {
                    delay_ms: default_delay_ms(),
                },
            ),
            None => {
                let mut known: Vec<&str> = self.sources.keys().map(String::as_str).collect();
                if !known.contains(&BUILTIN) {
                    known.push(BUILTIN);
                }
                known.sort_unstable();
                anyhow::bail!(
                    "unknown source '{name}' (configured: {})",
                    known.join(", ")
                )
            }
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(&rest[start + 2..start + end]).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_source_config(config: &SourceConfig) -> SourceConfig {
    match config {
        SourceConfig::Builtin { delay_ms } => SourceConfig::Builtin {
            delay_ms: *delay_ms,
        },
        SourceConfig::Directory { path } => SourceConfig::Directory {
            path: PathBuf::from(resolve_env_vars(&path.to_string_lossy())),
        },
        SourceConfig::Http { base_url, api_key } => SourceConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_deref().map(resolve_env_vars),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `gradup.toml` in the current directory
/// 2. `~/.config/gradup/config.toml`
///
/// `GRADUP_API_KEY` overrides the key of the `http` source.
pub fn load_config() -> Result<GradupConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GradupConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("gradup.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<GradupConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GradupConfig::default(),
    };

    config.sources = config
        .sources
        .iter()
        .map(|(k, v)| (k.clone(), resolve_source_config(v)))
        .collect();

    if let Ok(key) = std::env::var("GRADUP_API_KEY") {
        if let Some(SourceConfig::Http { api_key, .. }) = config.sources.get_mut("http") {
            *api_key = Some(key);
        }
    }

    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("gradup"))
}

/// Create a source instance from its configuration.
pub fn create_source(name: &str, config: &SourceConfig) -> Result<Box<dyn AssessmentSource>> {
    tracing::debug!(source = name, ?config, "creating source");
    match config {
        SourceConfig::Builtin { delay_ms } => Ok(Box::new(BuiltinSource::new(
            Duration::from_millis(*delay_ms),
        )?)),
        SourceConfig::Directory { path } => Ok(Box::new(DirectorySource::new(path))),
        SourceConfig::Http { base_url, api_key } => {
            Ok(Box::new(HttpSource::new(base_url, api_key.clone())?))
        }
    }
}
