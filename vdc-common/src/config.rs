//! Configuration loading and dataset root resolution
//!
//! Dataset root resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`VDC_DATASET_ROOT`)
//! 3. TOML config file (`dataset_root`)
//! 4. OS-dependent compiled default (first candidate that exists)
//!
//! A missing TOML file is not an error: the checker logs a warning and runs
//! with compiled defaults. A TOML file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable overriding the dataset root
pub const DATASET_ROOT_ENV: &str = "VDC_DATASET_ROOT";

/// Environment variable overriding the TOML config location
pub const CONFIG_PATH_ENV: &str = "VDC_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Dataset root (directory holding `video/`, `keyframes/`, ...)
    #[serde(default)]
    pub dataset_root: Option<PathBuf>,

    /// Directory receiving JSON / Markdown reports
    #[serde(default)]
    pub reports_dir: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-collection minimum file sizes
    #[serde(default)]
    pub thresholds: SizeThresholds,

    /// Quality sampler settings
    #[serde(default)]
    pub sampler: SamplerConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Minimum file size in bytes per collection
///
/// A file smaller than its collection's threshold is flagged as undersized.
/// A 0-byte file is always flagged, whatever the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeThresholds {
    pub video: u64,
    pub keyframe: u64,
    pub feature: u64,
    pub map: u64,
    pub media_info: u64,
    pub objects: u64,
}

impl Default for SizeThresholds {
    fn default() -> Self {
        Self {
            video: 1024,
            keyframe: 256,
            feature: 128,
            map: 16,
            media_info: 16,
            objects: 16,
        }
    }
}

/// Quality sampler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Run the sampler after validation
    pub enabled: bool,
    /// Keyframes examined per video
    pub frames_per_video: usize,
    /// Annotated images written in total
    pub max_images: usize,
    /// Detections below this confidence are not drawn
    pub score_threshold: f32,
    /// RNG seed; `None` draws a fresh sample every run
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frames_per_video: 3,
            max_images: 5,
            score_threshold: 0.3,
            seed: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled-in defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    /// Dataset root candidates, probed in order
    pub dataset_root_candidates: Vec<PathBuf>,
    pub reports_dir: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let home = dirs::home_dir();
        let mut candidates = Vec::new();

        if cfg!(target_os = "windows") {
            candidates.push(PathBuf::from("C:\\HCMC_AI_Data\\Data2025"));
            candidates.push(PathBuf::from("D:\\HCMC_AI_Data\\Data2025"));
        } else if cfg!(target_os = "macos") {
            candidates.push(PathBuf::from("/Volumes/Data/HCMC_AI_Data/Data2025"));
            if let Some(h) = &home {
                candidates.push(h.join("HCMC_AI_Data").join("Data2025"));
            }
        } else if cfg!(target_os = "linux") {
            if let Some(h) = &home {
                candidates.push(h.join("HCMC_AI_Data").join("Data2025"));
            }
            candidates.push(PathBuf::from("/mnt/HCMC_AI_Data/Data2025"));
            candidates.push(PathBuf::from("/media/HCMC_AI_Data/Data2025"));
        }
        candidates.push(PathBuf::from("./Data2025"));

        Self {
            dataset_root_candidates: candidates,
            reports_dir: PathBuf::from("reports"),
            log_level: default_log_level(),
        }
    }

    /// First candidate that exists, else the first candidate
    pub fn probe_dataset_root(&self) -> PathBuf {
        for candidate in &self.dataset_root_candidates {
            if candidate.is_dir() {
                debug!(path = %candidate.display(), "Default dataset root found");
                return candidate.clone();
            }
        }
        self.dataset_root_candidates
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("./Data2025"))
    }
}

/// Resolves the dataset root from CLI → ENV → TOML → compiled default
#[derive(Debug, Clone)]
pub struct DatasetRootResolver {
    toml_root: Option<PathBuf>,
    defaults: CompiledDefaults,
}

impl DatasetRootResolver {
    pub fn new(toml_config: &TomlConfig) -> Self {
        Self {
            toml_root: toml_config.dataset_root.clone(),
            defaults: CompiledDefaults::for_current_platform(),
        }
    }

    /// Resolve the dataset root
    ///
    /// Never fails: an unusable result is caught later when the root is
    /// checked before scanning.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            info!("Dataset root from command line: {}", path.display());
            return path.to_path_buf();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(DATASET_ROOT_ENV) {
            if !path.trim().is_empty() {
                info!("Dataset root from {}: {}", DATASET_ROOT_ENV, path);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            info!("Dataset root from config file: {}", path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let path = self.defaults.probe_dataset_root();
        info!("Dataset root from platform default: {}", path.display());
        path
    }
}

/// Default TOML location: `$VDC_CONFIG`, else `<config dir>/vdc/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|d| d.join("vdc").join("config.toml"))
}

/// Load TOML configuration
///
/// A missing file degrades to defaults with a warning; a malformed file is a
/// configuration error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let resolved = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    let Some(config_path) = resolved else {
        warn!("Could not determine config directory, using compiled defaults");
        return Ok(TomlConfig::default());
    };

    if !config_path.exists() {
        // Explicit paths deserve a louder message than the implicit default
        if path.is_some() {
            warn!(
                "Config file not found: {} (using compiled defaults)",
                config_path.display()
            );
        } else {
            debug!(
                "No config file at {}, using compiled defaults",
                config_path.display()
            );
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", config_path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", config_path.display(), e)))?;

    info!("Loaded config file: {}", config_path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_are_collection_specific() {
        let t = SizeThresholds::default();
        assert!(t.media_info < t.video);
        assert!(t.objects < t.keyframe);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            dataset_root = "/data/Data2025"

            [thresholds]
            video = 4096
            "#,
        )
        .unwrap();

        assert_eq!(config.dataset_root, Some(PathBuf::from("/data/Data2025")));
        assert_eq!(config.thresholds.video, 4096);
        assert_eq!(config.thresholds.keyframe, 256);
        assert_eq!(config.logging.level, "info");
        assert!(!config.sampler.enabled);
        assert_eq!(config.sampler.max_images, 5);
    }

    #[test]
    fn test_probe_falls_back_to_first_candidate() {
        let defaults = CompiledDefaults {
            dataset_root_candidates: vec![
                PathBuf::from("/nonexistent/vdc/a"),
                PathBuf::from("/nonexistent/vdc/b"),
            ],
            reports_dir: PathBuf::from("reports"),
            log_level: "info".to_string(),
        };
        assert_eq!(defaults.probe_dataset_root(), PathBuf::from("/nonexistent/vdc/a"));
    }
}
