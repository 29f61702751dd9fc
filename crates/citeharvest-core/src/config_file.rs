use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub structured: Option<StructuredConfig>,
    pub acquisition: Option<AcquisitionConfig>,
    pub parsing: Option<ParsingSection>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    pub user_agent: Option<String>,
    pub download_dir: Option<String>,
    pub max_content_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingSection {
    pub fallback_lines: Option<usize>,
    pub extra_headings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub log_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/citeharvest/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("citeharvest").join("config.toml"))
}

/// Load config by cascading CWD `.citeharvest.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".citeharvest.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let structured = (overlay.structured.unwrap_or_default(), base.structured.unwrap_or_default());
    let acquisition = (
        overlay.acquisition.unwrap_or_default(),
        base.acquisition.unwrap_or_default(),
    );
    let parsing = (overlay.parsing.unwrap_or_default(), base.parsing.unwrap_or_default());
    let logging = (overlay.logging.unwrap_or_default(), base.logging.unwrap_or_default());

    ConfigFile {
        structured: Some(StructuredConfig {
            enabled: structured.0.enabled.or(structured.1.enabled),
            base_url: structured.0.base_url.or(structured.1.base_url),
        }),
        acquisition: Some(AcquisitionConfig {
            user_agent: acquisition.0.user_agent.or(acquisition.1.user_agent),
            download_dir: acquisition.0.download_dir.or(acquisition.1.download_dir),
            max_content_chars: acquisition
                .0
                .max_content_chars
                .or(acquisition.1.max_content_chars),
        }),
        parsing: Some(ParsingSection {
            fallback_lines: parsing.0.fallback_lines.or(parsing.1.fallback_lines),
            extra_headings: parsing.0.extra_headings.or(parsing.1.extra_headings),
        }),
        logging: Some(LoggingConfig {
            level: logging.0.level.or(logging.1.level),
            log_dir: logging.0.log_dir.or(logging.1.log_dir),
        }),
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Write `config` as pretty TOML to `path`, creating parent directories.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
}
