use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::config::AppConfig;
use crate::services::atomic::write_atomic;

pub const CONFIG_FILE: &str = "app_config.json";
pub const CONFIG_ENV: &str = "LINGOPAK_CONFIG";

/// Directory holding the executable, or the working directory when that
/// cannot be determined.
fn base_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `$LINGOPAK_CONFIG`, else `app_config.json` beside the executable.
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_ENV) {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => base_dir().join(CONFIG_FILE),
    }
}

/// Missing or broken files give the defaults.
pub fn load_config(path: &Path) -> AppConfig {
    if !path.exists() {
        return AppConfig::default();
    }

    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            return AppConfig::default();
        }
    };

    serde_json::from_str::<AppConfig>(&data).unwrap_or_else(|e| {
        tracing::warn!("invalid {}: {e}; using defaults", path.display());
        AppConfig::default()
    })
}

pub fn save_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    write_atomic(path, json.as_bytes())
}

/// Configured mods folder, or `mods/` beside the executable.
pub fn mods_dir(cfg: &AppConfig) -> PathBuf {
    let configured = cfg.mods_path.trim();
    if configured.is_empty() {
        base_dir().join("mods")
    } else {
        PathBuf::from(configured)
    }
}
