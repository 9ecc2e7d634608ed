//! Service-config loading: resolves a service name to its JSON config file.

use crate::engine::config::ServiceConfig;
use std::path::{Path, PathBuf};

/// Directory holding `<service>.json` config files.
pub fn configs_dir() -> PathBuf {
    std::env::var("COOKIE_CHECKER_CONFIGS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./configs"))
}

/// Load the config for `service` from `<dir>/<lowercased service>.json`.
pub fn load_config(dir: &Path, service: &str) -> Result<ServiceConfig, String> {
    let path = dir.join(format!("{}.json", service.to_lowercase()));
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_config(&content)
}

/// Parse a config from a JSON string.
pub fn parse_config(content: &str) -> Result<ServiceConfig, String> {
    serde_json::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))
}

/// Count the `.json` configs currently present. Used by the status endpoint;
/// an unreadable directory counts as zero.
pub fn count_configs(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };
    entries
        .flatten()
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map(|ext| ext == "json")
                .unwrap_or(false)
        })
        .count()
}
