use anyhow::Result;
use std::path::PathBuf;

pub const POLICY_DIR_NAME: &str = ".storage-policy";
pub const HOME_ENV: &str = "STORAGE_POLICY_HOME";
pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const STORE_FILE_NAME: &str = "policies.yaml";

pub fn policy_home() -> Result<PathBuf> {
    resolve_home(std::env::var(HOME_ENV).ok().as_deref())
}

/// Resolve the home directory from an explicit override, falling back to
/// `~/.storage-policy` when the override is missing or blank.
pub fn resolve_home(override_home: Option<&str>) -> Result<PathBuf> {
    if let Some(raw) = override_home {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(PathBuf::from(trimmed));
        }
    }
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("No home directory found"))?
        .join(POLICY_DIR_NAME))
}

pub fn config_file() -> Result<PathBuf> {
    Ok(policy_home()?.join(CONFIG_FILE_NAME))
}

pub fn store_file() -> Result<PathBuf> {
    Ok(policy_home()?.join(STORE_FILE_NAME))
}
