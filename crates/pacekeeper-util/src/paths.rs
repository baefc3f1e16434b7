//! Default paths for pacekeeper state and policy files
//!
//! Provides centralized path defaults that all crates can use.
//! Everything is user-writable by default (no root required):
//! - Data: `$XDG_DATA_HOME/pacekeeper` or `~/.local/share/pacekeeper`
//! - Global policy: `$XDG_CONFIG_HOME/pacekeeper/policy.yml` or
//!   `~/.config/pacekeeper/policy.yml`
//!
//! Policy files are searched closest-scope first: the working directory, the
//! enclosing repository root, then the global location. A project-local
//! policy therefore overrides the global one without the caller knowing
//! anything about precedence.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the data directory
pub const PACEKEEPER_DATA_DIR_ENV: &str = "PACEKEEPER_DATA_DIR";

/// Environment variable for pointing at an explicit policy file
pub const PACEKEEPER_POLICY_ENV: &str = "PACEKEEPER_POLICY";

/// Project-scoped policy filename
pub const PROJECT_POLICY_FILENAME: &str = ".pacekeeper.yml";

/// Application subdirectory name
const APP_DIR: &str = "pacekeeper";

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$PACEKEEPER_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/pacekeeper` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/pacekeeper` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(PACEKEEPER_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking PACEKEEPER_DATA_DIR.
/// Used for default values where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the global policy file path.
///
/// `$XDG_CONFIG_HOME/pacekeeper/policy.yml` if XDG_CONFIG_HOME is set,
/// otherwise `~/.config/pacekeeper/policy.yml`.
pub fn global_policy_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("policy.yml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("policy.yml");
    }

    PathBuf::from("/tmp").join(APP_DIR).join("policy.yml")
}

/// Walk up from `start` looking for a `.git` directory (repository root).
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Build the policy search order, closest scope first:
/// env override → working directory → repository root → global.
pub fn policy_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(explicit) = std::env::var(PACEKEEPER_POLICY_ENV) {
        paths.push(PathBuf::from(explicit));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(PROJECT_POLICY_FILENAME));
        if let Some(root) = find_repo_root(&cwd) {
            if root != cwd {
                paths.push(root.join(PROJECT_POLICY_FILENAME));
            }
        }
    }

    paths.push(global_policy_path());
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_contains_app_name() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("pacekeeper"));
    }

    #[test]
    fn global_policy_path_contains_app_name() {
        let path = global_policy_path();
        assert!(path.to_string_lossy().contains("pacekeeper"));
        assert!(path.to_string_lossy().ends_with("policy.yml"));
    }

    #[test]
    fn search_paths_end_with_global() {
        let paths = policy_search_paths();
        assert!(!paths.is_empty());
        assert_eq!(*paths.last().unwrap(), global_policy_path());
    }

    #[test]
    fn repo_root_not_found_at_filesystem_root() {
        // A directory tree without .git anywhere above it
        assert_eq!(find_repo_root(Path::new("/proc")), None);
    }
}
