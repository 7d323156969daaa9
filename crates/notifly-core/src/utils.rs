//! Utility helpers — data directory and secret masking.

use std::path::PathBuf;

/// Get the Notifly data directory (e.g. `~/.notifly/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".notifly")
}

/// Show only the first `visible` characters of a secret, followed by `...`.
///
/// Unicode-safe. Empty input stays empty.
pub fn mask_secret(secret: &str, visible: usize) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let head: String = secret.chars().take(visible).collect();
    format!("{head}...")
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}
