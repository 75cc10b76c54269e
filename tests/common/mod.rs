use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use growth_chat::config::{Config, ServerConfig, StorageConfig};

/// Configuration pointing at `base_url` with its store inside `dir`
#[allow(dead_code)]
pub fn config_for(base_url: &str, dir: &TempDir) -> Config {
    Config {
        server: ServerConfig {
            base_url: base_url.to_string(),
            timeout_seconds: 5,
            stream: false,
        },
        storage: StorageConfig {
            path: Some(dir.path().join("growth.db").to_string_lossy().to_string()),
        },
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
