use directories::ProjectDirs;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sieve-engine").map(|d| d.config_dir().to_path_buf())
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}
