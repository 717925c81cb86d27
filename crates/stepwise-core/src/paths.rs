use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STEPWISE_DIR: &str = ".stepwise";
pub const STORE_DIR: &str = ".stepwise/store";
pub const CONFIG_FILE: &str = ".stepwise/config.yaml";

/// Key under which the whole task collection is stored.
pub const TASKS_KEY: &str = "tasks";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn stepwise_dir(root: &Path) -> PathBuf {
    root.join(STEPWISE_DIR)
}

pub fn store_dir(root: &Path) -> PathBuf {
    root.join(STORE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}
