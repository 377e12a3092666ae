use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Platform data directory for the app, or the working directory when the
/// platform has none.
pub fn data_root() -> PathBuf {
    ProjectDirs::from("com", "taskcards", "TaskCards")
        .map(|pd| pd.data_dir().to_path_buf())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn store_files(root: &Path) -> (PathBuf, PathBuf) {
    let file = root.join("taskcards.json");
    let backups = root.join("backups");
    (file, backups)
}
