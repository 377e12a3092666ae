use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use taskcards_core::{CoreError, KvStore};
use tempfile::NamedTempFile;

pub mod paths;

const FILE_VERSION: u32 = 1;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileImage {
    version: u32,
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

struct State {
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

impl State {
    fn new_empty() -> Self {
        Self {
            updated_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            updated_at: self.updated_at,
            entries: self.entries.clone(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        Self {
            updated_at: img.updated_at,
            entries: img.entries,
        }
    }
}

/// A [`KvStore`] kept as one JSON document on disk.
///
/// Every `set` rewrites the whole document through a temp file and drops a
/// timestamped copy into the backups directory, keeping the newest
/// `max_backups`. A failed write is logged; the in-memory entries stay
/// authoritative for the rest of the process.
pub struct JsonKvStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
}

impl JsonKvStore {
    pub fn open_in(root: &Path, max_backups: usize) -> Result<Self, CoreError> {
        let (file, backups) = paths::store_files(root);
        Self::open_with(file, backups, max_backups)
    }

    pub fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path)?;
        info!("opened store {} ({} keys)", path.display(), state.entries.len());
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) {
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        if let Err(e) = write_with_backup(&self.path, &self.backups_dir, self.max_backups, &snapshot) {
            warn!("failed to write {}: {e}", self.path.display());
        }
    }
}

impl KvStore for JsonKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.state.read().entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.state.write().entries.insert(key.to_string(), value);
        debug!("set {key}");
        self.save();
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

fn load_or_init(path: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let buf = fs::read_to_string(path).map_err(|_| CoreError::Storage("io"))?;
        let img = serde_json::from_str::<FileImage>(&buf).map_err(|e| {
            warn!("unreadable store file {}: {e}", path.display());
            CoreError::Storage("corrupt store file")
        })?;
        Ok(State::from_image(img))
    } else {
        let st = State::new_empty();
        write_atomic(path, &encode(&st.to_image())?).map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn encode(img: &FileImage) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec_pretty(img).map_err(|_| CoreError::Storage("encode"))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, img: &FileImage) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img).map_err(io::Error::other)?;
    write_atomic(path, &json)?;

    // Backup rotation
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S-%3f");
    let backup_path = backups_dir.join(format!("taskcards-{ts}.json"));
    write_atomic(&backup_path, &json)?;

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // Names embed the timestamp, so they sort oldest first.
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            debug!("pruning backup {}", e.path().display());
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}
