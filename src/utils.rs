use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "parking_collector";
const DEFAULT_STORE_FILE: &str = "parking_data_dolomites.csv";

/// `<user data dir>/parking_collector/parking_data_dolomites.csv`, or `data/...` relative
/// to the working directory when the platform has no data directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
        .join(DEFAULT_STORE_FILE)
}

/// Directory holding `path`, created if missing. A bare file name resolves to `.`.
pub fn ensure_parent_dir_exists(path: &Path) -> io::Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    match std::fs::metadata(&parent) {
        Ok(metadata) if metadata.is_dir() => Ok(parent),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Store parent exists but is not a directory: {}", parent.display()),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("Creating data directory: {}", parent.display());
            std::fs::create_dir_all(&parent)?;
            Ok(parent)
        }
        Err(e) => Err(e),
    }
}
