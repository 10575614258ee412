//! The durable CSV table of observations.
//!
//! Every mutation writes a complete new copy of the file to a temporary file in the
//! same directory and renames it over the target, so readers see either the old or
//! the new contents and never a partially written table.

use crate::store::coverage::DateCoverage;
use crate::store::error::StoreError;
use crate::store::merge::{merge_observations, MergeReport};
use crate::types::observation::Observation;
use crate::utils::ensure_parent_dir_exists;
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

pub const CSV_HEADER: [&str; 9] = [
    "timestamp",
    "name",
    "available",
    "capacity",
    "location",
    "region",
    "latitude",
    "longitude",
    "data_timestamp",
];

const COMMENT: u8 = b'#';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored observation in file order.
    ///
    /// A store that does not exist yet loads as empty.
    pub async fn load(&self) -> Result<Vec<Observation>, StoreError> {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let contents = read_contents(&path)?;
            decode(&path, &contents)
        })
        .await?
    }

    /// Adds `observations` to the end of the table without checking for duplicates.
    ///
    /// The stored rows are decoded and written back first, so a file in an older column
    /// layout is brought up to [`CSV_HEADER`] instead of mixing layouts. A store that
    /// cannot be decoded is left untouched. Returns the number of rows added.
    pub async fn append(&self, observations: Vec<Observation>) -> Result<usize, StoreError> {
        if observations.is_empty() {
            debug!("Nothing to append to {}", self.path.display());
            return Ok(0);
        }
        let path = self.path.clone();
        task::spawn_blocking(move || append_blocking(&path, &observations)).await?
    }

    /// Writes back the union of the stored rows and `candidates`; stored rows win on
    /// conflicting keys. The rewritten file is ordered by timestamp, then station.
    pub async fn merge(&self, candidates: Vec<Observation>) -> Result<MergeReport, StoreError> {
        let path = self.path.clone();
        task::spawn_blocking(move || merge_blocking(&path, candidates)).await?
    }

    /// Calendar days that already have at least one observation.
    pub async fn coverage(&self) -> Result<DateCoverage, StoreError> {
        let observations = self.load().await?;
        Ok(DateCoverage::from_observations(&observations))
    }
}

fn read_contents(path: &Path) -> Result<Vec<u8>, StoreError> {
    match std::fs::read(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No dataset at {} yet", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(StoreError::Io(path.to_path_buf(), e)),
    }
}

fn decode(path: &Path, contents: &[u8]) -> Result<Vec<Observation>, StoreError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .comment(Some(COMMENT))
        .trim(csv::Trim::All)
        .from_reader(contents);

    reader
        .deserialize::<Observation>()
        .map(|row| {
            row.map_err(|e| StoreError::Decode {
                path: path.to_path_buf(),
                line: e.position().map(|p| p.line()),
                source: e,
            })
        })
        .collect()
}

/// Comment lines at the top of the file, kept across rewrites.
fn leading_comments(contents: &[u8]) -> Vec<&[u8]> {
    contents
        .split(|b| *b == b'\n')
        .take_while(|line| line.first() == Some(&COMMENT))
        .collect()
}

fn encode(
    path: &Path,
    buffer: &mut Vec<u8>,
    observations: &[Observation],
) -> Result<(), StoreError> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(buffer);
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| StoreError::Encode(path.to_path_buf(), e))?;
    for observation in observations {
        writer
            .serialize(observation)
            .map_err(|e| StoreError::Encode(path.to_path_buf(), e))?;
    }
    writer
        .flush()
        .map_err(|e| StoreError::Io(path.to_path_buf(), e))
}

fn append_blocking(path: &Path, observations: &[Observation]) -> Result<usize, StoreError> {
    let contents = read_contents(path)?;
    let mut rows = decode(path, &contents)?;
    let existing_len = rows.len();
    rows.extend_from_slice(observations);

    let buffer = render(path, &contents, &rows)?;
    replace_atomically(path, &buffer)?;
    info!(
        "Appended {} observations to {} ({} -> {} rows)",
        observations.len(),
        path.display(),
        existing_len,
        rows.len()
    );
    Ok(observations.len())
}

fn merge_blocking(path: &Path, candidates: Vec<Observation>) -> Result<MergeReport, StoreError> {
    let contents = read_contents(path)?;
    let existing = decode(path, &contents)?;
    let existing_len = existing.len();
    let (merged, report) = merge_observations(existing, candidates);

    let buffer = render(path, &contents, &merged)?;
    replace_atomically(path, &buffer)?;
    info!(
        "Merged into {}: {} added, {} duplicates skipped ({} -> {} rows)",
        path.display(),
        report.added,
        report.skipped_duplicate,
        existing_len,
        merged.len()
    );
    Ok(report)
}

/// The full new file: the previous comment banner, [`CSV_HEADER`], then `rows`.
///
/// Columns of older layouts that are not part of [`CSV_HEADER`] are dropped.
fn render(path: &Path, previous: &[u8], rows: &[Observation]) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Vec::with_capacity(previous.len() + rows.len() * 96);
    for comment in leading_comments(previous) {
        buffer.extend_from_slice(comment.strip_suffix(b"\r").unwrap_or(comment));
        buffer.push(b'\n');
    }
    encode(path, &mut buffer, rows)?;
    Ok(buffer)
}

/// Writes `contents` to a synced temporary file next to `path`.
///
/// Dropping the returned file without persisting it removes it and leaves `path` as it was.
fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile, StoreError> {
    let io_error = |e: io::Error| StoreError::Io(path.to_path_buf(), e);
    let parent = ensure_parent_dir_exists(path).map_err(io_error)?;
    let mut staged = NamedTempFile::new_in(&parent).map_err(io_error)?;
    staged.write_all(contents).map_err(io_error)?;
    staged.as_file().sync_all().map_err(io_error)?;
    Ok(staged)
}

fn replace_atomically(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    stage(path, contents)?
        .persist(path)
        .map_err(|e| StoreError::Persist(path.to_path_buf(), e.error))?;
    Ok(())
}
