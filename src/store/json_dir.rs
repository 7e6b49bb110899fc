//! Directory of JSON files, one per stored result

use std::fs::{self, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use super::{generate_id, is_valid_id, GroupingStore, StoredGrouping, MAX_ID_ATTEMPTS};
use crate::pipeline::error::{GroupingError, Result};
use crate::pipeline::Grouping;

/// Stores each result as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Claim a fresh `<id>.json`; an existing file is never reopened.
    fn create_unique(&self) -> Result<(String, fs::File)> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_id(&mut rng);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.path_for(&id))
            {
                Ok(file) => return Ok((id, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(GroupingError::invalid("could not allocate a free result identifier"))
    }
}

impl GroupingStore for JsonDirStore {
    fn save(&self, data: &Grouping, group_count: usize, layers: &[String]) -> Result<StoredGrouping> {
        let (id, file) = self.create_unique()?;
        let record = StoredGrouping {
            id: id.clone(),
            data: data.clone(),
            group_count,
            layers: layers.join(","),
            created_at: Utc::now(),
        };

        serde_json::to_writer_pretty(BufWriter::new(file), &record)?;
        debug!(id = %id, path = %self.path_for(&id).display(), "stored grouping result");

        Ok(record)
    }

    fn load(&self, id: &str) -> Result<Option<StoredGrouping>> {
        if !is_valid_id(id) {
            return Ok(None);
        }
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(fs::File::open(&path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .filter(|id| is_valid_id(id))
            .collect();
        ids.sort();
        Ok(ids)
    }
}
