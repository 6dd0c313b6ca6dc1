use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{PersistError, StoreError};
use crate::model::game::{GameKey, GameRecord};

/// The loaded schedule: every record plus an index on its natural key.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    records: Vec<GameRecord>,
    index: HashMap<GameKey, usize>,
}

impl Schedule {
    /// Build a schedule, rejecting collections where two records share a key.
    pub fn from_records(records: Vec<GameRecord>) -> Result<Self, StoreError> {
        let mut index: HashMap<GameKey, usize> = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            let key = record.key();
            if let Some(&first) = index.get(&key) {
                return Err(StoreError::DuplicateKey {
                    key,
                    first_id: records[first].id.clone(),
                    second_id: record.id.clone(),
                });
            }
            index.insert(key, pos);
        }
        Ok(Self { records, index })
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<GameRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_key(&self, key: &GameKey) -> Option<&GameRecord> {
        self.index.get(key).map(|&pos| &self.records[pos])
    }

    /// Apply remote scores to the record stored under `key`.
    ///
    /// Returns `None` when no record has that key, otherwise whether the record
    /// changed. Only score fields are reachable from here, so the key index
    /// stays valid.
    pub fn apply_scores(&mut self, key: &GameKey, home: Option<i64>, away: Option<i64>) -> Option<bool> {
        let pos = *self.index.get(key)?;
        Some(self.records[pos].apply_scores(home, away))
    }
}

/// Durable home of the schedule.
pub trait ScheduleStore {
    fn load(&self) -> Result<Schedule, StoreError>;

    /// Replace the stored schedule as a whole. Readers never see a partial write.
    fn persist(&mut self, schedule: &Schedule) -> Result<(), PersistError>;
}

/// `schedule.json` on local disk, as read by the calendar page.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "schedule.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ScheduleStore for JsonFileStore {
    #[instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Schedule, StoreError> {
        let body = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let records: Vec<GameRecord> = serde_json::from_str(&body).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        let schedule = Schedule::from_records(records)?;
        info!(games = schedule.len(), "Loaded local schedule");
        Ok(schedule)
    }

    #[instrument(level = "info", skip(self, schedule), fields(path = %self.path.display(), games = schedule.len()))]
    fn persist(&mut self, schedule: &Schedule) -> Result<(), PersistError> {
        let body = to_pretty_json(schedule.records())?;
        let temp_path = self.temp_path();

        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(&body)?;
            file.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(PersistError::Write { path: temp_path, source });
        }

        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(PersistError::Rename {
                path: self.path.clone(),
                source,
            });
        }
        info!("Saved schedule");
        Ok(())
    }
}

/// Four-space indented JSON with a trailing newline, matching the hand-edited file.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    Ok(out)
}
