//! Line-oriented snapshot files
//!
//! Each entity type is stored as one JSON object per line in a fixed-name
//! file. A save replaces the whole file through a temporary file in the same
//! directory, so readers never observe a truncated snapshot.

use crate::domain::{Customer, Maintenance, Payment, Rental, Reservation, Vehicle};
use crate::error::{RentalError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Record type that can be written to and read back from a snapshot file.
pub trait SnapshotRecord: Serialize + DeserializeOwned {
    const FILE_NAME: &'static str;

    /// Re-applies construction rules to a loaded record.
    fn check(&self) -> Result<()>;
}

impl SnapshotRecord for Customer {
    const FILE_NAME: &'static str = "customers.jsonl";

    fn check(&self) -> Result<()> {
        self.validate()
    }
}

impl SnapshotRecord for Vehicle {
    const FILE_NAME: &'static str = "vehicles.jsonl";

    fn check(&self) -> Result<()> {
        self.validate()
    }
}

impl SnapshotRecord for Reservation {
    const FILE_NAME: &'static str = "reservations.jsonl";

    fn check(&self) -> Result<()> {
        self.validate()
    }
}

impl SnapshotRecord for Rental {
    const FILE_NAME: &'static str = "rentals.jsonl";

    fn check(&self) -> Result<()> {
        self.validate()
    }
}

impl SnapshotRecord for Payment {
    const FILE_NAME: &'static str = "payments.jsonl";

    fn check(&self) -> Result<()> {
        self.validate()
    }
}

impl SnapshotRecord for Maintenance {
    const FILE_NAME: &'static str = "maintenance.jsonl";

    fn check(&self) -> Result<()> {
        self.validate()
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for<T: SnapshotRecord>(&self) -> PathBuf {
        self.dir.join(T::FILE_NAME)
    }

    /// Replaces the snapshot for `T` with `records`.
    pub fn save<T: SnapshotRecord>(&self, records: &[T]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for::<T>();

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| RentalError::Io(e.error))?;

        debug!("Saved {} records to {}", records.len(), path.display());
        Ok(())
    }

    /// Loads the snapshot for `T`. A missing file is an empty snapshot.
    pub fn load<T: SnapshotRecord>(&self) -> Result<Vec<T>> {
        let path = self.path_for::<T>();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut records = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let snapshot_error = |reason: String| RentalError::Snapshot {
                file: T::FILE_NAME.to_string(),
                line: index + 1,
                reason,
            };

            let record: T = serde_json::from_str(&line).map_err(|e| snapshot_error(e.to_string()))?;
            record.check().map_err(|e| snapshot_error(e.to_string()))?;
            records.push(record);
        }

        debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(records)
    }
}
