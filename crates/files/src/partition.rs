//! Date-based partitioning of the storage root.

use crate::clock::Clock;
use crate::constants::PARTITION_FORMAT;
use crate::FilesResult;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maps the current local date onto a `YYYY/MM/DD` directory under the storage root.
#[derive(Debug, Clone)]
pub struct DatePartitioner {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl DatePartitioner {
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    /// Partition for an arbitrary point in time.
    pub fn partition_for(at: DateTime<Local>) -> String {
        at.format(PARTITION_FORMAT).to_string()
    }

    /// Today's partition, e.g. `2024/03/05`.
    pub fn current_partition(&self) -> String {
        Self::partition_for(self.clock.now())
    }

    /// Creates today's partition directory if needed and returns its path.
    ///
    /// Safe to call on every upload.
    pub fn ensure_partition_dir(&self) -> FilesResult<PathBuf> {
        self.ensure_partition_dir_at(self.clock.now())
    }

    /// Creates the partition directory for `at` if needed and returns its path.
    pub fn ensure_partition_dir_at(&self, at: DateTime<Local>) -> FilesResult<PathBuf> {
        let dir = self.partition_dir(&Self::partition_for(at));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Absolute directory of `partition` (not created).
    pub fn partition_dir(&self, partition: &str) -> PathBuf {
        partition
            .split('/')
            .fold(self.root.clone(), |dir, part| dir.join(part))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn clock_at(y: i32, m: u32, d: u32) -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(y, m, d, 23, 59, 30).unwrap(),
        ))
    }

    #[test]
    fn test_current_partition_is_zero_padded() {
        let partitioner = DatePartitioner::new("storage", clock_at(2024, 3, 5));
        assert_eq!(partitioner.current_partition(), "2024/03/05");
    }

    #[test]
    fn test_partition_follows_the_clock() {
        let clock = clock_at(2023, 12, 31);
        let partitioner = DatePartitioner::new("storage", clock.clone());
        assert_eq!(partitioner.current_partition(), "2023/12/31");

        clock.advance(Duration::minutes(1));
        assert_eq!(partitioner.current_partition(), "2024/01/01");
    }

    #[test]
    fn test_ensure_partition_dir_creates_nested_directories() {
        let temp = TempDir::new().unwrap();
        let partitioner = DatePartitioner::new(temp.path(), clock_at(2024, 3, 5));

        let dir = partitioner.ensure_partition_dir().unwrap();

        assert_eq!(dir, temp.path().join("2024").join("03").join("05"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_ensure_partition_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let partitioner = DatePartitioner::new(temp.path(), clock_at(2024, 3, 5));

        let first = partitioner.ensure_partition_dir().unwrap();
        fs::write(first.join("keep.txt"), b"kept").unwrap();
        let second = partitioner.ensure_partition_dir().unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(second.join("keep.txt")).unwrap(), b"kept");
    }
}
