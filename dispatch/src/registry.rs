//! Run records derived from the trainer's log directory.
//!
//! The trainer writes each run into a directory whose name ends with
//! `_{motion}` and drops a final checkpoint file when training finishes.
//! The registry turns that naming convention into an explicit record per
//! motion; it only ever reads completion markers, never writes them.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Completion state of a motion, derived from its run directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// No run directory exists for this motion.
    Pending,
    /// Run directories exist but none contains the checkpoint.
    Incomplete,
    /// At least one run directory contains the final checkpoint.
    Completed,
}

/// Run directories recorded for a single motion.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub motion: String,
    /// Run directories containing the final checkpoint.
    pub completed: Vec<PathBuf>,
    /// Run directories without it (stale or currently training).
    pub incomplete: Vec<PathBuf>,
}

impl TaskRecord {
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        if !self.completed.is_empty() {
            TaskStatus::Completed
        } else if !self.incomplete.is_empty() {
            TaskStatus::Incomplete
        } else {
            TaskStatus::Pending
        }
    }
}

/// Read-only view over the trainer's log directory.
pub struct RunRegistry {
    logs_dir: PathBuf,
    checkpoint_file: String,
}

impl RunRegistry {
    /// Create a registry over `logs_dir`, using `checkpoint_file` as the
    /// completion marker name.
    #[must_use]
    pub fn new(logs_dir: impl Into<PathBuf>, checkpoint_file: impl Into<String>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            checkpoint_file: checkpoint_file.into(),
        }
    }

    /// Collect the run directories for a motion.
    ///
    /// A missing logs directory yields an empty record.
    #[must_use]
    pub fn record(&self, motion: &str) -> TaskRecord {
        let mut record = TaskRecord {
            motion: motion.to_string(),
            completed: Vec::new(),
            incomplete: Vec::new(),
        };

        let Ok(entries) = fs::read_dir(&self.logs_dir) else {
            return record;
        };

        let suffix = format!("_{motion}");
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(&suffix));
            if !matches {
                continue;
            }
            if path.join(&self.checkpoint_file).is_file() {
                record.completed.push(path);
            } else {
                record.incomplete.push(path);
            }
        }

        record
    }

    /// Whether any run directory for this motion holds the final checkpoint.
    #[must_use]
    pub fn is_completed(&self, motion: &str) -> bool {
        self.record(motion).status() == TaskStatus::Completed
    }

    /// Remove every incomplete run directory for a motion.
    ///
    /// Returns the deleted paths. Directories that are being written to by a
    /// concurrently running trainer are not protected against; callers decide
    /// when deletion is safe.
    pub fn delete_incomplete(&self, motion: &str) -> Result<Vec<PathBuf>, RegistryError> {
        let record = self.record(motion);
        for dir in &record.incomplete {
            fs::remove_dir_all(dir).map_err(|e| RegistryError::Delete(dir.clone(), e))?;
        }
        Ok(record.incomplete)
    }
}

/// Errors that can occur when mutating run directories.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to delete run directory {0}: {1}")]
    Delete(PathBuf, io::Error),
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    const MARKER: &str = "model_29999.pt";

    fn make_run_dir(logs_dir: &Path, name: &str, completed: bool) -> PathBuf {
        let dir = logs_dir.join(name);
        fs::create_dir_all(&dir).unwrap();
        if completed {
            fs::write(dir.join(MARKER), b"ckpt").unwrap();
        }
        dir
    }

    #[test]
    fn test_missing_logs_dir_is_empty() {
        let dir = tempdir().unwrap();
        let registry = RunRegistry::new(dir.path().join("absent"), MARKER);
        let record = registry.record("walk");
        assert_eq!(record.status(), TaskStatus::Pending);
        assert!(!registry.is_completed("walk"));
    }

    #[test]
    fn test_completed_marker_detected() {
        let dir = tempdir().unwrap();
        make_run_dir(dir.path(), "2024-01-01_12-00-00_walk", true);

        let registry = RunRegistry::new(dir.path(), MARKER);
        assert!(registry.is_completed("walk"));
        assert_eq!(registry.record("walk").status(), TaskStatus::Completed);
    }

    #[test]
    fn test_incomplete_without_marker() {
        let dir = tempdir().unwrap();
        make_run_dir(dir.path(), "2024-01-01_12-00-00_walk", false);

        let registry = RunRegistry::new(dir.path(), MARKER);
        assert!(!registry.is_completed("walk"));
        assert_eq!(registry.record("walk").status(), TaskStatus::Incomplete);
    }

    #[test]
    fn test_suffix_must_match_whole_motion() {
        let dir = tempdir().unwrap();
        make_run_dir(dir.path(), "2024-01-01_sidewalk", true);

        let registry = RunRegistry::new(dir.path(), MARKER);
        // "_walk" does not match "sidewalk"'s run directory
        assert!(!registry.is_completed("walk"));
        assert!(registry.is_completed("sidewalk"));
    }

    #[test]
    fn test_multiple_runs_mixed() {
        let dir = tempdir().unwrap();
        make_run_dir(dir.path(), "run1_jump", false);
        make_run_dir(dir.path(), "run2_jump", true);

        let registry = RunRegistry::new(dir.path(), MARKER);
        let record = registry.record("jump");
        assert_eq!(record.completed.len(), 1);
        assert_eq!(record.incomplete.len(), 1);
        assert_eq!(record.status(), TaskStatus::Completed);
    }

    #[test]
    fn test_delete_incomplete_keeps_completed() {
        let dir = tempdir().unwrap();
        let stale = make_run_dir(dir.path(), "run1_jump", false);
        let done = make_run_dir(dir.path(), "run2_jump", true);

        let registry = RunRegistry::new(dir.path(), MARKER);
        let deleted = registry.delete_incomplete("jump").unwrap();

        assert_eq!(deleted, vec![stale.clone()]);
        assert!(!stale.exists());
        assert!(done.exists());
    }

    #[test]
    fn test_delete_incomplete_nothing_to_do() {
        let dir = tempdir().unwrap();
        let registry = RunRegistry::new(dir.path(), MARKER);
        assert!(registry.delete_incomplete("walk").unwrap().is_empty());
    }
}
