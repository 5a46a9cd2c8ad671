//! Motion task discovery, filtering, and distributed splitting.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::registry::{RegistryError, RunRegistry};

/// File extension of candidate motion files.
pub const MOTION_EXT: &str = "npz";

/// List every motion name in `root_dir`, sorted.
///
/// A motion name is the stem of a `.npz` file in the top level of the
/// directory. A missing directory yields an empty list.
pub fn list_motions(root_dir: &Path) -> Result<Vec<String>, DiscoveryError> {
    let entries = match fs::read_dir(root_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("motion directory {} does not exist", root_dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(DiscoveryError::Io(root_dir.to_path_buf(), e)),
    };

    let mut motions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DiscoveryError::Io(root_dir.to_path_buf(), e))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(MOTION_EXT) {
            continue;
        }
        let Some(motion) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        motions.push(motion.to_string());
    }

    motions.sort();
    Ok(motions)
}

/// Discover pending tasks: every motion in `root_dir` without a completion
/// marker, sorted.
///
/// With `delete_incomplete` set, stale run directories of the returned
/// motions are removed before they are re-queued.
pub fn discover_tasks(
    root_dir: &Path,
    registry: &RunRegistry,
    delete_incomplete: bool,
) -> Result<Vec<String>, DiscoveryError> {
    let mut tasks = Vec::new();
    for motion in list_motions(root_dir)? {
        if registry.is_completed(&motion) {
            continue;
        }
        if delete_incomplete {
            for dir in registry.delete_incomplete(&motion)? {
                tracing::info!("deleted incomplete run: {}", dir.display());
            }
        }
        tasks.push(motion);
    }
    Ok(tasks)
}

/// Proportional slice bounds for one machine: `[len*split/n, len*(split+1)/n)`.
///
/// Adjacent splits tile `[0, len)` exactly; only rounding decides where the
/// boundaries fall.
pub fn slice_bounds(
    len: usize,
    num_workers: usize,
    worker_split: usize,
) -> Result<(usize, usize), DiscoveryError> {
    if num_workers == 0 || worker_split >= num_workers {
        return Err(DiscoveryError::InvalidSplit {
            worker_split,
            num_workers,
        });
    }
    let start = len * worker_split / num_workers;
    let end = len * (worker_split + 1) / num_workers;
    Ok((start, end))
}

/// Keep only this machine's share of the sorted task list.
pub fn split_tasks(
    tasks: Vec<String>,
    num_workers: usize,
    worker_split: usize,
) -> Result<Vec<String>, DiscoveryError> {
    let (start, end) = slice_bounds(tasks.len(), num_workers, worker_split)?;
    Ok(tasks[start..end].to_vec())
}

/// Errors that can occur during task discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to read motion directory {0}: {1}")]
    Io(PathBuf, io::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("worker_split {worker_split} is out of range for num_workers {num_workers}")]
    InvalidSplit {
        worker_split: usize,
        num_workers: usize,
    },
}
