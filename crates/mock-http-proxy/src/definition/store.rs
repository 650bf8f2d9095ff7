//! Directory-backed definition store.
//!
//! Nothing is cached: every scan lists the directory again and reads each
//! file on demand, so edits are visible on the next request.

use super::MockDefinition;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads mock definitions from a directory, one definition per file.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    dir: PathBuf,
}

impl DefinitionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start a scan of the directory.
    ///
    /// The listing is taken once, ordered by file name, and each file is read
    /// and decoded only when the iterator reaches it. An unreadable directory
    /// yields an empty scan.
    pub fn definitions(&self) -> Definitions {
        let files = match list_files(&self.dir) {
            Ok(files) => files,
            Err(err) => {
                debug!(
                    "Definitions directory {} unavailable: {}",
                    self.dir.display(),
                    err
                );
                Vec::new()
            }
        };

        Definitions {
            files: files.into_iter(),
        }
    }
}

/// Lazy sequence of the definitions in a store. Files that cannot be read or
/// decoded are skipped.
pub struct Definitions {
    files: std::vec::IntoIter<PathBuf>,
}

impl Iterator for Definitions {
    type Item = MockDefinition;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.files.by_ref() {
            match load_definition(&path) {
                Ok(definition) => return Some(definition),
                Err(err) => debug!("Skipping definition: {}", err),
            }
        }
        None
    }
}

/// Read and decode a single definition file.
pub fn load_definition(path: &Path) -> Result<MockDefinition, DefinitionError> {
    let contents = fs::read(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&contents).map_err(|source| DefinitionError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}
