// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Paylane

//! JSON-file backed storage.
//!
//! Each record is one JSON document written atomically (write to a temp file
//! in the same directory, then rename). Reads and keyed writes are the only
//! operations the repositories need; there is no query layer beyond listing
//! ids in a directory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage not initialized")]
    NotInitialized,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// File-backed storage rooted at the configured data directory.
pub struct Storage {
    paths: StoragePaths,
    initialized: bool,
}

impl Storage {
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Create the directory layout. Must be called before any read/write.
    pub fn initialize(&mut self) -> StorageResult<()> {
        fs::create_dir_all(self.paths.wallets_dir())?;
        fs::create_dir_all(self.paths.funding_dir())?;
        self.initialized = true;
        Ok(())
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    /// Read and deserialize a JSON document.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        self.check_initialized()?;
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.display().to_string())
            } else {
                StorageError::Io(err)
            }
        })?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialize and write a JSON document atomically.
    pub fn write_json<T: Serialize>(
        &self,
        path: impl AsRef<Path>,
        value: &T,
    ) -> StorageResult<()> {
        self.check_initialized()?;
        let path = path.as_ref();
        let tmp = tmp_path(path);
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// List the ids (file stems) of all documents in a directory.
    pub fn list_ids(&self, dir: impl AsRef<Path>) -> StorageResult<Vec<String>> {
        self.check_initialized()?;
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn check_initialized(&self) -> StorageResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(StorageError::NotInitialized)
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
