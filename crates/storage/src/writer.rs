// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable file I/O behind a trait so crash ordering can be tested.

use crate::store::StoreError;
use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// File operations used by [`crate::FileJobStore`].
pub trait StoreWriter: Send + Sync + 'static {
    /// Write record bytes to a temporary file.
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StoreError>;

    /// Flush a file's contents to stable storage.
    fn fsync_file(&self, path: &Path) -> Result<(), StoreError>;

    /// Atomically replace `to` with `from`.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError>;

    /// Make a rename durable.
    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError>;

    /// Delete a file; a missing file is not an error.
    fn remove(&self, path: &Path) -> Result<(), StoreError>;
}

/// Real filesystem writer
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStoreWriter;

impl StoreWriter for FsStoreWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), StoreError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        std::fs::rename(from, to)?;
        Ok(())
    }

    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), StoreError> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
