// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-file-per-job store.
//!
//! Each job lives in `<dir>/<job id>.state`. Updates write
//! `<job id>.state.tmp`, fsync it, rename it over the record and fsync the
//! directory, so a crash leaves either the old or the new record.
//! Unreadable records are moved aside to `.bak` and skipped.

use crate::policy::StoreConfig;
use crate::record;
use crate::store::{JobStore, StoreError};
use crate::writer::{FsStoreWriter, StoreWriter};
use rw_core::{Clock, Job, JobId, SystemClock};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const RECORD_EXT: &str = "state";
const MAX_BAK_FILES: u32 = 3;

pub struct FileJobStore<C: Clock = SystemClock, W: StoreWriter = FsStoreWriter> {
    dir: PathBuf,
    config: StoreConfig,
    clock: C,
    writer: W,
}

impl FileJobStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>, config: StoreConfig) -> Result<Self, StoreError> {
        Self::with_parts(dir, config, SystemClock, FsStoreWriter)
    }
}

impl<C: Clock, W: StoreWriter> FileJobStore<C, W> {
    pub fn with_parts(
        dir: impl Into<PathBuf>,
        config: StoreConfig,
        clock: C,
        writer: W,
    ) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            config,
            clock,
            writer,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn record_path(&self, id: &JobId) -> Result<PathBuf, StoreError> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
            && !id.as_str().starts_with('.');
        if !valid {
            return Err(StoreError::InvalidJobId(id.to_string()));
        }
        Ok(self.dir.join(format!("{id}.{RECORD_EXT}")))
    }

    fn tmp_path(path: &Path) -> PathBuf {
        path.with_extension(format!("{RECORD_EXT}.tmp"))
    }

    /// Record paths in name order.
    fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXT) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Read one record. Missing or corrupt records yield `None`.
    fn load(&self, path: &Path) -> Result<Option<Job>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match record::decode(&bytes) {
            Ok(record) => Ok(Some(record.job)),
            Err(e) => {
                let bak_path = rotate_bak_path(path);
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak_path.display(),
                    "unreadable job record, moving to .bak",
                );
                fs::rename(path, &bak_path)?;
                Ok(None)
            }
        }
    }
}

impl<C: Clock, W: StoreWriter> JobStore for FileJobStore<C, W> {
    fn request(&self) -> Result<Option<Job>, StoreError> {
        let now_ms = self.clock.epoch_ms();
        for path in self.record_paths()? {
            let Some(job) = self.load(&path)? else {
                continue;
            };
            if self.config.can_delete(&job, now_ms) {
                info!(job_id = %job.id(), state = %job.build_state(), "dropping finished or abandoned job record");
                self.remove(&job)?;
                continue;
            }
            if self.config.can_resume(&job, now_ms) {
                debug!(job_id = %job.id(), retries = job.state.retries, "found resumable job");
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    fn update(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.record_path(job.id())?;
        let tmp = Self::tmp_path(&path);
        let data = record::encode(job)?;
        self.writer.write_tmp(&tmp, &data)?;
        self.writer.fsync_file(&tmp)?;
        self.writer.rename(&tmp, &path)?;
        self.writer.fsync_dir(&self.dir)?;
        debug!(job_id = %job.id(), bytes = data.len(), "job record saved");
        Ok(())
    }

    fn remove(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.record_path(job.id())?;
        self.writer.remove(&Self::tmp_path(&path))?;
        self.writer.remove(&path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Job>, StoreError> {
        let mut jobs = Vec::new();
        for path in self.record_paths()? {
            if let Some(job) = self.load(&path)? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups per record.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
