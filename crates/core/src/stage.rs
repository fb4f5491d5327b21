// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed build stage order

use serde::{Deserialize, Serialize};
use std::fmt;

/// One ordered step of job execution.
///
/// Declaration order is execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Prepare,
    GetSources,
    RestoreCache,
    DownloadArtifacts,
    /// The job's own script
    Script,
    AfterScript,
    ArchiveCache,
    UploadArtifacts,
    Cleanup,
}

impl BuildStage {
    pub const ALL: [BuildStage; 9] = [
        BuildStage::Prepare,
        BuildStage::GetSources,
        BuildStage::RestoreCache,
        BuildStage::DownloadArtifacts,
        BuildStage::Script,
        BuildStage::AfterScript,
        BuildStage::ArchiveCache,
        BuildStage::UploadArtifacts,
        BuildStage::Cleanup,
    ];

    /// Stable name used in persisted records and logs
    pub fn name(self) -> &'static str {
        match self {
            BuildStage::Prepare => "prepare_script",
            BuildStage::GetSources => "get_sources",
            BuildStage::RestoreCache => "restore_cache",
            BuildStage::DownloadArtifacts => "download_artifacts",
            BuildStage::Script => "step_script",
            BuildStage::AfterScript => "after_script",
            BuildStage::ArchiveCache => "archive_cache",
            BuildStage::UploadArtifacts => "upload_artifacts_on_success",
            BuildStage::Cleanup => "cleanup_file_variables",
        }
    }

    /// Section header written to the trace when the stage starts
    pub fn description(self) -> &'static str {
        match self {
            BuildStage::Prepare => "Preparing environment",
            BuildStage::GetSources => "Getting source from repository",
            BuildStage::RestoreCache => "Restoring cache",
            BuildStage::DownloadArtifacts => "Downloading artifacts",
            BuildStage::Script => "Executing \"step_script\" stage of the job script",
            BuildStage::AfterScript => "Running after_script",
            BuildStage::ArchiveCache => "Saving cache",
            BuildStage::UploadArtifacts => "Uploading artifacts for successful job",
            BuildStage::Cleanup => "Cleaning up project directory and file based variables",
        }
    }

    /// Stages that still run once after an earlier stage failed
    pub fn runs_on_failure(self) -> bool {
        matches!(self, BuildStage::AfterScript | BuildStage::Cleanup)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
