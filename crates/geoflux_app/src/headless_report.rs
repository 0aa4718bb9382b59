//! Report output model for headless scenario runs.

use anyhow::{bail, Result};
use geoflux_core::CameraState;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path};

/// Report status for a headless scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    Failed,
}

/// Counters collected while a scenario runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub elapsed_frames: u64,
    pub elapsed_ms: u64,
    /// Completion callbacks that ran
    pub completions: usize,
    /// Frames that ended with a pending redraw
    pub redraws: u64,
}

/// Machine-readable result of a headless scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessReport {
    pub status: ReportStatus,
    pub failed_step_index: Option<usize>,
    pub assertion: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub stats: RunStats,
    pub camera: CameraState,
}

impl HeadlessReport {
    pub fn passed(stats: RunStats, camera: CameraState) -> Self {
        Self {
            status: ReportStatus::Passed,
            failed_step_index: None,
            assertion: None,
            message: None,
            stats,
            camera,
        }
    }

    pub fn failed(
        assertion: &str,
        failed_step_index: usize,
        message: String,
        stats: RunStats,
        camera: CameraState,
    ) -> Self {
        Self {
            status: ReportStatus::Failed,
            failed_step_index: Some(failed_step_index),
            assertion: Some(assertion.to_string()),
            message: Some(message),
            stats,
            camera,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == ReportStatus::Passed
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if path.is_absolute() || path.has_root() {
            bail!("report path must be relative and must not start with a separator");
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("report path cannot contain '..' or drive prefixes");
        }
        let payload = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        writer.write_all(payload.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let stats = RunStats {
            elapsed_frames: 3,
            elapsed_ms: 48,
            completions: 1,
            redraws: 2,
        };
        let report = HeadlessReport::failed(
            "assert_camera",
            4,
            "zoom: expected 10, got 9.5".to_string(),
            stats,
            CameraState::default(),
        );
        let mut out = Vec::new();
        report.write_to_writer(&mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["failed_step_index"], 4);
        assert_eq!(value["elapsed_ms"], 48);
        assert_eq!(value["camera"]["zoom"], 10.0);
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let report = HeadlessReport::passed(RunStats::default(), CameraState::default());
        assert!(report.write_to_path(Path::new("/tmp/report.json")).is_err());
        assert!(report.write_to_path(Path::new("../report.json")).is_err());
    }
}
