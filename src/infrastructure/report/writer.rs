use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::ReportError;
use crate::domain::evaluation::EvaluationReport;

static RUN_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("valid run name regex"));

/// Check a run name is usable as a file name component
pub fn validate_run_name(name: &str) -> Result<(), ReportError> {
    if RUN_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ReportError::InvalidRunName {
            name: name.to_string(),
        })
    }
}

/// Persists report artifacts under a results directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    results_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// `<results_dir>/report_<run_name>.json`
    pub fn report_path(&self, run_name: &str) -> Result<PathBuf, ReportError> {
        validate_run_name(run_name)?;
        Ok(self.results_dir.join(format!("report_{}.json", run_name)))
    }

    /// `<results_dir>/metrics_<run_name>.prom`
    pub fn metrics_path(&self, run_name: &str) -> Result<PathBuf, ReportError> {
        validate_run_name(run_name)?;
        Ok(self.results_dir.join(format!("metrics_{}.prom", run_name)))
    }

    /// Write the report; an existing report with the same run name is replaced
    pub async fn write(&self, report: &EvaluationReport) -> Result<PathBuf, ReportError> {
        let path = self.report_path(&report.run_name)?;
        let data = serde_json::to_vec_pretty(report)?;

        self.write_atomic(&path, &data).await?;

        info!(
            path = %path.display(),
            rqi = ?report.rqi.rqi,
            grade = %report.rqi.grade,
            "Report written"
        );

        Ok(path)
    }

    /// Write a Prometheus text snapshot next to the report
    pub async fn write_metrics(&self, run_name: &str, rendered: &str) -> Result<PathBuf, ReportError> {
        let path = self.metrics_path(run_name)?;
        self.write_atomic(&path, rendered.as_bytes()).await?;
        Ok(path)
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), ReportError> {
        let write_err = |source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        };

        tokio::fs::create_dir_all(&self.results_dir)
            .await
            .map_err(write_err)?;

        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, data).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

        Ok(())
    }
}

/// Read a report artifact back
pub async fn load_report(path: impl AsRef<Path>) -> Result<EvaluationReport, ReportError> {
    let path = path.as_ref();

    let data = tokio::fs::read(path).await.map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&data).map_err(|source| ReportError::Format {
        path: path.to_path_buf(),
        source,
    })
}
