use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::repository::RepositoryId;
use crate::domain::timeline::Report;

#[derive(Error, Debug)]
pub enum ReportStoreError {
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write report {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub fn serialize_report_to_json<W: Write>(writer: &mut W, report: &Report) -> Result<(), ReportStoreError> {
    serde_json::to_writer_pretty(&mut *writer, report)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    Ok(())
}

pub fn deserialize_report_from_json_str(json: &str) -> Result<Report, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reports live at `<data_dir>/<org>/<name>.json`.
pub fn report_path(data_dir: &Path, repo: &RepositoryId) -> PathBuf {
    data_dir.join(&repo.org).join(format!("{}.json", repo.name))
}

pub fn write_report(data_dir: &Path, repo: &RepositoryId, report: &Report) -> Result<PathBuf, ReportStoreError> {
    let path = report_path(data_dir, repo);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ReportStoreError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut buffer = Vec::new();
    serialize_report_to_json(&mut buffer, report)?;
    std::fs::write(&path, buffer).map_err(|source| ReportStoreError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
