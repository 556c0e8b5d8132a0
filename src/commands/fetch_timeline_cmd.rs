use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use crate::commands::base_commands::Commands;
use crate::domain::repository::{RepositoryId, RepositoryIdError};
use crate::services::data_source::{DataSourceError, RecordSource};
use crate::services::github_api::GitHubApiClient;
use crate::services::github_config::{AuthData, ConfigError, GitHubConfig};
use crate::services::report_store::{ReportStoreError, write_report};
use crate::services::timeline_builder::{InvalidRecordPolicy, TimelineError, build_timeline};

#[derive(Error, Debug)]
pub enum FetchTimelineError {
    #[error(transparent)]
    Repository(#[from] RepositoryIdError),
    #[error("failed to load GitHub config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to fetch issues: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("failed to build timeline: {0}")]
    Timeline(#[from] TimelineError),
    #[error("failed to store timeline: {0}")]
    Store(#[from] ReportStoreError),
}

pub fn fetch_timeline_command(cmd: Commands) -> Result<(), FetchTimelineError> {
    if let Commands::FetchTimeline {
        repo,
        config,
        data_dir,
        skip_invalid,
    } = cmd
    {
        let repo: RepositoryId = repo.parse()?;
        let config = GitHubConfig::load(config.as_deref())?;
        let auth = AuthData::from_env();
        if auth.token.is_none() {
            log::warn!("GITHUB_TOKEN is not set, requests are unauthenticated");
        }
        let api_client = GitHubApiClient::new(config, auth)?;

        let policy = if skip_invalid {
            InvalidRecordPolicy::Skip
        } else {
            InvalidRecordPolicy::Abort
        };
        let path = fetch_and_store(&api_client, &repo, Path::new(&data_dir), policy)?;
        println!("Timeline for {repo} written to {}", path.display());
    }
    Ok(())
}

/// Fetches every record of `repo`, then builds and writes its timeline.
pub fn fetch_and_store(
    source: &dyn RecordSource,
    repo: &RepositoryId,
    data_dir: &Path,
    policy: InvalidRecordPolicy,
) -> Result<PathBuf, FetchTimelineError> {
    let records = source.fetch_records(repo)?;
    let timeline = build_timeline(&records, Utc::now(), policy)?;
    for warning in &timeline.warnings {
        log::warn!("{warning}");
    }
    if let (Some(first_day), Some(last_day)) = (timeline.report.first_day(), timeline.report.last_day()) {
        log::info!(
            "Built timeline of {} days for {repo} ({first_day} to {last_day})",
            timeline.report.timeline.len()
        );
    }
    Ok(write_report(data_dir, repo, &timeline.report)?)
}
