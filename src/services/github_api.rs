use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, LINK};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::record::IssueRecord;
use crate::domain::repository::RepositoryId;
use crate::services::data_source::{DataSourceError, RecordSource};
use crate::services::github_config::{AuthData, GitHubConfig};
use crate::services::rate_limit::{
    Sleeper, ThreadSleeper, classify_forbidden_body, classify_rate_limit,
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const GITHUB_JSON: &str = "application/vnd.github+json";

/// Issue as returned by the repository issues endpoint. Pull requests are
/// listed there too and carry a `pull_request` object.
#[derive(Debug, Deserialize)]
struct GitHubIssue {
    number: u64,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    pull_request: Option<Value>,
}

impl From<GitHubIssue> for IssueRecord {
    fn from(issue: GitHubIssue) -> Self {
        IssueRecord::new(issue.created_at, issue.closed_at, issue.pull_request.is_some())
            .with_number(issue.number)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub last: Option<String>,
}

/// One page of records with what the server said about the pages after it.
#[derive(Debug)]
pub struct Page {
    pub number: usize,
    pub last_page: Option<usize>,
    pub records: Vec<IssueRecord>,
}

pub struct GitHubApiClient {
    config: GitHubConfig,
    auth: AuthData,
    client: Client,
    sleeper: Box<dyn Sleeper>,
}

impl GitHubApiClient {
    pub fn new(config: GitHubConfig, auth: AuthData) -> Result<Self, DataSourceError> {
        Url::parse(&config.api_base_url)
            .map_err(|err| DataSourceError::Other(format!("invalid api_base_url: {err}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| DataSourceError::Connection(err.to_string()))?;

        Ok(Self {
            config,
            auth,
            client,
            sleeper: Box::new(ThreadSleeper),
        })
    }

    #[cfg(test)]
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Starts a fresh walk over every issue page of `repo`.
    pub fn pages(&self, repo: &RepositoryId) -> Result<IssuePages<'_>, DataSourceError> {
        let first_url = issues_url(&self.config, repo)?;
        Ok(IssuePages {
            client: self,
            next_url: Some(first_url),
            fetched: 0,
            last_page: None,
        })
    }

    fn fetch_page(&self, url: Url) -> Result<(Vec<IssueRecord>, PageLinks), DataSourceError> {
        let mut attempt = 0;
        loop {
            let mut request = self
                .client
                .get(url.clone())
                .header(ACCEPT, GITHUB_JSON)
                .header("X-GitHub-Api-Version", "2022-11-28");
            if let Some(token) = &self.auth.token {
                request = request.bearer_auth(token);
            }
            let response = request
                .send()
                .map_err(|err| DataSourceError::Connection(err.to_string()))?;

            let status = response.status();
            let header_limit = classify_rate_limit(status, response.headers());
            let kind = match header_limit {
                Some(kind) => kind,
                None if status == StatusCode::FORBIDDEN => {
                    let body = response.text().unwrap_or_default();
                    classify_forbidden_body(&body).ok_or(DataSourceError::Unauthorized)?
                }
                None => return read_page(status, response),
            };

            if attempt >= self.config.rate_limit.max_retries {
                return Err(DataSourceError::RateLimited(format!(
                    "still limited after {attempt} retries"
                )));
            }
            attempt += 1;
            let wait = self
                .config
                .rate_limit
                .wait_for(&kind, Utc::now(), &mut rand::thread_rng())
                .map_err(DataSourceError::RateLimited)?;
            log::warn!("Rate limit detected ({kind:?}), waiting {}s before retrying", wait.as_secs());
            self.sleeper.sleep(wait);
            log::info!("Rate limit wait completed, continuing...");
        }
    }
}

fn read_page(
    status: StatusCode,
    response: Response,
) -> Result<(Vec<IssueRecord>, PageLinks), DataSourceError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(DataSourceError::Unauthorized);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(DataSourceError::NotFound);
    }
    if !status.is_success() {
        return Err(DataSourceError::Connection(format!("unexpected status {status}")));
    }

    let links = response
        .headers()
        .get(LINK)
        .and_then(|value| value.to_str().ok())
        .map(parse_link_header)
        .unwrap_or_default();
    let issues: Vec<GitHubIssue> = response
        .json()
        .map_err(|err| DataSourceError::Parse(err.to_string()))?;

    Ok((issues.into_iter().map(IssueRecord::from).collect(), links))
}

impl RecordSource for GitHubApiClient {
    fn fetch_records(&self, repo: &RepositoryId) -> Result<Vec<IssueRecord>, DataSourceError> {
        let mut records = Vec::new();
        for page in self.pages(repo)? {
            let page = page?;
            match page.last_page {
                Some(last_page) => log::info!("Fetched page {} / {last_page}", page.number),
                None => log::info!("Fetched page {}", page.number),
            }
            records.extend(page.records);
        }
        log::info!("Fetched {} issues and pull requests of {repo}", records.len());
        Ok(records)
    }
}

/// Lazy sequence of issue pages. Iteration ends after the last page or
/// after the first error.
pub struct IssuePages<'a> {
    client: &'a GitHubApiClient,
    next_url: Option<Url>,
    fetched: usize,
    last_page: Option<usize>,
}

impl Iterator for IssuePages<'_> {
    type Item = Result<Page, DataSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let url = self.next_url.take()?;
        let (records, links) = match self.client.fetch_page(url) {
            Ok(page) => page,
            Err(err) => return Some(Err(err)),
        };

        self.fetched += 1;
        if let Some(last_page) = links.last.as_deref().and_then(page_number) {
            self.last_page = Some(last_page);
        }
        self.next_url = match links.next.as_deref().map(Url::parse).transpose() {
            Ok(url) => url,
            Err(err) => {
                return Some(Err(DataSourceError::Parse(format!("invalid next page link: {err}"))));
            }
        };

        Some(Ok(Page {
            number: self.fetched,
            last_page: self.last_page.or(self.next_url.is_none().then_some(self.fetched)),
            records,
        }))
    }
}

fn issues_url(config: &GitHubConfig, repo: &RepositoryId) -> Result<Url, DataSourceError> {
    let base = config.api_base_url.trim_end_matches('/');
    Url::parse_with_params(
        &format!("{base}/repos/{}/{}/issues", repo.org, repo.name),
        &[
            ("state", "all".to_string()),
            ("per_page", config.per_page.to_string()),
            ("page", "1".to_string()),
        ],
    )
    .map_err(|err| DataSourceError::Other(format!("invalid issues url: {err}")))
}

/// Parses an RFC 8288 `Link` header such as
/// `<https://api.github.com/...&page=2>; rel="next", <...&page=9>; rel="last"`.
pub fn parse_link_header(value: &str) -> PageLinks {
    let mut links = PageLinks::default();
    for entry in value.split(',') {
        let mut parts = entry.split(';');
        let Some(target) = parts.next().map(str::trim) else {
            continue;
        };
        let Some(target) = target.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
            continue;
        };
        for param in parts {
            match param.trim() {
                r#"rel="next""# => links.next = Some(target.to_string()),
                r#"rel="last""# => links.last = Some(target.to_string()),
                _ => {}
            }
        }
    }
    links
}

fn page_number(url: &str) -> Option<usize> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}
