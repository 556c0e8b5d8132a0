use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Truncates an instant to its calendar day in UTC.
pub fn to_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Utc).date_naive()
}

/// A single issue or pull request as delivered by a record source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub number: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub is_pull_request: bool,
}

impl IssueRecord {
    pub fn new<Tz: TimeZone>(
        created_at: DateTime<Tz>,
        closed_at: Option<DateTime<Tz>>,
        is_pull_request: bool,
    ) -> Self {
        Self {
            number: None,
            created_at: created_at.with_timezone(&Utc),
            closed_at: closed_at.map(|instant| instant.with_timezone(&Utc)),
            is_pull_request,
        }
    }

    pub fn with_number(mut self, number: u64) -> Self {
        self.number = Some(number);
        self
    }

    pub fn created_day(&self) -> NaiveDate {
        to_day(&self.created_at)
    }

    pub fn closed_day(&self) -> Option<NaiveDate> {
        self.closed_at.as_ref().map(to_day)
    }

    /// A record is well formed when it was not closed before it was created.
    pub fn is_valid(&self) -> bool {
        self.closed_at
            .is_none_or(|closed_at| closed_at >= self.created_at)
    }
}
