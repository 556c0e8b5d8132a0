use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::domain::record::IssueRecord;

pub fn on_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn open_issue(created_at: DateTime<Utc>) -> IssueRecord {
    IssueRecord::new(created_at, None, false)
}

pub fn closed_issue(created_at: DateTime<Utc>, closed_at: DateTime<Utc>) -> IssueRecord {
    IssueRecord::new(created_at, Some(closed_at), false)
}

pub fn open_pr(created_at: DateTime<Utc>) -> IssueRecord {
    IssueRecord::new(created_at, None, true)
}

pub fn closed_pr(created_at: DateTime<Utc>, closed_at: DateTime<Utc>) -> IssueRecord {
    IssueRecord::new(created_at, Some(closed_at), true)
}
