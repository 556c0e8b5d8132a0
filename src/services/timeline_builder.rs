use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::record::{IssueRecord, to_day};
use crate::domain::timeline::{DataPoint, Report};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimelineError {
    #[error("no records to build a timeline from")]
    EmptyInput,
    #[error("record {} was closed at {closed_at} before it was created at {created_at}", describe(.number))]
    InvalidRecord {
        number: Option<u64>,
        created_at: DateTime<Utc>,
        closed_at: DateTime<Utc>,
    },
}

/// Non-fatal findings reported alongside a successfully built timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineWarning {
    /// An instant lies after `now`; it was clamped to today.
    ClockSkew {
        number: Option<u64>,
        instant: DateTime<Utc>,
    },
    /// A record closed before its creation was dropped.
    SkippedInvalidRecord { number: Option<u64> },
}

impl fmt::Display for TimelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClockSkew { number, instant } => write!(
                f,
                "record {} has a timestamp in the future ({instant}), counted as today",
                describe(number)
            ),
            Self::SkippedInvalidRecord { number } => write!(
                f,
                "record {} was closed before it was created, skipped",
                describe(number)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidRecordPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    pub report: Report,
    pub warnings: Vec<TimelineWarning>,
}

struct OpenSpan {
    first_day: NaiveDate,
    last_day: NaiveDate,
    is_pull_request: bool,
}

/// Builds the daily open-count series for `records` up to and including the
/// UTC day of `now`.
///
/// `now` must be sampled once by the caller so every still-open record ends
/// on the same day.
pub fn build_timeline(
    records: &[IssueRecord],
    now: DateTime<Utc>,
    policy: InvalidRecordPolicy,
) -> Result<Timeline, TimelineError> {
    let today = to_day(&now);
    let mut warnings = Vec::new();
    let mut spans = Vec::with_capacity(records.len());

    for record in records {
        if !record.is_valid() {
            match policy {
                InvalidRecordPolicy::Abort => {
                    return Err(TimelineError::InvalidRecord {
                        number: record.number,
                        created_at: record.created_at,
                        closed_at: record.closed_at.unwrap_or(record.created_at),
                    });
                }
                InvalidRecordPolicy::Skip => {
                    warnings.push(TimelineWarning::SkippedInvalidRecord {
                        number: record.number,
                    });
                    continue;
                }
            }
        }

        let first_day = clamp_to_today(
            record.created_at,
            record.created_day(),
            now,
            record.number,
            &mut warnings,
        );
        let last_day = match (record.closed_at, record.closed_day()) {
            (Some(closed_at), Some(closed_day)) => {
                clamp_to_today(closed_at, closed_day, now, record.number, &mut warnings)
            }
            _ => today,
        };
        spans.push(OpenSpan {
            first_day,
            last_day,
            is_pull_request: record.is_pull_request,
        });
    }

    let oldest_day = spans
        .iter()
        .map(|span| span.first_day)
        .min()
        .ok_or(TimelineError::EmptyInput)?;

    let num_days = day_offset(oldest_day, today);
    let mut timeline: Vec<DataPoint> = (0..=num_days)
        .map(|offset| DataPoint::empty(oldest_day + chrono::Days::new(offset as u64)))
        .collect();

    for span in &spans {
        let start = day_offset(oldest_day, span.first_day);
        let end = day_offset(oldest_day, span.last_day);
        for point in &mut timeline[start..=end] {
            if span.is_pull_request {
                point.open_prs += 1;
            } else {
                point.open_issues += 1;
            }
        }
    }

    Ok(Timeline {
        report: Report { timeline },
        warnings,
    })
}

fn clamp_to_today(
    instant: DateTime<Utc>,
    day: NaiveDate,
    now: DateTime<Utc>,
    number: Option<u64>,
    warnings: &mut Vec<TimelineWarning>,
) -> NaiveDate {
    if instant > now {
        warnings.push(TimelineWarning::ClockSkew { number, instant });
        return to_day(&now);
    }
    day
}

/// Whole calendar days from `from` to `to`; `to` is never before `from` here.
fn day_offset(from: NaiveDate, to: NaiveDate) -> usize {
    usize::try_from((to - from).num_days()).unwrap_or(0)
}

fn describe(number: &Option<u64>) -> String {
    number.map_or_else(|| "<unnumbered>".to_string(), |number| format!("#{number}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, closed_issue, closed_pr, on_date, open_issue, open_pr};
    use chrono::{FixedOffset, TimeZone};

    fn open_issues(timeline: &Timeline) -> Vec<usize> {
        timeline.report.timeline.iter().map(|p| p.open_issues).collect()
    }

    fn open_prs(timeline: &Timeline) -> Vec<usize> {
        timeline.report.timeline.iter().map(|p| p.open_prs).collect()
    }

    #[test]
    fn closed_issue_counts_on_every_day_it_was_open() {
        let records = vec![closed_issue(at(2024, 1, 5, 9), at(2024, 1, 7, 18))];

        let timeline =
            build_timeline(&records, at(2024, 1, 10, 12), InvalidRecordPolicy::Abort).unwrap();

        let days: Vec<NaiveDate> = timeline.report.timeline.iter().map(|p| p.day).collect();
        assert_eq!(days.first(), Some(&on_date(2024, 1, 5)));
        assert_eq!(days.last(), Some(&on_date(2024, 1, 10)));
        assert_eq!(open_issues(&timeline), vec![1, 1, 1, 0, 0, 0]);
        assert_eq!(open_prs(&timeline), vec![0; 6]);
        assert!(timeline.report.timeline.iter().all(|p| p.closed_issues == 0 && p.closed_prs == 0));
        assert!(timeline.warnings.is_empty());
    }

    #[test]
    fn still_open_pr_runs_through_today() {
        let records = vec![open_pr(at(2024, 1, 1, 15))];

        let timeline =
            build_timeline(&records, at(2024, 1, 3, 1), InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(open_prs(&timeline), vec![1, 1, 1]);
        assert_eq!(open_issues(&timeline), vec![0, 0, 0]);
    }

    #[test]
    fn empty_input_is_rejected() {
        let result = build_timeline(&[], at(2024, 1, 3, 1), InvalidRecordPolicy::Abort);
        assert_eq!(result, Err(TimelineError::EmptyInput));
    }

    #[test]
    fn records_created_today_produce_a_single_day() {
        let records = vec![open_issue(at(2024, 2, 1, 1)), open_pr(at(2024, 2, 1, 2))];

        let timeline =
            build_timeline(&records, at(2024, 2, 1, 23), InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(timeline.report.timeline.len(), 1);
        assert_eq!(timeline.report.timeline[0].open_issues, 1);
        assert_eq!(timeline.report.timeline[0].open_prs, 1);
    }

    #[test]
    fn same_day_open_and_close_counts_once() {
        let records = vec![
            closed_issue(at(2024, 1, 1, 0), at(2024, 1, 8, 0)),
            closed_pr(at(2024, 1, 4, 8), at(2024, 1, 4, 20)),
        ];

        let timeline =
            build_timeline(&records, at(2024, 1, 8, 12), InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(open_prs(&timeline), vec![0, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn timeline_is_complete_and_consecutive() {
        let records = vec![
            closed_issue(at(2023, 12, 30, 10), at(2024, 1, 2, 10)),
            open_issue(at(2024, 2, 27, 10)),
            closed_pr(at(2024, 1, 15, 10), at(2024, 3, 1, 10)),
        ];
        let now = at(2024, 3, 2, 10);

        let timeline = build_timeline(&records, now, InvalidRecordPolicy::Abort).unwrap();

        let expected_len = (on_date(2024, 3, 2) - on_date(2023, 12, 30)).num_days() + 1;
        assert_eq!(timeline.report.timeline.len() as i64, expected_len);
        for pair in timeline.report.timeline.windows(2) {
            assert_eq!(pair[1].day, pair[0].day.succ_opt().unwrap());
        }
    }

    #[test]
    fn single_record_contributes_its_inclusive_length() {
        let records = vec![closed_pr(at(2024, 2, 27, 10), at(2024, 3, 2, 10))];

        let timeline =
            build_timeline(&records, at(2024, 3, 20, 10), InvalidRecordPolicy::Abort).unwrap();

        // 2024 is a leap year: Feb 27, 28, 29, Mar 1, 2
        let total: usize = open_prs(&timeline).iter().sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn input_order_does_not_matter() {
        let mut records = vec![
            open_issue(at(2024, 1, 3, 10)),
            closed_pr(at(2024, 1, 1, 10), at(2024, 1, 2, 10)),
            closed_issue(at(2024, 1, 2, 10), at(2024, 1, 4, 10)),
        ];
        let now = at(2024, 1, 5, 10);

        let forward = build_timeline(&records, now, InvalidRecordPolicy::Abort).unwrap();
        records.reverse();
        let backward = build_timeline(&records, now, InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(open_issues(&forward), vec![0, 1, 2, 2, 1]);
        assert_eq!(open_prs(&forward), vec![1, 1, 0, 0, 0]);
    }

    #[test]
    fn repeated_builds_serialize_identically() {
        let records = vec![
            open_issue(at(2024, 1, 3, 10)),
            closed_pr(at(2024, 1, 1, 10), at(2024, 1, 2, 10)),
        ];
        let now = at(2024, 1, 5, 10);

        let first = build_timeline(&records, now, InvalidRecordPolicy::Abort).unwrap();
        let second = build_timeline(&records, now, InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(
            serde_json::to_vec(&first.report).unwrap(),
            serde_json::to_vec(&second.report).unwrap()
        );
    }

    #[test]
    fn offsets_near_midnight_use_the_utc_day() {
        let los_angeles = FixedOffset::west_opt(8 * 3600).unwrap();
        // 2024-01-02 20:00 in Los Angeles is 2024-01-03 04:00 UTC
        let created = los_angeles.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap();
        let records = vec![
            IssueRecord::new(created, None, false),
            open_pr(at(2024, 1, 2, 12)),
        ];

        let timeline =
            build_timeline(&records, at(2024, 1, 4, 0), InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(open_issues(&timeline), vec![0, 1, 1]);
    }

    #[test]
    fn invalid_record_aborts_by_default() {
        let records = vec![
            open_issue(at(2024, 1, 1, 10)),
            closed_issue(at(2024, 1, 5, 10), at(2024, 1, 4, 10)).with_number(42),
        ];

        let error =
            build_timeline(&records, at(2024, 1, 6, 10), InvalidRecordPolicy::Abort).unwrap_err();

        assert_eq!(
            error,
            TimelineError::InvalidRecord {
                number: Some(42),
                created_at: at(2024, 1, 5, 10),
                closed_at: at(2024, 1, 4, 10),
            }
        );
        assert!(error.to_string().contains("#42"));
    }

    #[test]
    fn invalid_record_is_skipped_when_requested() {
        let records = vec![
            open_issue(at(2024, 1, 4, 10)),
            closed_issue(at(2024, 1, 5, 10), at(2024, 1, 1, 10)).with_number(7),
        ];

        let timeline =
            build_timeline(&records, at(2024, 1, 6, 10), InvalidRecordPolicy::Skip).unwrap();

        assert_eq!(open_issues(&timeline), vec![1, 1, 1]);
        assert_eq!(
            timeline.warnings,
            vec![TimelineWarning::SkippedInvalidRecord { number: Some(7) }]
        );
        assert_eq!(
            timeline.warnings[0].to_string(),
            "record #7 was closed before it was created, skipped"
        );
    }

    #[test]
    fn skipping_every_record_leaves_no_anchor() {
        let records = vec![closed_issue(at(2024, 1, 5, 10), at(2024, 1, 1, 10))];

        let result = build_timeline(&records, at(2024, 1, 6, 10), InvalidRecordPolicy::Skip);

        assert_eq!(result, Err(TimelineError::EmptyInput));
    }

    #[test]
    fn future_instants_are_clamped_to_today() {
        let records = vec![
            open_issue(at(2024, 1, 1, 10)),
            open_pr(at(2024, 1, 9, 10)).with_number(3),
            closed_issue(at(2024, 1, 2, 10), at(2024, 1, 12, 10)).with_number(4),
        ];

        let timeline =
            build_timeline(&records, at(2024, 1, 3, 10), InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(timeline.report.timeline.len(), 3);
        assert_eq!(open_prs(&timeline), vec![0, 0, 1]);
        assert_eq!(open_issues(&timeline), vec![1, 2, 2]);
        assert_eq!(
            timeline.warnings,
            vec![
                TimelineWarning::ClockSkew {
                    number: Some(3),
                    instant: at(2024, 1, 9, 10),
                },
                TimelineWarning::ClockSkew {
                    number: Some(4),
                    instant: at(2024, 1, 12, 10),
                },
            ]
        );
    }

    #[test]
    fn creation_later_today_stays_on_today_with_a_warning() {
        let records = vec![open_issue(at(2024, 1, 3, 11))];

        let timeline =
            build_timeline(&records, at(2024, 1, 3, 10), InvalidRecordPolicy::Abort).unwrap();

        assert_eq!(open_issues(&timeline), vec![1]);
        assert_eq!(timeline.warnings.len(), 1);
    }
}
