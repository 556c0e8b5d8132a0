use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Open and closed counts for one calendar day.
///
/// The closed counters are part of the document format but are never
/// populated; they stay zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(with = "day_format")]
    pub day: NaiveDate,
    pub open_issues: usize,
    #[serde(default)]
    pub closed_issues: usize,
    pub open_prs: usize,
    #[serde(rename = "closed:prs", alias = "closed_prs", default)]
    pub closed_prs: usize,
}

impl DataPoint {
    pub fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            open_issues: 0,
            closed_issues: 0,
            open_prs: 0,
            closed_prs: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub timeline: Vec<DataPoint>,
}

impl Report {
    pub fn first_day(&self) -> Option<NaiveDate> {
        self.timeline.first().map(|point| point.day)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.timeline.last().map(|point| point.day)
    }
}

/// Days are written as midnight UTC timestamps (`2024-01-05T00:00:00Z`),
/// which is what earlier reports and the web viewer use. Plain dates are
/// accepted when reading.
mod day_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const MIDNIGHT_FORMAT: &str = "%Y-%m-%dT00:00:00Z";

    pub fn serialize<S: Serializer>(day: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&day.format(MIDNIGHT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(&text)
            .map(|instant| instant.naive_utc().date())
            .map_err(|_| serde::de::Error::custom(format!("invalid day: {text}")))
    }
}
