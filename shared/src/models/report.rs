//! Reporting periods

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::ParseEnumError;

/// Window used by the purchases report, anchored on a base date
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

impl ReportPeriod {
    /// Inclusive first and last calendar day of the window containing `base`.
    /// Weeks run Monday to Sunday.
    pub fn bounds(&self, base: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            ReportPeriod::Day => (base, base),
            ReportPeriod::Week => {
                let start = base - Duration::days(i64::from(base.weekday().num_days_from_monday()));
                (start, start + Duration::days(6))
            }
            ReportPeriod::Month => {
                let start = base.with_day(1).unwrap_or(base);
                let next = if start.month() == 12 {
                    NaiveDate::from_ymd_opt(start.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(start.year(), start.month() + 1, 1)
                };
                let end = next.and_then(|d| d.pred_opt()).unwrap_or(start);
                (start, end)
            }
            ReportPeriod::Year => {
                let start = base.with_ordinal(1).unwrap_or(base);
                let end = NaiveDate::from_ymd_opt(base.year(), 12, 31).unwrap_or(base);
                (start, end)
            }
        }
    }

    /// Human-readable period label returned alongside the total
    pub fn label(&self, base: NaiveDate) -> String {
        match self {
            ReportPeriod::Day => base.format("%Y-%m-%d").to_string(),
            ReportPeriod::Week => {
                let (start, end) = self.bounds(base);
                format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
            ReportPeriod::Month => base.format("%B %Y").to_string(),
            ReportPeriod::Year => base.year().to_string(),
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(ReportPeriod::Day),
            "week" => Ok(ReportPeriod::Week),
            "month" => Ok(ReportPeriod::Month),
            "year" => Ok(ReportPeriod::Year),
            other => Err(ParseEnumError::new("report period", other)),
        }
    }
}

/// Parse a `YYYY-MM-DD` report anchor; anything missing or malformed means `today`
pub fn parse_report_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(today)
}
