//! Reporting period and export tests

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use shared::{parse_report_date, ReportPeriod};
use uuid::Uuid;
use vendorpulse_backend::services::reporting::{ReportingService, StockRow};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_default_period_is_month() {
        assert_eq!(ReportPeriod::default(), ReportPeriod::Month);
    }

    #[test]
    fn test_unknown_filter_type_is_rejected() {
        assert!("quarter".parse::<ReportPeriod>().is_err());
        assert!("Month".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_labels() {
        let base = date(2025, 3, 12);
        assert_eq!(ReportPeriod::Day.label(base), "2025-03-12");
        assert_eq!(ReportPeriod::Week.label(base), "2025-03-10 to 2025-03-16");
        assert_eq!(ReportPeriod::Month.label(base), "March 2025");
        assert_eq!(ReportPeriod::Year.label(base), "2025");
    }

    #[test]
    fn test_leap_february() {
        assert_eq!(
            ReportPeriod::Month.bounds(date(2024, 2, 10)),
            (date(2024, 2, 1), date(2024, 2, 29))
        );
    }

    #[test]
    fn test_bad_date_falls_back_to_today() {
        let today = date(2025, 6, 1);
        assert_eq!(parse_report_date(Some("2025-13-40"), today), today);
        assert_eq!(parse_report_date(Some("yesterday"), today), today);
        assert_eq!(parse_report_date(None, today), today);
        assert_eq!(parse_report_date(Some("2024-12-31"), today), date(2024, 12, 31));
    }

    #[test]
    fn test_stock_export_columns() {
        let rows = vec![
            StockRow {
                part_id: Uuid::from_u128(1),
                part_name: "Air filter".to_string(),
                current_stock: 12,
            },
            StockRow {
                part_id: Uuid::from_u128(2),
                part_name: "Spark plug".to_string(),
                current_stock: 3,
            },
        ];

        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "part_id,part_name,current_stock");
        assert!(lines[2].ends_with(",Spark plug,3"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn base_date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..365 * 30).prop_map(|offset| date(2000, 1, 1) + Duration::days(offset))
    }

    fn period_strategy() -> impl Strategy<Value = ReportPeriod> {
        prop_oneof![
            Just(ReportPeriod::Day),
            Just(ReportPeriod::Week),
            Just(ReportPeriod::Month),
            Just(ReportPeriod::Year),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_base_date_within_bounds(base in base_date_strategy(), period in period_strategy()) {
            let (start, end) = period.bounds(base);
            prop_assert!(start <= base && base <= end);
        }

        #[test]
        fn prop_week_runs_monday_to_sunday(base in base_date_strategy()) {
            let (start, end) = ReportPeriod::Week.bounds(base);
            prop_assert_eq!(start.weekday(), Weekday::Mon);
            prop_assert_eq!(end.weekday(), Weekday::Sun);
            prop_assert_eq!(end - start, Duration::days(6));
        }

        #[test]
        fn prop_month_covers_whole_month(base in base_date_strategy()) {
            let (start, end) = ReportPeriod::Month.bounds(base);
            prop_assert_eq!(start.day(), 1);
            prop_assert_eq!(start.month(), base.month());
            prop_assert_eq!(end.month(), base.month());
            prop_assert_ne!((end + Duration::days(1)).month(), base.month());
        }

        #[test]
        fn prop_year_covers_whole_year(base in base_date_strategy()) {
            let (start, end) = ReportPeriod::Year.bounds(base);
            prop_assert_eq!((start.month(), start.day()), (1, 1));
            prop_assert_eq!((end.month(), end.day()), (12, 31));
            prop_assert_eq!(start.year(), base.year());
        }
    }
}
