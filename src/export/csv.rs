//! CSV export of set history and the daily ACWR series

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;

use crate::acwr::AcwrCalculator;
use crate::error::ImportExportError;
use crate::models::CompletedSet;

/// Export the trailing daily volume / ACWR series to CSV
///
/// One row per calendar day over the trailing `days`, oldest first. Days
/// without logged sets get zero volume; the load columns carry the metrics
/// as of the end of that day, so the file plots directly as a time series.
pub fn export_acwr_series<P: AsRef<Path>>(
    sets: &[CompletedSet],
    calculator: &AcwrCalculator,
    now: DateTime<Utc>,
    days: u16,
    output_path: P,
) -> Result<(), ImportExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Date,Volume,Sets,Acute_Load,Chronic_Load,Ratio,Load_Score"
    )?;

    let daily = calculator.aggregate_daily_volume(sets);
    let bucketing = calculator.config().bucketing;
    let today = bucketing.bucket(now);

    for bucket in (today - i64::from(days) + 1)..=today {
        let (volume, set_count) = daily
            .get(&bucket)
            .map(|d| (d.total_volume, d.set_count))
            .unwrap_or((Decimal::ZERO, 0));

        // Metrics as of the last instant of this bucket
        let (_, bucket_end_ms) = bucketing.bucket_range_ms(bucket);
        let as_of = DateTime::from_timestamp_millis(bucket_end_ms - 1).unwrap_or(now);
        let metrics = calculator.metrics_at(&daily, as_of);

        let (bucket_start_ms, _) = bucketing.bucket_range_ms(bucket);
        let date = DateTime::from_timestamp_millis(bucket_start_ms)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| bucket.to_string());

        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            date,
            volume,
            set_count,
            metrics.acute_load.round_dp(2),
            metrics.chronic_load.round_dp(2),
            metrics.ratio.round_dp(3),
            metrics.load_score,
        )?;
    }

    Ok(())
}

/// Export completed sets to CSV, oldest first
pub fn export_set_history<P: AsRef<Path>>(
    sets: &[CompletedSet],
    output_path: P,
) -> Result<(), ImportExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Timestamp,Exercise,Category,Reps,Weight,Volume,RPE,Notes,Source"
    )?;

    for set in sets {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{}",
            set.completed_at.format("%Y-%m-%dT%H:%M:%SZ"),
            quote(&set.exercise_name),
            set.exercise_category
                .map_or(String::new(), |c| c.to_string()),
            set.reps,
            set.weight,
            set.volume(),
            set.perceived_exertion
                .map_or(String::new(), |r| r.to_string()),
            set.notes.as_deref().map_or(String::new(), quote),
            set.source.as_deref().map_or(String::new(), quote),
        )?;
    }

    Ok(())
}

fn quote(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExerciseCategory;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn set_at(at: DateTime<Utc>, name: &str, reps: u16, weight: Decimal) -> CompletedSet {
        CompletedSet {
            id: format!("set_{}", at.timestamp_millis()),
            exercise_name: name.to_string(),
            exercise_category: Some(ExerciseCategory::Strength),
            completed_at: at,
            reps,
            weight,
            perceived_exertion: None,
            notes: None,
            source: None,
        }
    }

    #[test]
    fn test_acwr_series_export() {
        let now = Utc.with_ymd_and_hms(2025, 6, 28, 12, 0, 0).unwrap();
        let sets = vec![
            set_at(now - chrono::Duration::days(1), "Back Squat", 10, dec!(100)),
            set_at(now - chrono::Duration::days(3), "Deadlift", 5, dec!(140)),
        ];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acwr.csv");
        export_acwr_series(&sets, &AcwrCalculator::new(), now, 7, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 8); // header + 7 days
        assert!(lines[0].starts_with("Date,Volume,Sets"));
        assert!(lines[7].starts_with("2025-06-28,0,0")); // today, nothing logged
        assert!(lines[6].starts_with("2025-06-27,1000,1"));
    }

    #[test]
    fn test_set_history_export_quotes_fields() {
        let now = Utc.with_ymd_and_hms(2025, 6, 28, 17, 30, 0).unwrap();
        let mut set = set_at(now, "Squat, High Bar", 5, dec!(100));
        set.notes = Some("tough \"grinder\" rep".to_string());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sets.csv");
        export_set_history(&[set], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"Squat, High Bar\""));
        assert!(contents.contains("\"tough \"\"grinder\"\" rep\""));
        assert!(contents.contains("500")); // volume column
    }
}
