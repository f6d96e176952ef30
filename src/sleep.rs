//! Sleep sub-score calculation
//!
//! The readiness blend treats prior-night sleep as a 0-100 sub-score scaled
//! against an 8-hour reference night. Absence of a reading is modeled with
//! `Option` at the provider boundary: a missing sample switches the scorer
//! to its reduced-input formula, it is never treated as zero sleep.

use crate::models::SleepSample;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference night length the sub-score is scaled against
pub const REFERENCE_SLEEP_HOURS: f64 = 8.0;

/// Sleep sub-score for a sample: clamp(round(hours / 8 × 100), 0, 100)
pub fn sleep_subscore(sample: &SleepSample) -> u8 {
    subscore_for_hours(sample.hours())
}

/// Sub-score for a fractional hour count, against the 8-hour reference
pub fn subscore_for_hours(hours: f64) -> u8 {
    let score = (hours / REFERENCE_SLEEP_HOURS * 100.0).round();
    score.clamp(0.0, 100.0) as u8
}

/// Display banding for a sleep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepStatus {
    /// 7+ hours
    Rested,
    /// 5-7 hours
    Short,
    /// Under 5 hours
    Deprived,
    /// No reading available
    NoReading,
}

impl SleepStatus {
    /// Band an optional sample into a display status
    pub fn from_sample(sample: Option<&SleepSample>) -> Self {
        match sample {
            None => SleepStatus::NoReading,
            Some(s) => {
                let hours = s.hours();
                if hours >= 7.0 {
                    SleepStatus::Rested
                } else if hours >= 5.0 {
                    SleepStatus::Short
                } else {
                    SleepStatus::Deprived
                }
            }
        }
    }
}

impl fmt::Display for SleepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepStatus::Rested => write!(f, "Rested"),
            SleepStatus::Short => write!(f, "Short"),
            SleepStatus::Deprived => write!(f, "Deprived"),
            SleepStatus::NoReading => write!(f, "No Reading"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(minutes: u32) -> SleepSample {
        SleepSample {
            sampled_at: Utc.with_ymd_and_hms(2025, 6, 4, 7, 0, 0).unwrap(),
            duration_minutes: minutes,
            source: None,
        }
    }

    #[test]
    fn test_eight_hours_is_100() {
        assert_eq!(sleep_subscore(&sample(480)), 100);
    }

    #[test]
    fn test_seven_hours_rounds_to_88() {
        // 7/8 × 100 = 87.5, rounds to 88
        assert_eq!(sleep_subscore(&sample(420)), 88);
    }

    #[test]
    fn test_oversleep_clamps_to_100() {
        assert_eq!(sleep_subscore(&sample(600)), 100); // 10 hours
    }

    #[test]
    fn test_short_sleep() {
        assert_eq!(sleep_subscore(&sample(240)), 50); // 4 hours
        assert_eq!(sleep_subscore(&sample(60)), 13); // 1 hour => 12.5, rounds up
    }

    #[test]
    fn test_status_banding() {
        assert_eq!(SleepStatus::from_sample(Some(&sample(450))), SleepStatus::Rested);
        assert_eq!(SleepStatus::from_sample(Some(&sample(420))), SleepStatus::Rested);
        assert_eq!(SleepStatus::from_sample(Some(&sample(360))), SleepStatus::Short);
        assert_eq!(SleepStatus::from_sample(Some(&sample(200))), SleepStatus::Deprived);
        assert_eq!(SleepStatus::from_sample(None), SleepStatus::NoReading);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", SleepStatus::Rested), "Rested");
        assert_eq!(format!("{}", SleepStatus::NoReading), "No Reading");
    }
}
