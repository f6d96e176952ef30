//! Acute:Chronic Workload Ratio (ACWR) calculation
//!
//! # Sports Science Background
//!
//! ACWR compares recent training volume against longer-term volume to flag
//! overtraining and injury risk:
//!
//! - **Acute load**: average daily volume over the trailing 4 days, i.e.
//!   what the athlete has just done.
//! - **Chronic load**: average daily volume over the trailing 28 days,
//!   i.e. what the athlete is adapted to.
//! - **Ratio**: acute / chronic. The "sweet spot" in the literature is
//!   roughly 0.8-1.3; ratios above 1.5 correlate with elevated injury risk.
//!
//! Volume here is reps × weight summed across sets per calendar day. Days
//! with no logged sets are absent from the aggregate, so both averages are
//! over days-with-activity rather than calendar days.

use crate::models::CompletedSet;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Day-boundary policy for volume bucketing
///
/// The default buckets by UTC epoch-day (floor of epoch millis / 86,400,000).
/// For athletes far from UTC that shifts late-evening sets into the next
/// bucket; `FixedOffsetMinutes` buckets by a local calendar day instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayBucketing {
    /// UTC epoch-day boundaries
    Utc,
    /// Local calendar-day boundaries at a fixed UTC offset (minutes east)
    FixedOffsetMinutes(i32),
}

impl DayBucketing {
    /// Bucket index for a timestamp (days since the Unix epoch)
    pub fn bucket(&self, at: DateTime<Utc>) -> i64 {
        let millis = match self {
            DayBucketing::Utc => at.timestamp_millis(),
            DayBucketing::FixedOffsetMinutes(offset) => {
                at.timestamp_millis() + i64::from(*offset) * 60_000
            }
        };
        millis.div_euclid(MILLIS_PER_DAY)
    }

    /// Epoch-millisecond span `[start, end)` covered by a bucket
    pub fn bucket_range_ms(&self, bucket: i64) -> (i64, i64) {
        let shift = match self {
            DayBucketing::Utc => 0,
            DayBucketing::FixedOffsetMinutes(offset) => i64::from(*offset) * 60_000,
        };
        let start = bucket * MILLIS_PER_DAY - shift;
        (start, start + MILLIS_PER_DAY)
    }
}

impl Default for DayBucketing {
    fn default() -> Self {
        DayBucketing::Utc
    }
}

/// ACWR configuration with customizable windows
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcwrConfig {
    /// Acute window in days (default: 4)
    pub acute_window_days: u16,

    /// Chronic window in days (default: 28)
    pub chronic_window_days: u16,

    /// Day-boundary policy
    pub bucketing: DayBucketing,
}

impl Default for AcwrConfig {
    fn default() -> Self {
        AcwrConfig {
            acute_window_days: 4,
            chronic_window_days: 28,
            bucketing: DayBucketing::Utc,
        }
    }
}

/// Total training volume for a single day bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    /// Day bucket index (days since the Unix epoch)
    pub bucket: i64,

    /// Sum of reps × weight across all sets in the bucket
    pub total_volume: Decimal,

    /// Number of sets logged in the bucket
    pub set_count: u16,
}

/// ACWR metrics for a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrMetrics {
    /// Mean daily volume over the acute window (days with activity only)
    pub acute_load: Decimal,

    /// Mean daily volume over the chronic window (days with activity only)
    pub chronic_load: Decimal,

    /// Acute / chronic, or 0 when chronic load is 0
    pub ratio: Decimal,

    /// Load sub-score on the 0-100 scale
    pub load_score: u8,
}

/// Workload-trend interpretation ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadZone {
    /// No chronic load history (new athlete or long layoff)
    Fresh,
    /// Ratio above 1.5: acute load well beyond adaptation
    Spiking,
    /// Ratio 1.3-1.5: pushing past the adapted range
    Elevated,
    /// Ratio 1.1-1.3: progressive overload territory
    Building,
    /// Ratio 0.8-1.1: load matches adaptation
    Optimal,
    /// Ratio below 0.8: training below the adapted level
    Detraining,
}

impl LoadZone {
    /// Classify metrics into a workload zone
    pub fn from_metrics(metrics: &AcwrMetrics) -> Self {
        if metrics.chronic_load.is_zero() {
            return LoadZone::Fresh;
        }
        let ratio = metrics.ratio;
        if ratio > dec!(1.5) {
            LoadZone::Spiking
        } else if ratio > dec!(1.3) {
            LoadZone::Elevated
        } else if ratio > dec!(1.1) {
            LoadZone::Building
        } else if ratio >= dec!(0.8) {
            LoadZone::Optimal
        } else {
            LoadZone::Detraining
        }
    }

    /// Get zone description
    pub fn description(&self) -> &'static str {
        match self {
            LoadZone::Fresh => "No recent training history",
            LoadZone::Spiking => "Acute load spike (injury risk)",
            LoadZone::Elevated => "Load climbing faster than adaptation",
            LoadZone::Building => "Progressive overload",
            LoadZone::Optimal => "Load matches current adaptation",
            LoadZone::Detraining => "Training below adapted level",
        }
    }

    /// Get training recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            LoadZone::Fresh => "Start conservatively and build volume gradually",
            LoadZone::Spiking => "Cut volume sharply and prioritize recovery",
            LoadZone::Elevated => "Hold volume steady until adaptation catches up",
            LoadZone::Building => "Sustainable progression - keep monitoring",
            LoadZone::Optimal => "Good platform for quality sessions",
            LoadZone::Detraining => "Room to add volume or intensity",
        }
    }
}

/// Core ACWR calculation engine
pub struct AcwrCalculator {
    config: AcwrConfig,
}

impl AcwrCalculator {
    /// Create new calculator with default configuration
    pub fn new() -> Self {
        AcwrCalculator {
            config: AcwrConfig::default(),
        }
    }

    /// Create new calculator with custom configuration
    pub fn with_config(config: AcwrConfig) -> Self {
        AcwrCalculator { config }
    }

    pub fn config(&self) -> &AcwrConfig {
        &self.config
    }

    /// Aggregate per-day training volume from a collection of sets
    ///
    /// Days with no sets are absent from the map.
    pub fn aggregate_daily_volume(&self, sets: &[CompletedSet]) -> BTreeMap<i64, DailyVolume> {
        let mut daily: BTreeMap<i64, DailyVolume> = BTreeMap::new();

        for set in sets {
            let bucket = self.config.bucketing.bucket(set.completed_at);
            let volume = set.volume();

            daily
                .entry(bucket)
                .and_modify(|day| {
                    day.total_volume += volume;
                    day.set_count += 1;
                })
                .or_insert(DailyVolume {
                    bucket,
                    total_volume: volume,
                    set_count: 1,
                });
        }

        daily
    }

    /// Compute ACWR metrics as of `now` from aggregated daily volumes
    ///
    /// The chronic mean covers every bucket a trailing-28-day fetch can
    /// produce (a set exactly 28 days old lands one bucket beyond the
    /// window of full days); the acute mean covers the trailing 4 buckets.
    pub fn metrics_at(
        &self,
        daily: &BTreeMap<i64, DailyVolume>,
        now: DateTime<Utc>,
    ) -> AcwrMetrics {
        let today = self.config.bucketing.bucket(now);
        let chronic_from = today - i64::from(self.config.chronic_window_days);
        let acute_from = today - i64::from(self.config.acute_window_days) + 1;

        let chronic_load = Self::mean_volume(daily, chronic_from, today);
        let acute_load = Self::mean_volume(daily, acute_from, today);

        let ratio = if chronic_load.is_zero() {
            Decimal::ZERO
        } else {
            acute_load / chronic_load
        };

        let load_score = Self::load_score(chronic_load, ratio);

        AcwrMetrics {
            acute_load,
            chronic_load,
            ratio,
            load_score,
        }
    }

    /// Mean volume over buckets in [from, to], days-with-activity only
    fn mean_volume(daily: &BTreeMap<i64, DailyVolume>, from: i64, to: i64) -> Decimal {
        let mut total = Decimal::ZERO;
        let mut days = 0u32;

        for day in daily.range(from..=to).map(|(_, day)| day) {
            total += day.total_volume;
            days += 1;
        }

        if days == 0 {
            Decimal::ZERO
        } else {
            total / Decimal::from(days)
        }
    }

    /// Map chronic load and ratio to the discrete load sub-score
    ///
    /// Always one of {40, 60, 85, 90, 100}.
    pub fn load_score(chronic_load: Decimal, ratio: Decimal) -> u8 {
        if chronic_load.is_zero() {
            // No history: assume fresh, not fatigued
            return 100;
        }
        if ratio > dec!(1.5) {
            40
        } else if ratio > dec!(1.3) {
            60
        } else if ratio > dec!(1.1) {
            85
        } else if ratio >= dec!(0.8) {
            100
        } else {
            90
        }
    }
}

impl Default for AcwrCalculator {
    fn default() -> Self {
        Self::new()
    }
}
