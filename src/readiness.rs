//! Readiness scoring
//!
//! Blends the ACWR load trend, prior-night sleep, and adherence bonuses
//! into a single 0-100 readiness score with a narrative band and severity
//! color. The score is computed on demand from injected data providers and
//! never persisted.
//!
//! # Formula
//!
//! With a sleep reading available:
//!
//! ```text
//! score = round(load × 0.5 + sleep × 0.4 + bonus)   clamped to [0, 100]
//! ```
//!
//! Without one, the blend degrades to the load sub-score plus bonuses.
//! A missing reading is excluded entirely rather than scored as zero.
//!
//! # Failure handling
//!
//! A failed biometric read is never surfaced: it is logged and coerced to
//! "no reading", switching the blend to the reduced formula. Training-log
//! reads propagate as crate errors.

use crate::acwr::{AcwrCalculator, AcwrConfig, AcwrMetrics};
use crate::error::Result;
use crate::models::{CompletedSet, SleepSample};
use crate::nutrition;
use crate::sleep;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Method label for the full blend
pub const METHOD_FULL: &str = "ACWR + Sleep + Bonus";

/// Method label for the reduced-input blend
pub const METHOD_NO_SLEEP: &str = "ACWR (No Sleep Data)";

/// Bonus points for mobility work completed yesterday
pub const MOBILITY_BONUS: u8 = 5;

/// Completed-set history reads
pub trait SetHistory {
    /// All sets completed at or after `since`
    fn completed_sets_since(&self, since: DateTime<Utc>) -> Result<Vec<CompletedSet>>;
}

/// Biometric sleep reads
pub trait SleepSource {
    /// Sleep duration for the trailing 24-hour window, if a reading exists
    fn trailing_sleep(&self) -> Result<Option<SleepSample>>;
}

/// Food-log and nutrition-plan reads
pub trait NutritionLog {
    /// Calories for each entry logged today
    fn calories_logged_today(&self, now: DateTime<Utc>) -> Result<Vec<u32>>;

    /// Calorie target of the active plan, if one exists and parses
    fn active_target_calories(&self) -> Result<Option<u32>>;
}

impl<T: SetHistory> SetHistory for Arc<T> {
    fn completed_sets_since(&self, since: DateTime<Utc>) -> Result<Vec<CompletedSet>> {
        (**self).completed_sets_since(since)
    }
}

impl<T: SleepSource> SleepSource for Arc<T> {
    fn trailing_sleep(&self) -> Result<Option<SleepSample>> {
        (**self).trailing_sleep()
    }
}

impl<T: NutritionLog> NutritionLog for Arc<T> {
    fn calories_logged_today(&self, now: DateTime<Utc>) -> Result<Vec<u32>> {
        (**self).calories_logged_today(now)
    }

    fn active_target_calories(&self) -> Result<Option<u32>> {
        (**self).active_target_calories()
    }
}

/// Scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// ACWR windows and day-bucketing policy
    pub acwr: AcwrConfig,

    /// Weight of the load sub-score in the full blend (default: 0.5)
    pub load_weight: f64,

    /// Weight of the sleep sub-score in the full blend (default: 0.4)
    pub sleep_weight: f64,

    /// Bonus for mobility work completed yesterday (default: 5)
    pub mobility_bonus: u8,

    /// Fallback daily calorie target when no active plan provides one
    pub default_target_calories: u32,

    /// Upper bound on the biometric sleep read, in milliseconds
    pub sleep_fetch_timeout_ms: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig {
            acwr: AcwrConfig::default(),
            load_weight: 0.5,
            sleep_weight: 0.4,
            mobility_bonus: MOBILITY_BONUS,
            default_target_calories: nutrition::DEFAULT_TARGET_CALORIES,
            sleep_fetch_timeout_ms: 2_000,
        }
    }
}

/// Narrative readiness bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessBand {
    /// Score 85+
    PeakPerformance,
    /// Score 70-84
    ReadyToTrain,
    /// Score 50-69
    ModerateFatigue,
    /// Score 30-49
    HighStrain,
    /// Score below 30
    RecoveryNeeded,
}

impl ReadinessBand {
    /// Band a final score
    pub fn from_score(score: u8) -> Self {
        if score >= 85 {
            ReadinessBand::PeakPerformance
        } else if score >= 70 {
            ReadinessBand::ReadyToTrain
        } else if score >= 50 {
            ReadinessBand::ModerateFatigue
        } else if score >= 30 {
            ReadinessBand::HighStrain
        } else {
            ReadinessBand::RecoveryNeeded
        }
    }

    /// Display title for the band
    pub fn title(&self) -> &'static str {
        match self {
            ReadinessBand::PeakPerformance => "Peak Performance",
            ReadinessBand::ReadyToTrain => "Ready to Train",
            ReadinessBand::ModerateFatigue => "Moderate Fatigue",
            ReadinessBand::HighStrain => "High Strain",
            ReadinessBand::RecoveryNeeded => "Recovery Needed",
        }
    }

    /// Narrative description, interpolating the planned session label
    pub fn description(&self, planned_session: Option<&str>) -> String {
        let session = planned_session.unwrap_or("today's session");
        match self {
            ReadinessBand::PeakPerformance => {
                format!("Recovery is on your side. {} is a good day to push intensity.", session)
            }
            ReadinessBand::ReadyToTrain => {
                format!("Solid platform for {}. Train as planned.", session)
            }
            ReadinessBand::ModerateFatigue => {
                format!("Carrying some fatigue. Consider trimming volume for {}.", session)
            }
            ReadinessBand::HighStrain => {
                format!("Strain is building. Keep {} light and technical.", session)
            }
            ReadinessBand::RecoveryNeeded => {
                format!("Run down. Swap {} for rest or easy mobility work.", session)
            }
        }
    }
}

impl fmt::Display for ReadinessBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Severity color tier
///
/// Cut points differ from the narrative bands on purpose: a score of 82 is
/// "Ready to Train" but already green, and 45 is "High Strain" but red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessColor {
    /// Score 80+
    Green,
    /// Score 50-79
    Yellow,
    /// Score below 50
    Red,
}

impl ReadinessColor {
    /// Color for a final score
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ReadinessColor::Green
        } else if score >= 50 {
            ReadinessColor::Yellow
        } else {
            ReadinessColor::Red
        }
    }
}

impl fmt::Display for ReadinessColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessColor::Green => write!(f, "Green"),
            ReadinessColor::Yellow => write!(f, "Yellow"),
            ReadinessColor::Red => write!(f, "Red"),
        }
    }
}

/// Complete readiness assessment for a day
///
/// Ephemeral: computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessResult {
    /// Final readiness score, always in [0, 100]
    pub score: u8,

    /// Narrative band for the score
    pub band: ReadinessBand,

    /// Band title
    pub title: String,

    /// Narrative description, interpolating the planned session
    pub description: String,

    /// Severity color tier
    pub color: ReadinessColor,

    /// Which blend produced the score
    pub method: String,

    /// Load sub-score from the ACWR trend
    pub load_score: u8,

    /// Sleep sub-score, absent when no reading was available
    pub sleep_score: Option<u8>,

    /// Total additive bonus applied
    pub bonus: u8,

    /// Underlying workload metrics
    pub acwr: AcwrMetrics,
}

/// Readiness scoring engine over injected providers
pub struct ReadinessScorer<H, S, N> {
    history: H,
    sleep: S,
    nutrition: N,
    config: ScorerConfig,
}

impl<H, S, N> ReadinessScorer<H, S, N>
where
    H: SetHistory,
    S: SleepSource,
    N: NutritionLog,
{
    /// Create a scorer with default configuration
    pub fn new(history: H, sleep: S, nutrition: N) -> Self {
        Self::with_config(history, sleep, nutrition, ScorerConfig::default())
    }

    /// Create a scorer with custom configuration
    pub fn with_config(history: H, sleep: S, nutrition: N, config: ScorerConfig) -> Self {
        ReadinessScorer {
            history,
            sleep,
            nutrition,
            config,
        }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Compute readiness for now
    pub fn score(&self, planned_session: Option<&str>) -> Result<ReadinessResult> {
        self.score_at(Utc::now(), planned_session)
    }

    /// Compute readiness as of a given instant
    pub fn score_at(
        &self,
        now: DateTime<Utc>,
        planned_session: Option<&str>,
    ) -> Result<ReadinessResult> {
        let calculator = AcwrCalculator::with_config(self.config.acwr);

        let since = now - Duration::days(i64::from(self.config.acwr.chronic_window_days));
        let sets = self.history.completed_sets_since(since)?;
        let daily = calculator.aggregate_daily_volume(&sets);
        let acwr = calculator.metrics_at(&daily, now);

        let sleep_sample = self.fetch_sleep();
        let sleep_score = sleep_sample.as_ref().map(sleep::sleep_subscore);

        let bonus = self.bonus(&sets, now)?;

        let load = f64::from(acwr.load_score);
        let (unclamped, method) = match sleep_score {
            Some(s) => (
                load * self.config.load_weight
                    + f64::from(s) * self.config.sleep_weight
                    + f64::from(bonus),
                METHOD_FULL,
            ),
            None => (load + f64::from(bonus), METHOD_NO_SLEEP),
        };
        let score = unclamped.round().clamp(0.0, 100.0) as u8;

        let band = ReadinessBand::from_score(score);
        let color = ReadinessColor::from_score(score);

        tracing::debug!(
            score,
            load_score = acwr.load_score,
            ?sleep_score,
            bonus,
            method,
            "readiness computed"
        );

        Ok(ReadinessResult {
            score,
            band,
            title: band.title().to_string(),
            description: band.description(planned_session),
            color,
            method: method.to_string(),
            load_score: acwr.load_score,
            sleep_score,
            bonus,
            acwr,
        })
    }

    /// Fetch the trailing sleep reading, coercing failures to "no reading"
    ///
    /// A zero-minute reading is also treated as missing: upstream providers
    /// report errors and absent data as a zero duration.
    fn fetch_sleep(&self) -> Option<SleepSample> {
        match self.sleep.trailing_sleep() {
            Ok(sample) => sample.filter(|s| s.duration_minutes > 0),
            Err(e) => {
                tracing::warn!(error = %e, "sleep read failed; scoring without sleep data");
                None
            }
        }
    }

    /// Additive bonuses: nutrition adherence plus yesterday's mobility work
    fn bonus(&self, sets: &[CompletedSet], now: DateTime<Utc>) -> Result<u8> {
        let logged = self.nutrition.calories_logged_today(now)?;
        let target = self
            .nutrition
            .active_target_calories()?
            .or(Some(self.config.default_target_calories));
        let mut bonus = nutrition::adherence_bonus(&logged, target);

        let yesterday = self.config.acwr.bucketing.bucket(now) - 1;
        let mobility_yesterday = sets.iter().any(|set| {
            self.config.acwr.bucketing.bucket(set.completed_at) == yesterday && set.is_mobility()
        });
        if mobility_yesterday {
            bonus += self.config.mobility_bonus;
        }

        Ok(bonus)
    }
}

/// Timeout decorator for a sleep source
///
/// Performs the read on a worker thread and waits at most `timeout`; a
/// read that overruns is abandoned and reported as "no reading", so the
/// scorer degrades to its reduced formula instead of hanging on a slow
/// biometric provider.
pub struct BoundedSleepSource<S> {
    inner: Arc<S>,
    timeout: std::time::Duration,
}

impl<S> BoundedSleepSource<S>
where
    S: SleepSource + Send + Sync + 'static,
{
    pub fn new(inner: S, timeout: std::time::Duration) -> Self {
        BoundedSleepSource {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<S> SleepSource for BoundedSleepSource<S>
where
    S: SleepSource + Send + Sync + 'static,
{
    fn trailing_sleep(&self) -> Result<Option<SleepSample>> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let _ = tx.send(inner.trailing_sleep());
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "sleep read timed out; treating as no reading"
                );
                Ok(None)
            }
        }
    }
}
