use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Exercise categories used to classify logged sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseCategory {
    Strength,
    Hypertrophy,
    Conditioning,
    Mobility,
    Cardio,
    Other,
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseCategory::Strength => write!(f, "Strength"),
            ExerciseCategory::Hypertrophy => write!(f, "Hypertrophy"),
            ExerciseCategory::Conditioning => write!(f, "Conditioning"),
            ExerciseCategory::Mobility => write!(f, "Mobility"),
            ExerciseCategory::Cardio => write!(f, "Cardio"),
            ExerciseCategory::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for ExerciseCategory {
    type Err = std::convert::Infallible;

    /// Case-insensitive parse; unknown categories map to `Other`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "strength" => ExerciseCategory::Strength,
            "hypertrophy" => ExerciseCategory::Hypertrophy,
            "conditioning" => ExerciseCategory::Conditioning,
            "mobility" => ExerciseCategory::Mobility,
            "cardio" => ExerciseCategory::Cardio,
            _ => ExerciseCategory::Other,
        })
    }
}

/// A single completed strength set
///
/// The atomic unit of training history: one set of one exercise with its
/// rep count, load, and optional perceived exertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSet {
    /// Unique identifier for the set
    pub id: String,

    /// Exercise name as logged (e.g. "Back Squat", "Couch Stretch")
    pub exercise_name: String,

    /// Exercise category, if the log recorded one
    pub exercise_category: Option<ExerciseCategory>,

    /// Completion timestamp
    pub completed_at: DateTime<Utc>,

    /// Repetitions performed
    pub reps: u16,

    /// Load in kilograms (0 for bodyweight work)
    pub weight: Decimal,

    /// Rate of perceived exertion, 1-10 scale
    pub perceived_exertion: Option<Decimal>,

    /// Optional notes
    pub notes: Option<String>,

    /// Original source identifier (import file, sync provider)
    pub source: Option<String>,
}

impl CompletedSet {
    /// Training volume contributed by this set: reps × weight
    pub fn volume(&self) -> Decimal {
        Decimal::from(self.reps) * self.weight
    }

    /// Whether this set is mobility / recovery work
    ///
    /// True when the exercise name contains "stretch" or "yoga"
    /// (case-insensitive) or the category is `Mobility`.
    pub fn is_mobility(&self) -> bool {
        if self.exercise_category == Some(ExerciseCategory::Mobility) {
            return true;
        }
        let name = self.exercise_name.to_lowercase();
        name.contains("stretch") || name.contains("yoga")
    }

    /// Stable content hash used for duplicate detection
    ///
    /// Covers the fields that identify a set independently of how it was
    /// logged: timestamp, normalized exercise name, reps, and weight.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.completed_at.timestamp_millis().to_le_bytes());
        hasher.update(self.exercise_name.trim().to_lowercase().as_bytes());
        hasher.update(self.reps.to_le_bytes());
        hasher.update(self.weight.normalize().to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A sleep duration reading from a biometric source
///
/// A provider hands back `Option<SleepSample>`: `None` means "no reading",
/// which is distinct from a recorded duration of zero minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSample {
    /// When the reading was taken
    pub sampled_at: DateTime<Utc>,

    /// Total minutes asleep in the trailing window
    pub duration_minutes: u32,

    /// Device or provider the reading came from
    pub source: Option<String>,
}

impl SleepSample {
    /// Sleep duration in fractional hours
    pub fn hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }
}

/// A food-log entry carrying its calorie total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLogEntry {
    /// Unique identifier for the entry
    pub id: String,

    /// When the food was logged
    pub logged_at: DateTime<Utc>,

    /// Total calories for the entry
    pub calories: u32,

    /// Optional description ("post-workout shake")
    pub description: Option<String>,
}

/// A stored nutrition plan
///
/// The calorie target is carried as free text exactly as stored; plans
/// synced from outside may hold values that do not parse as integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionPlan {
    /// Unique identifier for the plan
    pub id: String,

    /// Plan name ("Off-season bulk")
    pub name: String,

    /// Target daily calories, as stored
    pub target_daily_calories: Option<String>,

    /// Whether this is the active plan
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl NutritionPlan {
    /// Parse the stored calorie target, if present and well-formed
    pub fn parsed_target_calories(&self) -> Option<u32> {
        self.target_daily_calories
            .as_deref()
            .and_then(|t| t.trim().parse::<u32>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn sample_set(name: &str, category: Option<ExerciseCategory>) -> CompletedSet {
        CompletedSet {
            id: "set_1".to_string(),
            exercise_name: name.to_string(),
            exercise_category: category,
            completed_at: Utc.with_ymd_and_hms(2025, 6, 3, 17, 30, 0).unwrap(),
            reps: 5,
            weight: dec!(100),
            perceived_exertion: Some(dec!(8)),
            notes: None,
            source: None,
        }
    }

    #[test]
    fn test_volume() {
        let set = sample_set("Back Squat", Some(ExerciseCategory::Strength));
        assert_eq!(set.volume(), dec!(500));

        let bodyweight = CompletedSet {
            weight: dec!(0),
            ..sample_set("Push Up", None)
        };
        assert_eq!(bodyweight.volume(), dec!(0));
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "mobility".parse::<ExerciseCategory>().unwrap(),
            ExerciseCategory::Mobility
        );
        assert_eq!(
            "MOBILITY".parse::<ExerciseCategory>().unwrap(),
            ExerciseCategory::Mobility
        );
        assert_eq!(
            "  Strength ".parse::<ExerciseCategory>().unwrap(),
            ExerciseCategory::Strength
        );
        assert_eq!(
            "plyometrics".parse::<ExerciseCategory>().unwrap(),
            ExerciseCategory::Other
        );
    }

    #[test]
    fn test_mobility_detection_by_name() {
        assert!(sample_set("Couch Stretch", None).is_mobility());
        assert!(sample_set("Morning YOGA Flow", None).is_mobility());
        assert!(!sample_set("Back Squat", None).is_mobility());
    }

    #[test]
    fn test_mobility_detection_by_category() {
        assert!(sample_set("Hip Opener", Some(ExerciseCategory::Mobility)).is_mobility());
        assert!(!sample_set("Hip Thrust", Some(ExerciseCategory::Strength)).is_mobility());
    }

    #[test]
    fn test_content_hash_stable_across_cosmetic_fields() {
        let a = sample_set("Back Squat", Some(ExerciseCategory::Strength));
        let b = CompletedSet {
            id: "different_id".to_string(),
            notes: Some("felt heavy".to_string()),
            source: Some("import.csv".to_string()),
            ..a.clone()
        };
        assert_eq!(a.content_hash(), b.content_hash());

        // Name matching is case-insensitive
        let c = CompletedSet {
            exercise_name: "back squat".to_string(),
            ..a.clone()
        };
        assert_eq!(a.content_hash(), c.content_hash());

        let d = CompletedSet {
            reps: 6,
            ..a.clone()
        };
        assert_ne!(a.content_hash(), d.content_hash());
    }

    #[test]
    fn test_content_hash_weight_normalization() {
        let a = sample_set("Deadlift", None);
        let b = CompletedSet {
            weight: dec!(100.00),
            ..a.clone()
        };
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_sleep_sample_hours() {
        let sample = SleepSample {
            sampled_at: Utc.with_ymd_and_hms(2025, 6, 4, 7, 0, 0).unwrap(),
            duration_minutes: 450,
            source: Some("health_connect".to_string()),
        };
        assert!((sample.hours() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plan_target_parsing() {
        let plan = NutritionPlan {
            id: "plan_1".to_string(),
            name: "Cut".to_string(),
            target_daily_calories: Some("2200".to_string()),
            active: true,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
        };
        assert_eq!(plan.parsed_target_calories(), Some(2200));

        let padded = NutritionPlan {
            target_daily_calories: Some(" 2400 ".to_string()),
            ..plan.clone()
        };
        assert_eq!(padded.parsed_target_calories(), Some(2400));

        let unparsable = NutritionPlan {
            target_daily_calories: Some("about 2500".to_string()),
            ..plan.clone()
        };
        assert_eq!(unparsable.parsed_target_calories(), None);

        let missing = NutritionPlan {
            target_daily_calories: None,
            ..plan
        };
        assert_eq!(missing.parsed_target_calories(), None);
    }

    #[test]
    fn test_set_serialization() {
        let set = sample_set("Back Squat", Some(ExerciseCategory::Strength));
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.contains("\"exercise_category\":\"Strength\""));

        let deserialized: CompletedSet = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, set);
    }
}
