//! Local training log storage
//!
//! SQLite-backed store for completed sets, sleep samples, food-log entries,
//! and nutrition plans. Implements the scorer's provider traits so a
//! `TrainingLog` can be handed to `ReadinessScorer` directly.
//!
//! Decimals (weight, RPE) are stored as TEXT to avoid float round-trips;
//! timestamps are stored as epoch milliseconds.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use crate::acwr::DayBucketing;
use crate::error::DatabaseError;
use crate::models::{
    CompletedSet, ExerciseCategory, FoodLogEntry, NutritionPlan, SleepSample,
};
use crate::readiness::{NutritionLog, SetHistory, SleepSource};

/// Database connection and management
///
/// The connection sits behind a mutex so the log is `Sync` and can be
/// shared across the scorer's provider seams (including the bounded sleep
/// decorator, which reads from a worker thread).
pub struct TrainingLog {
    conn: Mutex<Connection>,
    bucketing: DayBucketing,
}

impl TrainingLog {
    /// Create or open a training log at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open(db_path)?)
    }

    /// Open an in-memory training log (tests, dry runs)
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let log = Self {
            conn: Mutex::new(conn),
            bucketing: DayBucketing::Utc,
        };
        log.init_schema()?;
        Ok(log)
    }

    /// Override the day-boundary policy used for "today" queries
    pub fn with_bucketing(mut self, bucketing: DayBucketing) -> Self {
        self.bucketing = bucketing;
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.conn()?;

        // WAL for concurrent reads while the CLI writes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", 10_000)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS completed_sets (
                id TEXT PRIMARY KEY,
                content_hash TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                exercise_category TEXT,
                completed_at_ms INTEGER NOT NULL,
                reps INTEGER NOT NULL,
                weight TEXT NOT NULL,
                perceived_exertion TEXT,
                notes TEXT,
                source TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sleep_samples (
                id TEXT PRIMARY KEY,
                sampled_at_ms INTEGER NOT NULL,
                duration_minutes INTEGER NOT NULL,
                source TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS food_log (
                id TEXT PRIMARY KEY,
                logged_at_ms INTEGER NOT NULL,
                calories INTEGER NOT NULL,
                description TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS nutrition_plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                target_daily_calories TEXT,
                active INTEGER NOT NULL DEFAULT 0,
                created_at_ms INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_sets_content_hash ON completed_sets (content_hash)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sets_completed_at ON completed_sets (completed_at_ms)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sleep_sampled_at ON sleep_samples (sampled_at_ms)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_food_logged_at ON food_log (logged_at_ms)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_plans_active ON nutrition_plans (active)",
            [],
        )?;

        Ok(())
    }

    /// Store a completed set, rejecting content-hash duplicates
    pub fn store_set(&self, set: &CompletedSet) -> Result<(), DatabaseError> {
        let hash = set.content_hash();
        let conn = self.conn()?;

        if Self::hash_exists(&conn, &hash)? {
            return Err(DatabaseError::Duplicate(format!(
                "{} x{} @ {}",
                set.exercise_name, set.reps, set.completed_at
            )));
        }

        Self::insert_set(&conn, set, &hash)?;
        Ok(())
    }

    /// Store a batch of sets in one transaction
    ///
    /// Duplicates are skipped, not fatal. Returns (stored, duplicates).
    pub fn store_sets(&self, sets: &[CompletedSet]) -> Result<(usize, usize), DatabaseError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut stored = 0usize;
        let mut duplicates = 0usize;

        for set in sets {
            let hash = set.content_hash();
            if Self::hash_exists(&tx, &hash)? {
                duplicates += 1;
                continue;
            }
            Self::insert_set(&tx, set, &hash)?;
            stored += 1;
        }

        tx.commit()?;
        Ok((stored, duplicates))
    }

    fn hash_exists(conn: &Connection, hash: &str) -> Result<bool, DatabaseError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM completed_sets WHERE content_hash = ?1",
            params![hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_set(conn: &Connection, set: &CompletedSet, hash: &str) -> Result<(), DatabaseError> {
        conn.execute(
            r#"
            INSERT INTO completed_sets (
                id, content_hash, exercise_name, exercise_category,
                completed_at_ms, reps, weight, perceived_exertion, notes, source
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                set.id,
                hash,
                set.exercise_name,
                set.exercise_category.map(|c| c.to_string()),
                set.completed_at.timestamp_millis(),
                set.reps,
                set.weight.to_string(),
                set.perceived_exertion.map(|r| r.to_string()),
                set.notes,
                set.source,
            ],
        )?;
        Ok(())
    }

    /// Load all sets completed at or after `since`, oldest first
    pub fn sets_since(&self, since: DateTime<Utc>) -> Result<Vec<CompletedSet>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, exercise_name, exercise_category, completed_at_ms,
                   reps, weight, perceived_exertion, notes, source
            FROM completed_sets
            WHERE completed_at_ms >= ?1
            ORDER BY completed_at_ms ASC
            "#,
        )?;

        let sets = stmt
            .query_map(params![since.timestamp_millis()], Self::set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sets)
    }

    fn set_from_row(row: &Row<'_>) -> rusqlite::Result<CompletedSet> {
        let completed_at_ms: i64 = row.get(3)?;
        let completed_at = DateTime::from_timestamp_millis(completed_at_ms)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, completed_at_ms))?;

        let weight: String = row.get(5)?;
        let weight = Decimal::from_str(&weight).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let perceived_exertion: Option<String> = row.get(6)?;
        let perceived_exertion = perceived_exertion
            .map(|r| {
                Decimal::from_str(&r).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        6,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()?;

        let category: Option<String> = row.get(2)?;

        Ok(CompletedSet {
            id: row.get(0)?,
            exercise_name: row.get(1)?,
            exercise_category: category.map(|c| {
                c.parse::<ExerciseCategory>()
                    .unwrap_or(ExerciseCategory::Other)
            }),
            completed_at,
            reps: row.get(4)?,
            weight,
            perceived_exertion,
            notes: row.get(7)?,
            source: row.get(8)?,
        })
    }

    /// Store a sleep sample
    pub fn store_sleep_sample(
        &self,
        id: &str,
        sample: &SleepSample,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO sleep_samples (id, sampled_at_ms, duration_minutes, source)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                id,
                sample.sampled_at.timestamp_millis(),
                sample.duration_minutes,
                sample.source,
            ],
        )?;
        Ok(())
    }

    /// Most recent sleep sample taken at or after `since`
    pub fn latest_sleep_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Option<SleepSample>, DatabaseError> {
        let conn = self.conn()?;
        let sample = conn
            .query_row(
                r#"
                SELECT sampled_at_ms, duration_minutes, source
                FROM sleep_samples
                WHERE sampled_at_ms >= ?1
                ORDER BY sampled_at_ms DESC
                LIMIT 1
                "#,
                params![since.timestamp_millis()],
                |row| {
                    let sampled_at_ms: i64 = row.get(0)?;
                    let sampled_at = DateTime::from_timestamp_millis(sampled_at_ms)
                        .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, sampled_at_ms))?;
                    Ok(SleepSample {
                        sampled_at,
                        duration_minutes: row.get(1)?,
                        source: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(sample)
    }

    /// Store a food-log entry
    pub fn store_food_entry(&self, entry: &FoodLogEntry) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO food_log (id, logged_at_ms, calories, description)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                entry.id,
                entry.logged_at.timestamp_millis(),
                entry.calories,
                entry.description,
            ],
        )?;
        Ok(())
    }

    /// Calories for each entry logged in the same day bucket as `now`
    pub fn calories_for_day(&self, now: DateTime<Utc>) -> Result<Vec<u32>, DatabaseError> {
        let (start_ms, end_ms) = self
            .bucketing
            .bucket_range_ms(self.bucketing.bucket(now));
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT calories FROM food_log
            WHERE logged_at_ms >= ?1 AND logged_at_ms < ?2
            ORDER BY logged_at_ms ASC
            "#,
        )?;

        let calories = stmt
            .query_map(params![start_ms, end_ms], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(calories)
    }

    /// Store a nutrition plan; activating one deactivates the others
    pub fn store_plan(&self, plan: &NutritionPlan) -> Result<(), DatabaseError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if plan.active {
            tx.execute("UPDATE nutrition_plans SET active = 0", [])?;
        }

        tx.execute(
            r#"
            INSERT OR REPLACE INTO nutrition_plans
                (id, name, target_daily_calories, active, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                plan.id,
                plan.name,
                plan.target_daily_calories,
                plan.active,
                plan.created_at.timestamp_millis(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// The currently active nutrition plan, if any
    pub fn active_plan(&self) -> Result<Option<NutritionPlan>, DatabaseError> {
        let conn = self.conn()?;
        let plan = conn
            .query_row(
                r#"
                SELECT id, name, target_daily_calories, active, created_at_ms
                FROM nutrition_plans
                WHERE active = 1
                ORDER BY created_at_ms DESC
                LIMIT 1
                "#,
                [],
                |row| {
                    let created_at_ms: i64 = row.get(4)?;
                    let created_at = DateTime::from_timestamp_millis(created_at_ms)
                        .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, created_at_ms))?;
                    Ok(NutritionPlan {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        target_daily_calories: row.get(2)?,
                        active: row.get(3)?,
                        created_at,
                    })
                },
            )
            .optional()?;
        Ok(plan)
    }
}

impl SetHistory for TrainingLog {
    fn completed_sets_since(&self, since: DateTime<Utc>) -> crate::error::Result<Vec<CompletedSet>> {
        Ok(self.sets_since(since)?)
    }
}

impl SleepSource for TrainingLog {
    /// Most recent sample in the trailing 24 hours
    ///
    /// A stored duration of zero is normalized to "no reading": upstream
    /// sync providers write 0 when the read failed or no data existed.
    fn trailing_sleep(&self) -> crate::error::Result<Option<SleepSample>> {
        let since = Utc::now() - Duration::hours(24);
        let sample = self.latest_sleep_since(since)?;
        Ok(sample.filter(|s| s.duration_minutes > 0))
    }
}

impl NutritionLog for TrainingLog {
    fn calories_logged_today(&self, now: DateTime<Utc>) -> crate::error::Result<Vec<u32>> {
        Ok(self.calories_for_day(now)?)
    }

    fn active_target_calories(&self) -> crate::error::Result<Option<u32>> {
        Ok(self.active_plan()?.and_then(|p| p.parsed_target_calories()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn set_at(at: DateTime<Utc>, name: &str, reps: u16, weight: Decimal) -> CompletedSet {
        CompletedSet {
            id: uuid::Uuid::new_v4().to_string(),
            exercise_name: name.to_string(),
            exercise_category: Some(ExerciseCategory::Strength),
            completed_at: at,
            reps,
            weight,
            perceived_exertion: Some(dec!(7.5)),
            notes: Some("top set".to_string()),
            source: None,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_set_round_trip() {
        let log = TrainingLog::open_in_memory().unwrap();
        let set = set_at(utc(2025, 6, 10, 17), "Back Squat", 5, dec!(102.5));

        log.store_set(&set).unwrap();
        let loaded = log.sets_since(utc(2025, 6, 1, 0)).unwrap();

        assert_eq!(loaded, vec![set]);
    }

    #[test]
    fn test_duplicate_set_rejected() {
        let log = TrainingLog::open_in_memory().unwrap();
        let set = set_at(utc(2025, 6, 10, 17), "Back Squat", 5, dec!(100));

        log.store_set(&set).unwrap();

        // Same content, different id: still a duplicate
        let again = CompletedSet {
            id: uuid::Uuid::new_v4().to_string(),
            ..set
        };
        let result = log.store_set(&again);
        assert!(matches!(result, Err(DatabaseError::Duplicate(_))));
    }

    #[test]
    fn test_batch_store_counts_duplicates() {
        let log = TrainingLog::open_in_memory().unwrap();
        let a = set_at(utc(2025, 6, 10, 17), "Back Squat", 5, dec!(100));
        let b = set_at(utc(2025, 6, 10, 18), "Bench Press", 8, dec!(70));
        log.store_set(&a).unwrap();

        let (stored, duplicates) = log.store_sets(&[a, b]).unwrap();
        assert_eq!(stored, 1);
        assert_eq!(duplicates, 1);
    }

    #[test]
    fn test_sets_since_filters_and_orders() {
        let log = TrainingLog::open_in_memory().unwrap();
        log.store_set(&set_at(utc(2025, 6, 1, 10), "Deadlift", 3, dec!(140)))
            .unwrap();
        log.store_set(&set_at(utc(2025, 6, 10, 10), "Back Squat", 5, dec!(100)))
            .unwrap();
        log.store_set(&set_at(utc(2025, 6, 20, 10), "Bench Press", 8, dec!(70)))
            .unwrap();

        let loaded = log.sets_since(utc(2025, 6, 5, 0)).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].exercise_name, "Back Squat");
        assert_eq!(loaded[1].exercise_name, "Bench Press");
    }

    #[test]
    fn test_sleep_sample_round_trip() {
        let log = TrainingLog::open_in_memory().unwrap();
        let sample = SleepSample {
            sampled_at: Utc::now() - Duration::hours(2),
            duration_minutes: 432,
            source: Some("health_connect".to_string()),
        };

        log.store_sleep_sample("sleep_1", &sample).unwrap();
        let loaded = log.trailing_sleep().unwrap().unwrap();
        assert_eq!(loaded.duration_minutes, 432);
        assert_eq!(loaded.source, Some("health_connect".to_string()));
    }

    #[test]
    fn test_stale_sleep_ignored() {
        let log = TrainingLog::open_in_memory().unwrap();
        let sample = SleepSample {
            sampled_at: Utc::now() - Duration::hours(30),
            duration_minutes: 432,
            source: None,
        };

        log.store_sleep_sample("sleep_1", &sample).unwrap();
        assert_eq!(log.trailing_sleep().unwrap(), None);
    }

    #[test]
    fn test_zero_duration_sleep_normalized_to_none() {
        let log = TrainingLog::open_in_memory().unwrap();
        let sample = SleepSample {
            sampled_at: Utc::now() - Duration::hours(1),
            duration_minutes: 0,
            source: None,
        };

        log.store_sleep_sample("sleep_1", &sample).unwrap();
        assert_eq!(log.trailing_sleep().unwrap(), None);
    }

    #[test]
    fn test_calories_for_day_buckets() {
        let log = TrainingLog::open_in_memory().unwrap();
        let today = utc(2025, 6, 10, 12);

        log.store_food_entry(&FoodLogEntry {
            id: "food_1".to_string(),
            logged_at: utc(2025, 6, 10, 8),
            calories: 600,
            description: Some("breakfast".to_string()),
        })
        .unwrap();
        log.store_food_entry(&FoodLogEntry {
            id: "food_2".to_string(),
            logged_at: utc(2025, 6, 10, 19),
            calories: 900,
            description: None,
        })
        .unwrap();
        log.store_food_entry(&FoodLogEntry {
            id: "food_3".to_string(),
            logged_at: utc(2025, 6, 9, 19),
            calories: 700,
            description: None,
        })
        .unwrap();

        let calories = log.calories_for_day(today).unwrap();
        assert_eq!(calories, vec![600, 900]);
    }

    #[test]
    fn test_plan_activation_switches() {
        let log = TrainingLog::open_in_memory().unwrap();

        log.store_plan(&NutritionPlan {
            id: "plan_1".to_string(),
            name: "Bulk".to_string(),
            target_daily_calories: Some("3100".to_string()),
            active: true,
            created_at: utc(2025, 5, 1, 0),
        })
        .unwrap();
        log.store_plan(&NutritionPlan {
            id: "plan_2".to_string(),
            name: "Cut".to_string(),
            target_daily_calories: Some("2200".to_string()),
            active: true,
            created_at: utc(2025, 6, 1, 0),
        })
        .unwrap();

        let active = log.active_plan().unwrap().unwrap();
        assert_eq!(active.id, "plan_2");
        assert_eq!(log.active_target_calories().unwrap(), Some(2200));
    }

    #[test]
    fn test_unparsable_target_is_none() {
        let log = TrainingLog::open_in_memory().unwrap();

        log.store_plan(&NutritionPlan {
            id: "plan_1".to_string(),
            name: "Coach notes".to_string(),
            target_daily_calories: Some("around 2500".to_string()),
            active: true,
            created_at: utc(2025, 5, 1, 0),
        })
        .unwrap();

        assert_eq!(log.active_target_calories().unwrap(), None);
    }

    #[test]
    fn test_no_plan_is_none() {
        let log = TrainingLog::open_in_memory().unwrap();
        assert_eq!(log.active_plan().unwrap(), None);
        assert_eq!(log.active_target_calories().unwrap(), None);
    }
}
