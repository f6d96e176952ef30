//! CSV importer for completed-set history
//!
//! Accepts exports from common workout trackers: header names are matched
//! against a table of known variations, timestamps against a list of
//! datetime formats. Rows that fail validation are skipped with a warning
//! rather than failing the whole file.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use crate::database::TrainingLog;
use crate::error::{ImportExportError, ReadyRsError, Result};
use crate::import::ImportSummary;
use crate::models::{CompletedSet, ExerciseCategory};

/// CSV set importer with flexible column mapping
pub struct CsvSetImporter {
    column_mapping: HashMap<String, String>,
    show_progress: bool,
}

impl CsvSetImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            "timestamp",
            &["timestamp", "time", "date", "datetime", "completed_at", "logged_at"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "exercise",
            &["exercise", "exercise_name", "movement", "lift", "name"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "category",
            &["category", "exercise_category", "exercise_type"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "reps",
            &["reps", "repetitions", "rep_count"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "weight",
            &["weight", "weight_kg", "load", "load_kg", "kg"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "rpe",
            &["rpe", "perceived_exertion", "exertion"],
        );
        Self::add_mapping(&mut column_mapping, "notes", &["notes", "comment", "comments"]);

        Self {
            column_mapping,
            show_progress: true,
        }
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_datetime(date_str: &str) -> std::result::Result<DateTime<Utc>, ImportExportError> {
        let formats = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%SZ",
            "%Y-%m-%dT%H:%M:%S%.fZ",
            "%d/%m/%Y %H:%M:%S",
            "%m/%d/%Y %H:%M:%S",
        ];

        for format in &formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
                return Ok(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
            }
        }

        // Date-only exports: treat as midday so the set stays in its day
        // bucket for any plausible UTC offset
        if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            if let Some(naive_dt) = date.and_hms_opt(12, 0, 0) {
                return Ok(DateTime::from_naive_utc_and_offset(naive_dt, Utc));
            }
        }

        // Epoch seconds
        if let Ok(timestamp) = date_str.parse::<i64>() {
            if let Some(dt) = DateTime::from_timestamp(timestamp, 0) {
                return Ok(dt);
            }
        }

        Err(ImportExportError::ParseError {
            format: "csv".to_string(),
            reason: format!("Unable to parse datetime: {}", date_str),
        })
    }

    /// Parse a CSV file into completed sets
    ///
    /// Rows missing required fields or failing validation are skipped and
    /// counted, not fatal. Returns the parsed sets and the skip count.
    pub fn parse_file(&self, file_path: &Path) -> Result<(Vec<CompletedSet>, usize)> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(file_path)
            .map_err(|e| {
                ReadyRsError::ImportExport(ImportExportError::ParseError {
                    format: "csv".to_string(),
                    reason: e.to_string(),
                })
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| {
                ReadyRsError::ImportExport(ImportExportError::ParseError {
                    format: "csv".to_string(),
                    reason: e.to_string(),
                })
            })?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();

        for required in ["timestamp", "exercise", "reps", "weight"] {
            if !headers.iter().any(|h| h == required) {
                return Err(ReadyRsError::ImportExport(ImportExportError::MissingData {
                    field: required.to_string(),
                }));
            }
        }

        let source = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());

        let mut sets = Vec::new();
        let mut skipped = 0usize;

        for (row_index, record) in reader.records().enumerate() {
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(row = row_index + 1, error = %e, "skipping unreadable row");
                    skipped += 1;
                    continue;
                }
            };

            let fields: HashMap<&str, &str> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.as_str(), v))
                .collect();

            match self.set_from_fields(&fields, source.clone()) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!(row = row_index + 1, error = %e, "skipping invalid row");
                    skipped += 1;
                }
            }
        }

        Ok((sets, skipped))
    }

    fn required_field<'v>(
        fields: &HashMap<&'v str, &'v str>,
        field: &str,
    ) -> std::result::Result<&'v str, ImportExportError> {
        fields
            .get(field)
            .copied()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ImportExportError::MissingData {
                field: field.to_string(),
            })
    }

    fn set_from_fields(
        &self,
        fields: &HashMap<&str, &str>,
        source: Option<String>,
    ) -> std::result::Result<CompletedSet, ImportExportError> {
        let completed_at = Self::parse_datetime(Self::required_field(fields, "timestamp")?)?;
        let exercise_name = Self::required_field(fields, "exercise")?.to_string();

        let reps: u16 = Self::required_field(fields, "reps")?
            .parse()
            .map_err(|_| ImportExportError::ParseError {
                format: "csv".to_string(),
                reason: format!("Invalid rep count: {}", fields["reps"]),
            })?;
        if reps == 0 {
            return Err(ImportExportError::ParseError {
                format: "csv".to_string(),
                reason: "Rep count must be at least 1".to_string(),
            });
        }

        let weight = Decimal::from_str(Self::required_field(fields, "weight")?).map_err(|_| {
            ImportExportError::ParseError {
                format: "csv".to_string(),
                reason: format!("Invalid weight: {}", fields["weight"]),
            }
        })?;
        if weight < Decimal::ZERO {
            return Err(ImportExportError::ParseError {
                format: "csv".to_string(),
                reason: "Weight cannot be negative".to_string(),
            });
        }

        let exercise_category = fields
            .get("category")
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.parse::<ExerciseCategory>()
                    .unwrap_or(ExerciseCategory::Other)
            });

        let perceived_exertion = fields
            .get("rpe")
            .filter(|v| !v.is_empty())
            .map(|v| {
                Decimal::from_str(v).map_err(|_| ImportExportError::ParseError {
                    format: "csv".to_string(),
                    reason: format!("Invalid RPE: {}", v),
                })
            })
            .transpose()?;

        let notes = fields
            .get("notes")
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());

        Ok(CompletedSet {
            id: uuid::Uuid::new_v4().to_string(),
            exercise_name,
            exercise_category,
            completed_at,
            reps,
            weight,
            perceived_exertion,
            notes,
            source,
        })
    }

    /// Import a CSV file into the training log
    pub fn import_into(&self, log: &TrainingLog, file_path: &Path) -> Result<ImportSummary> {
        let (sets, skipped) = self.parse_file(file_path)?;

        let progress = if self.show_progress && !sets.is_empty() {
            let pb = ProgressBar::new(sets.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut imported = 0usize;
        let mut duplicates = 0usize;

        // Chunked so the progress bar moves on big files
        for chunk in sets.chunks(64) {
            let (stored, dup) = log.store_sets(chunk)?;
            imported += stored;
            duplicates += dup;
            if let Some(pb) = &progress {
                pb.inc(chunk.len() as u64);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("import complete");
        }

        let summary = ImportSummary {
            imported,
            duplicates,
            skipped,
        };
        tracing::info!(
            file = %file_path.display(),
            %summary,
            "csv import finished"
        );
        Ok(summary)
    }
}

impl Default for CsvSetImporter {
    fn default() -> Self {
        Self::new()
    }
}
