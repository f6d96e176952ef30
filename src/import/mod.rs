//! Completed-set history import

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod csv;

/// Outcome of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Sets stored in the training log
    pub imported: usize,

    /// Rows skipped because an identical set was already stored
    pub duplicates: usize,

    /// Rows skipped because they failed validation
    pub skipped: usize,
}

impl ImportSummary {
    pub fn total_rows(&self) -> usize {
        self.imported + self.duplicates + self.skipped
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} imported, {} duplicates, {} skipped",
            self.imported, self.duplicates, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display() {
        let summary = ImportSummary {
            imported: 10,
            duplicates: 2,
            skipped: 1,
        };
        assert_eq!(summary.total_rows(), 13);
        assert_eq!(format!("{}", summary), "10 imported, 2 duplicates, 1 skipped");
    }
}
