use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while loading the transactions.
///
/// All variants are fatal: the dashboard never works on a partial dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source is missing, unreadable, of an unsupported type, or lacks
    /// the configured sheet.
    #[error("cannot load {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// One or more required columns are absent from the header row.
    #[error("missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A cell could not be converted to its column's type.
    #[error("row {row}, column '{column}': {reason} (got {value:?})")]
    Parse {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        LoadError::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
