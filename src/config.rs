use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "supersale.toml";

// ---------------------------------------------------------------------------
// Source layout
// ---------------------------------------------------------------------------

/// Where the transactions live and which region of the sheet holds them.
///
/// The region is addressed the way a spreadsheet user sees it: rows are
/// skipped from the top of the sheet, the next row is the header, and only
/// the columns `first_column..=last_column` are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Sheet name; ignored for sources that have no sheets (CSV, JSON, Parquet).
    pub sheet: String,
    /// Rows above the header. For CSV only non-blank lines count: a line with
    /// no fields at all is dropped by the reader, so title padding there is
    /// written as `,` rather than left empty.
    pub skip_rows: usize,
    pub first_column: String,
    pub last_column: String,
    /// Maximum number of data rows read after the header.
    pub max_rows: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("super_sales.xlsx"),
            sheet: "Data".to_string(),
            skip_rows: 3,
            first_column: "B".to_string(),
            last_column: "R".to_string(),
            max_rows: 1000,
        }
    }
}

impl SourceConfig {
    /// Same layout, different file.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }

    /// Zero-based inclusive column span of the region.
    pub fn column_span(&self) -> Result<(usize, usize)> {
        let first = column_index(&self.first_column)?;
        let last = column_index(&self.last_column)?;
        if first > last {
            bail!(
                "column range {}:{} is inverted",
                self.first_column,
                self.last_column
            );
        }
        Ok((first, last))
    }
}

/// Convert spreadsheet column letters to a zero-based index (`A` → 0, `AA` → 26).
pub fn column_index(letters: &str) -> Result<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        bail!("empty column name");
    }
    let mut index = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            bail!("invalid column name '{letters}'");
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index
            .checked_mul(26)
            .and_then(|i| i.checked_add(digit))
            .with_context(|| format!("column name '{letters}' is too long"))?;
    }
    Ok(index - 1)
}

// ---------------------------------------------------------------------------
// Application config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
}

impl AppConfig {
    /// Read [`CONFIG_FILE`] from the working directory, falling back to
    /// defaults when it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.source.column_span()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_map_to_indices() {
        assert_eq!(column_index("A").unwrap(), 0);
        assert_eq!(column_index("b").unwrap(), 1);
        assert_eq!(column_index("R").unwrap(), 17);
        assert_eq!(column_index("Z").unwrap(), 25);
        assert_eq!(column_index("AA").unwrap(), 26);
        assert!(column_index("").is_err());
        assert!(column_index("B2").is_err());
    }

    #[test]
    fn default_layout_spans_b_to_r() {
        let source = SourceConfig::default();
        assert_eq!(source.column_span().unwrap(), (1, 17));
        assert_eq!(source.sheet, "Data");
        assert_eq!(source.skip_rows, 3);
        assert_eq!(source.max_rows, 1000);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let source = SourceConfig {
            first_column: "R".into(),
            last_column: "B".into(),
            ..SourceConfig::default()
        };
        assert!(source.column_span().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supersale.toml");
        fs::write(&path, "[source]\npath = \"sales.csv\"\nmax_rows = 10\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.source.path, PathBuf::from("sales.csv"));
        assert_eq!(config.source.max_rows, 10);
        assert_eq!(config.source.sheet, "Data");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supersale.toml");
        fs::write(&path, "[source\npath = ").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
