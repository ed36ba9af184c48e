use std::path::Path;
use std::sync::{Arc, OnceLock};

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{
    COL_QUANTITY, COL_RATING, COL_TIME, COL_TOTAL, Dataset, REQUIRED_COLUMNS, Record,
};
use crate::config::SourceConfig;

const TIME_FORMAT: &str = "%H:%M:%S";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the transactions described by `source`.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – the configured sheet and region
/// * `.csv`     – the file is the sheet; same region rules as a workbook
/// * `.json`    – `[{ "City": "...", "Time": "13:08:00", ... }, ...]`
/// * `.parquet` – one column per required field
///
/// Loading is pure: the same source always yields an equal [`Dataset`].
pub fn load(source: &SourceConfig) -> Result<Dataset, LoadError> {
    let path = source.path.as_path();
    if !path.exists() {
        return Err(LoadError::data_load(path, "file not found"));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => records_from_grid(&read_workbook(source)?, source)?,
        "csv" => records_from_grid(&read_csv(source)?, source)?,
        "json" => load_json(path, source.max_rows)?,
        "parquet" | "pq" => load_parquet(path, source.max_rows)?,
        other => {
            return Err(LoadError::data_load(
                path,
                format!("unsupported file extension: .{other}"),
            ));
        }
    };

    log::info!("Loaded {} transactions from {}", records.len(), path.display());
    Ok(Dataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Write-once cache
// ---------------------------------------------------------------------------

/// Holds the dataset for the lifetime of the process.
///
/// The first successful [`DatasetCache::get_or_load`] stores the dataset;
/// every later call hands out the same `Arc`. Nothing ever writes to it
/// again, so readers on any thread need no lock. Failures are not cached.
#[derive(Debug)]
pub struct DatasetCache {
    source: SourceConfig,
    cell: OnceLock<Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            source,
            cell: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn get_or_load(&self) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = self.cell.get() {
            return Ok(Arc::clone(dataset));
        }
        let loaded = Arc::new(load(&self.source)?);
        // A concurrent loader may have won the race; keep whichever landed first.
        Ok(Arc::clone(self.cell.get_or_init(|| loaded)))
    }

    /// The cached dataset, if it has been loaded.
    #[cfg(test)]
    pub(crate) fn get(&self) -> Option<Arc<Dataset>> {
        self.cell.get().cloned()
    }
}

// ---------------------------------------------------------------------------
// Cells – source-independent raw values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Time(NaiveTime),
}

impl Cell {
    fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn raw(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Time(t) => t.format(TIME_FORMAT).to_string(),
        }
    }
}

/// Rows of cells addressed from A1, as a spreadsheet would show them.
type Grid = Vec<Vec<Cell>>;

// ---------------------------------------------------------------------------
// Workbook reader
// ---------------------------------------------------------------------------

fn read_workbook(source: &SourceConfig) -> Result<Grid, LoadError> {
    let path = source.path.as_path();
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::data_load(path, e))?;

    if !workbook.sheet_names().iter().any(|s| s == &source.sheet) {
        return Err(LoadError::data_load(
            path,
            format!("sheet '{}' not found", source.sheet),
        ));
    }
    let range = workbook
        .worksheet_range(&source.sheet)
        .map_err(|e| LoadError::data_load(path, e))?;

    let (_, last_col) = column_span(source)?;
    let Some((end_row, end_col)) = range.end() else {
        return Ok(Grid::new());
    };
    let end_col = end_col.min(last_col as u32);
    let last_row = (source.skip_rows + source.max_rows) as u32;

    // `get_value` takes absolute positions, so the grid lines up with A1
    // regardless of where the used range starts.
    let grid = (0..=end_row.min(last_row))
        .map(|r| {
            (0..=end_col)
                .map(|c| range.get_value((r, c)).map_or(Cell::Empty, cell_from_data))
                .collect()
        })
        .collect();
    Ok(grid)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => time_from_serial(dt.as_f64()).map_or(Cell::Empty, Cell::Time),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Spreadsheet serial date → time of day (the fractional part of the day).
fn time_from_serial(serial: f64) -> Option<NaiveTime> {
    if !serial.is_finite() {
        return None;
    }
    let secs = (serial.fract().abs() * 86_400.0).round() as u32 % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Fully empty lines never reach the grid, so `skip_rows` counts only the
/// lines that carry at least one separator or value.
fn read_csv(source: &SourceConfig) -> Result<Grid, LoadError> {
    let path = source.path.as_path();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::data_load(path, e))?;

    let mut grid = Grid::new();
    for result in reader.records().take(source.skip_rows + 1 + source.max_rows) {
        let record = result.map_err(|e| LoadError::data_load(path, e))?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Grid → records
// ---------------------------------------------------------------------------

fn column_span(source: &SourceConfig) -> Result<(usize, usize), LoadError> {
    source
        .column_span()
        .map_err(|e| LoadError::data_load(&source.path, format!("{e:#}")))
}

/// Apply the region layout: skip rows, read the header, then at most
/// `max_rows` data rows restricted to the column span.
fn records_from_grid(grid: &Grid, source: &SourceConfig) -> Result<Vec<Record>, LoadError> {
    let (first_col, last_col) = column_span(source)?;
    let header_row = source.skip_rows;
    log::debug!(
        "Reading region: header on row {}, columns {}..={}",
        header_row + 1,
        source.first_column,
        source.last_column
    );

    let header: Vec<String> = grid
        .get(header_row)
        .map(|row| {
            (first_col..=last_col)
                .map(|c| row.get(c).map(Cell::raw).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    let positions = required_positions(|name| header.iter().position(|h| h == name))?;

    let mut records = Vec::new();
    for (offset, row) in grid
        .iter()
        .enumerate()
        .skip(header_row + 1)
        .take(source.max_rows)
    {
        let cells: Vec<Cell> = positions
            .iter()
            .map(|&p| row.get(first_col + p).cloned().unwrap_or(Cell::Empty))
            .collect();
        if let Some(record) = build_record(&cells, offset + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Resolve every required column, reporting all missing ones at once.
fn required_positions(
    mut find: impl FnMut(&str) -> Option<usize>,
) -> Result<Vec<usize>, LoadError> {
    let mut positions = Vec::with_capacity(REQUIRED_COLUMNS.len());
    let mut missing = Vec::new();
    for name in REQUIRED_COLUMNS {
        match find(name) {
            Some(p) => positions.push(p),
            None => missing.push(name.to_string()),
        }
    }
    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(LoadError::Schema { missing })
    }
}

/// Convert one row (cells in [`REQUIRED_COLUMNS`] order) into a record.
/// Returns `None` for a fully blank row.
fn build_record(cells: &[Cell], row: usize) -> Result<Option<Record>, LoadError> {
    if cells.iter().all(Cell::is_empty) {
        return Ok(None);
    }

    let rating = decimal(&cells[7], row, COL_RATING)?;
    if let Some(r) = rating {
        if !(0.0..=10.0).contains(&r) {
            return Err(parse_error(&cells[7], row, COL_RATING, "rating outside 0-10"));
        }
    }

    Ok(Some(Record::new(
        text(&cells[0]),
        text(&cells[1]),
        text(&cells[2]),
        text(&cells[3]),
        text(&cells[4]),
        integer(&cells[5], row, COL_QUANTITY)?,
        decimal(&cells[6], row, COL_TOTAL)?,
        rating,
        time_of_day(&cells[8], row)?,
    )))
}

fn parse_error(cell: &Cell, row: usize, column: &str, reason: &str) -> LoadError {
    LoadError::Parse {
        row,
        column: column.to_string(),
        value: cell.raw(),
        reason: reason.to_string(),
    }
}

fn text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) if s.trim().is_empty() => None,
        Cell::Text(s) => Some(s.clone()),
        Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
        other => Some(other.raw()),
    }
}

fn integer(cell: &Cell, row: usize, column: &str) -> Result<Option<i64>, LoadError> {
    let value = match cell {
        c if c.is_empty() => return Ok(None),
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(n) if n.is_finite() && n.fract() == 0.0 => Ok(Some(n as i64)),
        _ => Err(parse_error(cell, row, column, "expected an integer")),
    }
}

fn decimal(cell: &Cell, row: usize, column: &str) -> Result<Option<f64>, LoadError> {
    let value = match cell {
        c if c.is_empty() => return Ok(None),
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(parse_error(cell, row, column, "expected a number")),
    }
}

fn time_of_day(cell: &Cell, row: usize) -> Result<NaiveTime, LoadError> {
    match cell {
        Cell::Time(t) => Ok(*t),
        Cell::Text(s) if !s.trim().is_empty() => NaiveTime::parse_from_str(s.trim(), TIME_FORMAT)
            .map_err(|_| parse_error(cell, row, COL_TIME, "expected HH:MM:SS")),
        c if c.is_empty() => Err(parse_error(cell, row, COL_TIME, "missing time")),
        _ => Err(parse_error(cell, row, COL_TIME, "expected HH:MM:SS")),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "City": "Yangon", "Gender": "Female", "Customer_type": "Member",
///     "Product line": "Health and beauty", "Payment": "Ewallet",
///     "Quantity": 7, "Total": 548.97, "Rating": 9.1, "Time": "13:08:00" },
///   ...
/// ]
/// ```
fn load_json(path: &Path, max_rows: usize) -> Result<Vec<Record>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::data_load(path, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| LoadError::data_load(path, e))?;
    let rows = root
        .as_array()
        .ok_or_else(|| LoadError::data_load(path, "expected top-level JSON array"))?;

    // A column exists if any object carries the key.
    required_positions(|name| {
        rows.iter()
            .any(|r| r.get(name).is_some())
            .then_some(0)
    })?;

    let mut records = Vec::new();
    for (i, row) in rows.iter().take(max_rows).enumerate() {
        let obj = row.as_object().ok_or_else(|| {
            LoadError::data_load(path, format!("row {} is not a JSON object", i + 1))
        })?;
        let cells: Vec<Cell> = REQUIRED_COLUMNS
            .iter()
            .map(|name| obj.get(*name).map_or(Cell::Empty, json_to_cell))
            .collect();
        if let Some(record) = build_record(&cells, i + 1)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::Null => Cell::Empty,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map_or(Cell::Text(n.to_string()), Cell::Number),
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per required field.
///
/// Text columns may be Utf8 or LargeUtf8, numeric columns any int/float
/// width. `Time` may be text or an Arrow time type.
fn load_parquet(path: &Path, max_rows: usize) -> Result<Vec<Record>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::data_load(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| LoadError::data_load(path, e))?;

    let schema = builder.schema().clone();
    let positions = required_positions(|name| schema.index_of(name).ok())?;
    let reader = builder.build().map_err(|e| LoadError::data_load(path, e))?;

    let mut records = Vec::new();
    let mut row_no = 0usize;

    'batches: for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::data_load(path, e))?;
        for row in 0..batch.num_rows() {
            if row_no == max_rows {
                break 'batches;
            }
            row_no += 1;
            let cells: Vec<Cell> = positions
                .iter()
                .map(|&p| arrow_cell(batch.column(p).as_ref(), row))
                .collect();
            if let Some(record) = build_record(&cells, row_no)? {
                records.push(record);
            }
        }
    }
    Ok(records)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &dyn Array, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Empty;
    }
    match col.data_type() {
        DataType::Utf8 => Cell::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Cell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Cell::Number(col.as_primitive::<Int32Type>().value(row) as f64),
        DataType::Int64 => Cell::Number(col.as_primitive::<Int64Type>().value(row) as f64),
        DataType::Float32 => Cell::Number(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => Cell::Number(col.as_primitive::<Float64Type>().value(row)),
        // Time types and anything else go through Arrow's own formatting.
        _ => arrow::util::display::array_value_to_string(col, row)
            .map_or(Cell::Empty, Cell::Text),
    }
}
