use crate::domain::{PriceMatrix, PriceMatrixError, Symbol};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Date formats accepted in the leading date column.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("table has no date column")]
    NoDateColumn,

    #[error("missing date at row {0}")]
    NullDate(usize),

    #[error("unparseable date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    #[error(transparent)]
    Matrix(#[from] PriceMatrixError),
}

fn polars_err(context: &'static str) -> impl Fn(PolarsError) -> IngestError {
    move |e| IngestError::ReadFailed(format!("{context}: {e}"))
}

/// A cleaned price table and the columns removed while cleaning it.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedTable {
    pub prices: PriceMatrix,
    /// Symbols dropped for missing or non-positive prices.
    pub dropped: Vec<Symbol>,
}

/// Read a wide price table: first column dates, every other column one
/// symbol's prices. Parquet when the extension says so, CSV otherwise.
pub fn read_price_table(path: &Path) -> Result<IngestedTable, IngestError> {
    let is_parquet = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet") || e.eq_ignore_ascii_case("pq"));

    let df = if is_parquet {
        let file = fs::File::open(path)?;
        ParquetReader::new(file)
            .finish()
            .map_err(polars_err("read parquet"))?
    } else {
        if !path.exists() {
            return Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        LazyCsvReader::new(path)
            .with_has_header(true)
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(polars_err("read csv"))?
    };

    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read price table");
    price_table_from_frame(&df)
}

/// Convert a wide DataFrame into a clean [`PriceMatrix`].
///
/// Columns with any missing, non-numeric or non-positive value are dropped
/// whole, never forward-filled. Rows are sorted by date.
pub fn price_table_from_frame(df: &DataFrame) -> Result<IngestedTable, IngestError> {
    let columns = df.get_columns();
    let (date_column, price_columns) = columns.split_first().ok_or(IngestError::NoDateColumn)?;

    let dates = parse_dates(date_column)?;
    let mut order: Vec<usize> = (0..dates.len()).collect();
    order.sort_by_key(|&i| dates[i]);
    let sorted_dates: Vec<NaiveDate> = order.iter().map(|&i| dates[i]).collect();

    let mut kept = Vec::with_capacity(price_columns.len());
    let mut dropped = Vec::new();
    for column in price_columns {
        let symbol = column.name().to_string();
        match clean_prices(column)? {
            Some(values) => {
                let reordered: Vec<f64> = order.iter().map(|&i| values[i]).collect();
                kept.push((symbol, reordered));
            }
            None => dropped.push(symbol),
        }
    }

    if !dropped.is_empty() {
        warn!(count = dropped.len(), symbols = ?dropped, "dropped columns with missing prices");
    }
    dropped.sort();

    Ok(IngestedTable {
        prices: PriceMatrix::new(sorted_dates, kept)?,
        dropped,
    })
}

fn parse_dates(column: &Column) -> Result<Vec<NaiveDate>, IngestError> {
    if matches!(column.dtype(), DataType::Date) {
        let ca = column.date().map_err(polars_err("date column"))?;
        // 1970-01-01
        let epoch = NaiveDate::default();
        return (0..ca.len())
            .map(|i| {
                ca.get(i)
                    .map(|days| epoch + chrono::Duration::days(days as i64))
                    .ok_or(IngestError::NullDate(i))
            })
            .collect();
    }

    let as_text = column
        .cast(&DataType::String)
        .map_err(polars_err("date column"))?;
    let ca = as_text.str().map_err(polars_err("date column"))?;
    ca.into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.ok_or(IngestError::NullDate(row))?;
            parse_date(value).ok_or_else(|| IngestError::InvalidDate {
                row,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Parse the leading date part of a cell (time-of-day suffixes are ignored).
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let head = value.split(|c: char| c == ' ' || c == 'T').next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

/// All prices of a column, or `None` if any is missing or not a positive
/// finite number.
fn clean_prices(column: &Column) -> Result<Option<Vec<f64>>, IngestError> {
    let numeric = column
        .cast(&DataType::Float64)
        .map_err(polars_err("price column"))?;
    let ca = numeric.f64().map_err(polars_err("price column"))?;
    Ok(ca
        .into_iter()
        .map(|v| v.filter(|p| p.is_finite() && *p > 0.0))
        .collect::<Option<Vec<f64>>>())
}
