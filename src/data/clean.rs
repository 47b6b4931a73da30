use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use log::{debug, warn};

use super::model::{FoodRecord, FoodTable, RawCell, RawTable, NAME_COLUMN, SERVING_SIZE_COLUMN};
use crate::error::{NutritionError, Result};

// ---------------------------------------------------------------------------
// Per-cell cleaning
// ---------------------------------------------------------------------------

/// Keep only ASCII digits, `.` and `-`, wherever they appear in the string.
///
/// Repeated signs or points are kept as-is so that `"1.2.3"` or `"--"` fail
/// to parse instead of being collapsed into a plausible number.
pub fn filter_numeric_chars(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect()
}

/// Clean one cell into either `Number` (finite) or `Null` (missing).
///
/// Numeric cells pass through; non-finite numbers count as missing.
/// Applying it twice yields the same cell.
pub fn clean_cell(cell: &RawCell) -> RawCell {
    match cell {
        RawCell::Number(v) if v.is_finite() => RawCell::Number(*v),
        RawCell::Number(_) | RawCell::Null => RawCell::Null,
        RawCell::Text(s) => match filter_numeric_chars(s).parse::<f64>() {
            Ok(v) if v.is_finite() => RawCell::Number(v),
            _ => RawCell::Null,
        },
    }
}

/// Cleaned value of a cell, `None` when missing.
pub fn parse_cell(cell: &RawCell) -> Option<f64> {
    match clean_cell(cell) {
        RawCell::Number(v) => Some(v),
        _ => None,
    }
}

/// Median of the given values; averages the two middle values for even counts.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

// ---------------------------------------------------------------------------
// Column-wise imputation
// ---------------------------------------------------------------------------

/// What to do with a column in which no cell could be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EmptyColumnPolicy {
    /// Surface [`NutritionError::UndefinedMedian`].
    #[default]
    Fail,
    /// Remove the column from every record.
    Drop,
    /// Fill every cell with a fixed value.
    Fill(f64),
}

impl FromStr for EmptyColumnPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "drop" => Ok(Self::Drop),
            other => {
                let value = other
                    .strip_prefix("fill:")
                    .ok_or_else(|| format!("unknown empty column policy '{s}'"))?;
                let value: f64 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid fill value in '{s}'"))?;
                if value.is_finite() {
                    Ok(Self::Fill(value))
                } else {
                    Err(format!("fill value must be finite in '{s}'"))
                }
            }
        }
    }
}

fn cell(row: &[RawCell], idx: usize) -> RawCell {
    row.get(idx).cloned().unwrap_or(RawCell::Null)
}

/// Normalize a raw table, failing on any column without a parseable value.
pub fn normalize(raw: &RawTable, protected: &BTreeSet<String>) -> Result<FoodTable> {
    normalize_with(raw, protected, EmptyColumnPolicy::Fail)
}

/// Clean every non-protected column, then impute missing cells with the
/// column median. Rows are never dropped and keep their source order.
pub fn normalize_with(
    raw: &RawTable,
    protected: &BTreeSet<String>,
    policy: EmptyColumnPolicy,
) -> Result<FoodTable> {
    let mut cleaned: Vec<(String, Vec<f64>)> = Vec::new();

    for (col_idx, column) in raw.columns.iter().enumerate() {
        if protected.contains(column) {
            continue;
        }

        let values: Vec<Option<f64>> = raw
            .rows
            .iter()
            .map(|row| parse_cell(&cell(row, col_idx)))
            .collect();
        let mut present: Vec<f64> = values.iter().flatten().copied().collect();
        let n_missing = values.len() - present.len();

        let fill = match median(&mut present) {
            Some(m) => m,
            None => match policy {
                EmptyColumnPolicy::Fail => {
                    return Err(NutritionError::UndefinedMedian {
                        column: column.clone(),
                    });
                }
                EmptyColumnPolicy::Drop => {
                    warn!("Dropping column '{column}': no parseable values");
                    continue;
                }
                EmptyColumnPolicy::Fill(v) => {
                    warn!("Column '{column}' has no parseable values, filling with {v}");
                    v
                }
            },
        };

        if n_missing > 0 {
            debug!("Column '{column}': imputed {n_missing} missing value(s) with {fill}");
        }

        cleaned.push((
            column.clone(),
            values.into_iter().map(|v| v.unwrap_or(fill)).collect(),
        ));
    }

    let name_idx = raw.column_index(NAME_COLUMN);
    let serving_idx = raw.column_index(SERVING_SIZE_COLUMN);
    let passthrough_cols: Vec<(usize, &String)> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            protected.contains(*c) && Some(*i) != name_idx && Some(*i) != serving_idx
        })
        .collect();

    let records = raw
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let text_at = |idx: Option<usize>| idx.and_then(|i| cell(row, i).as_text());
            FoodRecord {
                id: row_idx,
                name: text_at(name_idx),
                serving_size: text_at(serving_idx),
                nutrients: cleaned
                    .iter()
                    .map(|(col, vals)| (col.clone(), vals[row_idx]))
                    .collect(),
                passthrough: passthrough_cols
                    .iter()
                    .filter_map(|(i, col)| Some(((*col).clone(), cell(row, *i).as_text()?)))
                    .collect::<BTreeMap<_, _>>(),
            }
        })
        .collect();

    Ok(FoodTable {
        records,
        nutrient_columns: cleaned.into_iter().map(|(col, _)| col).collect(),
    })
}
