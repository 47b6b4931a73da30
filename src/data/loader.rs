use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{RawCell, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw nutrition table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one food per line (the usual export)
/// * `.json`    – `[{ "name": "...", "calories": "52kcal", ... }, ...]`
/// * `.parquet` – flat columns of strings and/or numbers
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Read {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// CSV layout: header row with column names, then one food per line.
/// A blank header (the exported index column) becomes `unnamed_<position>`;
/// an empty cell is null. Rows may be shorter than the header but not longer.
/// A column whose non-empty cells all parse as numbers is stored as numbers;
/// a single messy cell keeps the whole column as text.
pub fn read_csv<R: Read>(input: R) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("unnamed_{i}")
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut table = RawTable::new(headers);

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > table.columns.len() {
            bail!(
                "CSV row {row_no} has {} fields but the header has {}",
                record.len(),
                table.columns.len()
            );
        }
        let row = record
            .iter()
            .map(|value| {
                if value.is_empty() {
                    RawCell::Null
                } else {
                    RawCell::Text(value.to_string())
                }
            })
            .collect();
        table.push_row(row);
    }

    infer_numeric_columns(&mut table);
    Ok(table)
}

fn infer_numeric_columns(table: &mut RawTable) {
    for col in 0..table.columns.len() {
        let numeric = table.rows.iter().all(|row| match &row[col] {
            RawCell::Text(s) => s.trim().parse::<f64>().is_ok(),
            _ => true,
        });
        if !numeric {
            continue;
        }
        for row in &mut table.rows {
            let parsed = match &row[col] {
                RawCell::Text(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            if let Some(v) = parsed {
                row[col] = RawCell::Number(v);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Records-oriented JSON (`df.to_json(orient='records')`).  Columns are the
/// union of keys in first-seen order; keys missing from a record are null.
pub fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(columns);
    for rec in records {
        // Every record was checked to be an object above.
        let Some(obj) = rec.as_object() else { continue };
        let row = table
            .columns
            .iter()
            .map(|col| obj.get(col).map(json_to_cell).unwrap_or(RawCell::Null))
            .collect();
        table.push_row(row);
    }

    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> RawCell {
    match val {
        JsonValue::Null => RawCell::Null,
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => RawCell::Number(f),
            None => RawCell::Text(n.to_string()),
        },
        JsonValue::String(s) => RawCell::Text(s.clone()),
        other => RawCell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Integer and float columns become numeric cells; every other type is read
/// through Arrow's display formatting as text.  Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = RawTable::new(columns);

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            table.push_row(cells);
        }
    }

    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<RawCell> {
    if col.is_null(row) {
        return Ok(RawCell::Null);
    }
    let number = match col.data_type() {
        DataType::Int8 => col.as_primitive::<Int8Type>().value(row) as f64,
        DataType::Int16 => col.as_primitive::<Int16Type>().value(row) as f64,
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::UInt8 => col.as_primitive::<UInt8Type>().value(row) as f64,
        DataType::UInt16 => col.as_primitive::<UInt16Type>().value(row) as f64,
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row) as f64,
        DataType::UInt64 => col.as_primitive::<UInt64Type>().value(row) as f64,
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        _ => {
            let text = array_value_to_string(col.as_ref(), row)
                .with_context(|| format!("formatting {:?} value", col.data_type()))?;
            return Ok(RawCell::Text(text));
        }
    };
    Ok(RawCell::Number(number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("nutri_panda_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_read_csv_blank_header_and_nulls() {
        let csv_data = ",name,serving_size,calories,protein\n\
                        0,Cornstarch,100 g,381,0.26 g\n\
                        1,Nuts,100 g,,15.0g\n";
        let table = read_csv(csv_data.as_bytes()).unwrap();

        assert_eq!(
            table.columns,
            vec!["unnamed_0", "name", "serving_size", "calories", "protein"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][1], RawCell::Text("Cornstarch".into()));
        assert_eq!(table.rows[1][3], RawCell::Null);
        assert_eq!(table.rows[1][4], RawCell::Text("15.0g".into()));
    }

    #[test]
    fn test_read_csv_short_rows_are_padded() {
        let csv_data = "name,calories,fat\nA,10\n";
        let table = read_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(
            table.rows[0],
            vec![RawCell::Text("A".into()), RawCell::Number(10.0), RawCell::Null]
        );
    }

    #[test]
    fn test_read_csv_long_row_is_rejected() {
        let csv_data = "name,calories\nA,10\nB,20,99\n";
        let err = read_csv(csv_data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("3 fields"), "{err}");
    }

    #[test]
    fn test_read_csv_numeric_columns_keep_their_values() {
        let csv_data = "name,protein,fat\n\
                        A,1.5e-3,3 g\n\
                        B,2,\n\
                        C,40,5\n";
        let table = read_csv(csv_data.as_bytes()).unwrap();

        // Every protein cell is a plain number, including scientific notation.
        assert_eq!(table.rows[0][1], RawCell::Number(0.0015));
        assert_eq!(table.rows[1][1], RawCell::Number(2.0));
        assert_eq!(table.rows[2][1], RawCell::Number(40.0));
        // One unit suffix keeps the whole fat column as text.
        assert_eq!(table.rows[0][2], RawCell::Text("3 g".into()));
        assert_eq!(table.rows[1][2], RawCell::Null);
        assert_eq!(table.rows[2][2], RawCell::Text("5".into()));
        assert_eq!(table.rows[0][0], RawCell::Text("A".into()));
    }

    #[test]
    fn test_parse_json_union_of_keys() {
        let json_data = r#"[
            {"name": "Egg", "calories": 143, "protein": "12.6 g"},
            {"name": "Rice", "fat": null}
        ]"#;
        let table = parse_json(json_data).unwrap();

        let cal = table.column_index("calories").unwrap();
        let fat = table.column_index("fat").unwrap();
        assert_eq!(table.rows[0][cal], RawCell::Number(143.0));
        assert_eq!(table.rows[1][cal], RawCell::Null);
        assert_eq!(table.rows[1][fat], RawCell::Null);
        assert_eq!(table.columns.len(), 4);
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        assert!(parse_json(r#"{"name": "Egg"}"#).is_err());
        assert!(parse_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_load_file_unsupported_extension() {
        let err = load_file(Path::new("foods.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension: .xlsx"));
    }

    #[test]
    fn test_load_file_missing_csv() {
        let err = load_file(&temp_path("does_not_exist.csv")).unwrap_err();
        assert!(format!("{err:#}").contains("opening CSV"));
    }

    #[test]
    fn test_load_parquet_mixed_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("calories", DataType::Float64, true),
            Field::new("protein", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![0, 1])),
                Arc::new(StringArray::from(vec![Some("Egg"), None])),
                Arc::new(Float64Array::from(vec![Some(143.0), None])),
                Arc::new(StringArray::from(vec![Some("12.6 g"), Some("--")])),
            ],
        )
        .unwrap();

        let path = temp_path("mixed.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.columns, vec!["id", "name", "calories", "protein"]);
        assert_eq!(
            table.rows[0],
            vec![
                RawCell::Number(0.0),
                RawCell::Text("Egg".into()),
                RawCell::Number(143.0),
                RawCell::Text("12.6 g".into()),
            ]
        );
        assert_eq!(table.rows[1][1], RawCell::Null);
        assert_eq!(table.rows[1][2], RawCell::Null);
    }
}
