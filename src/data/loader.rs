use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::derived::add_derived_columns;
use super::model::{Column, OperatingPointTable};
use super::units::parse_si;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an operating-point table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – header row followed by one row per operating point
/// * `.json`         – `[{ "VGS": 0.6, "id": 1.2e-5, ... }, ...]`
/// * `.parquet`      – flat columns of numbers or strings
///
/// Cells may carry SI prefixes (`"2u"`); a column is numeric when every
/// non-empty cell parses as a number. Derived figure-of-merit columns are
/// appended afterwards.
pub fn load_file(path: &Path) -> Result<OperatingPointTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut table = match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    if table.is_empty() {
        bail!("{} contains no operating points", path.display());
    }
    if table.numeric_column_names().is_empty() {
        bail!("{} has no numeric columns", path.display());
    }

    let added = add_derived_columns(&mut table);
    if !added.is_empty() {
        log::info!("Derived columns added: {added:?}");
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Column builder with numeric/text inference
// ---------------------------------------------------------------------------

/// One raw cell from any of the input formats.
#[derive(Debug, Clone, Copy)]
enum Cell<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

impl Cell<'_> {
    fn as_number(&self) -> Option<f64> {
        match *self {
            Cell::Missing => Some(f64::NAN),
            Cell::Number(v) => Some(v),
            Cell::Text(s) if s.trim().is_empty() => Some(f64::NAN),
            Cell::Text(s) => parse_si(s),
        }
    }

    fn to_text(self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Number(v) => number_text(v),
            Cell::Text(s) => s.to_string(),
        }
    }
}

fn number_text(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

/// Starts numeric and falls back to text at the first non-numeric cell.
#[derive(Debug)]
enum ColumnBuilder {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnBuilder {
    fn with_capacity(n: usize) -> Self {
        ColumnBuilder::Numeric(Vec::with_capacity(n))
    }

    fn push(&mut self, cell: Cell<'_>) {
        if let ColumnBuilder::Numeric(values) = self {
            if let Some(v) = cell.as_number() {
                values.push(v);
                return;
            }
            *self = ColumnBuilder::Text(values.iter().map(|&v| number_text(v)).collect());
        }
        if let ColumnBuilder::Text(values) = self {
            values.push(cell.to_text());
        }
    }

    fn finish(self, name: String) -> Column {
        match self {
            ColumnBuilder::Numeric(values) => Column::numeric(name, values),
            ColumnBuilder::Text(values) => Column::text(name, values),
        }
    }
}

fn finish_table(names: Vec<String>, builders: Vec<ColumnBuilder>) -> Result<OperatingPointTable> {
    let columns = names
        .into_iter()
        .zip(builders)
        .map(|(name, b)| b.finish(name))
        .collect();
    OperatingPointTable::from_columns(columns).context("assembling table")
}

/// Pandas writes its index under an empty header; give such columns a name.
fn header_name(raw: &str, idx: usize) -> String {
    let name = raw.trim();
    if name.is_empty() {
        format!("unnamed_{idx}")
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<OperatingPointTable> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV from any reader: header row, then one record per row.
pub fn read_csv<R: Read>(input: R) -> Result<OperatingPointTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(h, i))
        .collect();
    if headers.is_empty() {
        bail!("CSV has no header row");
    }

    let mut builders: Vec<ColumnBuilder> = headers
        .iter()
        .map(|_| ColumnBuilder::with_capacity(1024))
        .collect();

    let mut record = csv::StringRecord::new();
    let mut row_no = 0usize;
    while reader
        .read_record(&mut record)
        .with_context(|| format!("CSV row {row_no}"))?
    {
        for (builder, value) in builders.iter_mut().zip(record.iter()) {
            builder.push(Cell::Text(value));
        }
        row_no += 1;
    }

    finish_table(headers, builders)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient="records")`.
/// Keys missing from a record become missing cells.
fn load_json(path: &Path) -> Result<OperatingPointTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let mut builders: Vec<ColumnBuilder> = names
        .iter()
        .map(|_| ColumnBuilder::with_capacity(records.len()))
        .collect();

    for (i, rec) in records.iter().enumerate() {
        // Every record was checked to be an object above.
        let Some(obj) = rec.as_object() else { continue };
        for (name, builder) in names.iter().zip(builders.iter_mut()) {
            let cell = match obj.get(name) {
                None | Some(JsonValue::Null) => Cell::Missing,
                Some(JsonValue::Number(n)) => n.as_f64().map_or(Cell::Missing, Cell::Number),
                Some(JsonValue::Bool(b)) => Cell::Number(if *b { 1.0 } else { 0.0 }),
                Some(JsonValue::String(s)) => Cell::Text(s),
                Some(_) => bail!("Row {i}, '{name}': nested values are not supported"),
            };
            builder.push(cell);
        }
    }

    finish_table(names, builders)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per parameter.
///
/// Integer, float and boolean columns are read as numbers; string columns go
/// through the same inference as CSV cells. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<OperatingPointTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let names: Vec<String> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| header_name(f.name(), i))
        .collect();
    let mut builders: Vec<ColumnBuilder> = names
        .iter()
        .map(|_| ColumnBuilder::with_capacity(1024))
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, builder) in builders.iter_mut().enumerate() {
            let col = batch.column(idx);
            let field = &names[idx];
            match col.data_type() {
                dt if dt.is_numeric() || *dt == DataType::Boolean => {
                    let values = cast(col, &DataType::Float64)
                        .with_context(|| format!("casting '{field}' to float"))?;
                    for v in values.as_primitive::<Float64Type>().iter() {
                        builder.push(v.map_or(Cell::Missing, Cell::Number));
                    }
                }
                _ => {
                    let values = cast(col, &DataType::Utf8).with_context(|| {
                        format!("column '{field}' has unsupported type {:?}", col.data_type())
                    })?;
                    for v in values.as_string::<i32>().iter() {
                        builder.push(v.map_or(Cell::Missing, Cell::Text));
                    }
                }
            }
        }
    }

    finish_table(names, builders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    #[test]
    fn csv_infers_numeric_and_text_columns() {
        let data = "VGS,W,corner,id\n0.6,2u,tt,1e-5\n0.8,500n,ss,\n";
        let t = read_csv(data.as_bytes()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.numeric("VGS").unwrap(), &[0.6, 0.8]);
        let w = t.numeric("W").unwrap();
        assert!((w[0] - 2e-6).abs() < 1e-18 && (w[1] - 500e-9).abs() < 1e-18);
        assert!(t.numeric("corner").is_none());
        assert!(t.numeric("id").unwrap()[1].is_nan());
    }

    #[test]
    fn csv_demotes_mixed_column_to_text() {
        let data = "a,b\n1,x\n2,3\nfoo,4\n";
        let t = read_csv(data.as_bytes()).unwrap();
        let a = t.column("a").unwrap();
        assert!(!a.is_numeric());
        assert_eq!(a.data.value(0), Some(Value::Text("1".into())));
        assert_eq!(a.data.value(2), Some(Value::Text("foo".into())));
    }

    #[test]
    fn csv_names_empty_headers() {
        let data = ",VGS\n0,0.5\n";
        let t = read_csv(data.as_bytes()).unwrap();
        assert!(t.has_column("unnamed_0"));
    }

    #[test]
    fn csv_rejects_ragged_rows() {
        let data = "a,b\n1,2\n3\n";
        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"), "{err:#}");
    }
}
