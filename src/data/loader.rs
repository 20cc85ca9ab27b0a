use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Dataset, VariableGroups};

/// Options that change how a file is turned into a [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// The first CSV column is a row index, not a variable.
    pub index_col: bool,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a numeric dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column per variable
/// * `.json`    – records: `[{ "a": 1.0, "b": 2.5 }, ...]`
/// * `.parquet` – one primitive numeric column per variable
///
/// Non-numeric columns are skipped with a warning.
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let dataset = match extension(path).as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path, options),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!(
        "loaded {} observations of {} variables from {}",
        dataset.n_obs(),
        dataset.n_vars(),
        path.display()
    );
    Ok(dataset)
}

/// Load a variable → group mapping.
///
/// * `.csv`  – first column is the variable, second column the group
/// * `.json` – an object `{ "variable": "group", ... }`
pub fn load_groups(path: &Path) -> Result<VariableGroups> {
    match extension(path).as_str() {
        "json" => {
            let text = std::fs::read_to_string(path).context("reading groups JSON")?;
            let groups: VariableGroups =
                serde_json::from_str(&text).context("parsing groups JSON object")?;
            Ok(groups)
        }
        "csv" => {
            let mut reader = csv::Reader::from_path(path).context("opening groups CSV")?;
            let mut groups = VariableGroups::new();
            for (row_no, result) in reader.records().enumerate() {
                let record = result.with_context(|| format!("groups CSV row {row_no}"))?;
                let variable = record
                    .get(0)
                    .with_context(|| format!("groups CSV row {row_no}: missing variable"))?;
                let group = record
                    .get(1)
                    .with_context(|| format!("groups CSV row {row_no}: missing group"))?;
                groups.insert(variable.trim(), group.trim());
            }
            Ok(groups)
        }
        other => bail!("Unsupported groups file extension: .{other}"),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Column assembly
// ---------------------------------------------------------------------------

/// Collects raw columns, dropping the ones that turned out not to be numeric.
struct ColumnSet {
    names: Vec<String>,
    values: Vec<Option<Vec<f64>>>,
}

impl ColumnSet {
    fn new(names: Vec<String>) -> Self {
        let values = names.iter().map(|_| Some(Vec::new())).collect();
        ColumnSet { names, values }
    }

    fn push(&mut self, col: usize, value: Option<f64>) {
        let slot = &mut self.values[col];
        match (slot.as_mut(), value) {
            (Some(vals), Some(v)) => vals.push(v),
            (Some(_), None) => {
                log::warn!("skipping non-numeric column '{}'", self.names[col]);
                *slot = None;
            }
            (None, _) => {}
        }
    }

    fn into_dataset(self) -> Result<Dataset> {
        let (names, columns): (Vec<String>, Vec<Vec<f64>>) = self
            .names
            .into_iter()
            .zip(self.values)
            .filter_map(|(n, v)| v.map(|v| (n, v)))
            .unzip();
        Ok(Dataset::new(names, columns)?)
    }
}

/// Parse one text cell. Missing markers become `NaN`, anything unparsable is `None`.
fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    match s.to_ascii_lowercase().as_str() {
        "na" | "nan" | "null" | "none" => Some(f64::NAN),
        _ => s.parse::<f64>().ok(),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let skip = usize::from(options.index_col);
    if headers.len() <= skip {
        bail!("CSV has no variable columns");
    }
    let mut columns = ColumnSet::new(headers[skip..].to_vec());

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, found {}",
                headers.len(),
                record.len()
            );
        }
        for (col_idx, cell) in record.iter().enumerate().skip(skip) {
            columns.push(col_idx - skip, parse_cell(cell));
        }
    }

    columns.into_dataset()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "height": 1.71, "weight": 68.0, "age": null },
///   ...
/// ]
/// ```
///
/// `null` and absent keys are missing values.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

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

    let mut columns = ColumnSet::new(names.clone());
    for rec in records {
        // Shape was checked while collecting names.
        let Some(obj) = rec.as_object() else { continue };
        for (col, name) in names.iter().enumerate() {
            let value = match obj.get(name) {
                None | Some(JsonValue::Null) => Some(f64::NAN),
                Some(JsonValue::Number(n)) => n.as_f64(),
                Some(JsonValue::String(s)) => parse_cell(s),
                Some(_) => None,
            };
            columns.push(col, value);
        }
    }

    columns.into_dataset()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file; every Float64/Float32/Int64/Int32 column becomes a
/// variable and nulls become missing values. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let numeric: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| {
            let keep = is_numeric(f.data_type());
            if !keep {
                log::warn!(
                    "skipping non-numeric column '{}' ({:?})",
                    f.name(),
                    f.data_type()
                );
            }
            keep
        })
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut values: BTreeMap<usize, Vec<f64>> = numeric.iter().map(|(i, _)| (*i, Vec::new())).collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, name) in &numeric {
            let col = batch.column(*col_idx);
            let out = values.entry(*col_idx).or_default();
            extend_f64(col, out).with_context(|| format!("reading column '{name}'"))?;
        }
    }

    let (names, columns): (Vec<String>, Vec<Vec<f64>>) = numeric
        .into_iter()
        .map(|(i, name)| (name, values.remove(&i).unwrap_or_default()))
        .unzip();
    Ok(Dataset::new(names, columns)?)
}

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

// -- Arrow helpers --

/// Append the values of a primitive numeric column, nulls as `NaN`.
fn extend_f64(col: &Arc<dyn Array>, out: &mut Vec<f64>) -> Result<()> {
    let any = col.as_any();
    if let Some(arr) = any.downcast_ref::<Float64Array>() {
        out.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
    } else if let Some(arr) = any.downcast_ref::<Int64Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)));
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        out.extend(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)));
    } else {
        bail!("expected a numeric column, got {:?}", col.data_type());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_with_missing_and_text_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "a,b,label\n1.0,2,x\n,3,y\nNA,4.5,z\n",
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.n_obs(), 3);
        assert!(ds.column(0)[1].is_nan());
        assert!(ds.column(0)[2].is_nan());
        assert_eq!(ds.column(1), &[2.0, 3.0, 4.5]);
    }

    #[test]
    fn csv_index_column_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "id,a,b\n10,1,2\n11,3,4\n");
        let ds = load_file(&path, &LoadOptions { index_col: true }).unwrap();
        assert_eq!(ds.names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[{"a": 1, "b": 2.5, "s": "x"}, {"a": null, "b": 3.5, "s": "y"}, {"b": 1.0, "s": "z"}]"#,
        );
        let ds = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(ds.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(ds.column(0)[0], 1.0);
        assert!(ds.column(0)[1].is_nan());
        assert!(ds.column(0)[2].is_nan());
    }

    #[test]
    fn all_text_is_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "data.csv", "name\nfoo\nbar\n");
        assert!(load_file(&path, &LoadOptions::default()).is_err());
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("data.xlsx"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn groups_from_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = write_file(&dir, "groups.csv", "variable,group\na,blood\nb, urine\n");
        let groups = load_groups(&csv_path).unwrap();
        assert_eq!(groups.group_of("b"), Some("urine"));

        let json_path = write_file(&dir, "groups.json", r#"{"a": "blood", "b": "urine"}"#);
        let groups = load_groups(&json_path).unwrap();
        assert_eq!(groups.group_of("a"), Some("blood"));
        assert_eq!(groups.len(), 2);
    }
}
