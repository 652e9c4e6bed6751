// CSV / Excel flattening into a text summary the text encoder can embed

use std::io::Cursor;

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use serde_json::{json, Value};

const SAMPLE_ROWS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_csv(bytes: &[u8]) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() {
            bail!("No columns to parse from file");
        }

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.context("Failed to read CSV row")?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Read the first worksheet; its first row is the header.
    pub fn from_excel(bytes: &[u8]) -> Result<Self> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .context("Failed to open workbook")?;

        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .context("Workbook has no worksheets")?;

        let range = workbook
            .worksheet_range(&sheet)
            .with_context(|| format!("Failed to read worksheet {}", sheet))?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = rows_iter
            .next()
            .map(|row| row.iter().map(cell_to_string).collect())
            .unwrap_or_default();
        if headers.is_empty() {
            bail!("No columns to parse from worksheet {}", sheet);
        }
        let rows = rows_iter
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        Ok(Self { headers, rows })
    }

    fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |row| row.get(idx).map(|v| v.as_str()))
    }

    /// Values of a column if every non-empty cell parses as a number.
    fn numeric_column(&self, idx: usize) -> Option<Vec<f64>> {
        let mut values = Vec::new();
        for cell in self.column(idx).filter(|c| !c.is_empty()) {
            values.push(cell.parse::<f64>().ok()?);
        }
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// Header, sample rows and numeric column summaries as text, plus metadata.
    pub fn summarize(&self, file_type: &str) -> (String, Value) {
        let mut parts = vec![format!("Columns: {}", self.headers.join(", "))];

        parts.push("\nSample data:".to_string());
        for (idx, row) in self.rows.iter().take(SAMPLE_ROWS).enumerate() {
            let cells: Vec<String> = self
                .headers
                .iter()
                .zip(row.iter())
                .map(|(col, val)| format!("{}: {}", col, val))
                .collect();
            parts.push(format!("Row {}: {}", idx + 1, cells.join(" | ")));
        }

        let numeric: Vec<(String, Vec<f64>)> = self
            .headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| self.numeric_column(idx).map(|v| (name.clone(), v)))
            .collect();

        if !numeric.is_empty() {
            parts.push("\nNumeric columns summary:".to_string());
            for (name, values) in &numeric {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                // Debug keeps the float form, e.g. `120.0`
                parts.push(format!("{}: mean={:.2}, min={:?}, max={:?}", name, mean, min, max));
            }
        }

        let metadata = json!({
            "rows": self.rows.len(),
            "columns": self.headers.len(),
            "column_names": self.headers,
            "numeric_columns": numeric.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            "file_type": file_type,
        });

        (parts.join("\n"), metadata)
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
