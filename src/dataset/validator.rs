// Dataset validation
// Parses uploaded CSV / spreadsheet bytes into a typed Dataset

use super::table::Dataset;
use crate::models::Label;
use calamine::{open_workbook_auto_from_rs, Reader};
use log::debug;
use std::collections::HashSet;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    #[error("Dataset is empty")]
    EmptyDataset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Xlsx,
    Xls,
}

impl DatasetFormat {
    /// Resolve a declared MIME type, bare extension or file name
    pub fn from_declared(declared: &str) -> Result<Self, ValidationError> {
        let normalized = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        let format = match normalized.as_str() {
            "text/csv" | "application/csv" | "csv" => Some(DatasetFormat::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" | "xlsx" => {
                Some(DatasetFormat::Xlsx)
            }
            "application/vnd.ms-excel" | "xls" => Some(DatasetFormat::Xls),
            other => match other.rsplit_once('.') {
                Some((_, "csv")) => Some(DatasetFormat::Csv),
                Some((_, "xlsx")) => Some(DatasetFormat::Xlsx),
                Some((_, "xls")) => Some(DatasetFormat::Xls),
                _ => None,
            },
        };

        format.ok_or_else(|| ValidationError::UnsupportedFormat(declared.to_string()))
    }
}

pub struct DatasetValidator {
    min_samples: usize,
}

impl DatasetValidator {
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn validate(&self, raw: &[u8], declared_format: &str) -> Result<Dataset, ValidationError> {
        let format = DatasetFormat::from_declared(declared_format)?;

        let rows = match format {
            DatasetFormat::Csv => read_csv_rows(raw)?,
            DatasetFormat::Xlsx | DatasetFormat::Xls => read_spreadsheet_rows(raw)?,
        };

        let dataset = self.build_dataset(rows)?;
        debug!(
            "Validated dataset {}: {} samples x {} features",
            dataset.id(),
            dataset.sample_count(),
            dataset.feature_count()
        );
        Ok(dataset)
    }

    fn build_dataset(&self, mut rows: Vec<Vec<String>>) -> Result<Dataset, ValidationError> {
        // Spreadsheets often carry trailing blank rows
        while rows
            .last()
            .map_or(false, |row| row.iter().all(|cell| cell.trim().is_empty()))
        {
            rows.pop();
        }

        if rows.len() < 2 {
            return Err(ValidationError::EmptyDataset);
        }

        let header: Vec<String> = rows[0].iter().map(|h| h.trim().to_string()).collect();
        let data = &rows[1..];
        let width = header.len();

        for (index, row) in data.iter().enumerate() {
            if row.len() != width {
                return Err(ValidationError::MalformedData(format!(
                    "Row {} has {} columns, expected {}",
                    index + 2,
                    row.len(),
                    width
                )));
            }
        }

        let label_column = (0..width).find(|&col| {
            header[col].eq_ignore_ascii_case("label")
                && data.iter().all(|row| Label::parse(&row[col]).is_some())
        });

        // A leading label column is ground truth, not sample ids
        let id_column = (label_column != Some(0)
            && data.iter().all(|row| parse_finite(&row[0]).is_none()))
        .then_some(0);

        let feature_columns: Vec<usize> = (0..width)
            .filter(|&col| Some(col) != id_column && Some(col) != label_column)
            .collect();

        if feature_columns.is_empty() {
            return Err(ValidationError::MalformedData(
                "No numeric feature columns found".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(feature_columns.len());
        let mut feature_names = Vec::with_capacity(feature_columns.len());
        for &col in &feature_columns {
            let name = &header[col];
            if name.is_empty() {
                return Err(ValidationError::MalformedData(format!(
                    "Column {} has an empty header",
                    col + 1
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::MalformedData(format!(
                    "Duplicate feature name: {}",
                    name
                )));
            }
            feature_names.push(name.clone());
        }

        let mut values = Vec::with_capacity(data.len() * feature_columns.len());
        for (index, row) in data.iter().enumerate() {
            for &col in &feature_columns {
                let value = parse_finite(&row[col]).ok_or_else(|| {
                    ValidationError::MalformedData(format!(
                        "Row {}, column '{}': '{}' is not a finite number",
                        index + 2,
                        header[col],
                        row[col]
                    ))
                })?;
                values.push(value);
            }
        }

        if data.len() < self.min_samples {
            return Err(ValidationError::MalformedData(format!(
                "Dataset has {} samples, at least {} required",
                data.len(),
                self.min_samples
            )));
        }

        let sample_ids = match id_column {
            Some(col) => data.iter().map(|row| row[col].trim().to_string()).collect(),
            None => (0..data.len()).map(|i| i.to_string()).collect(),
        };

        let labels = label_column.map(|col| {
            data.iter()
                .filter_map(|row| Label::parse(&row[col]))
                .collect::<Vec<_>>()
        });

        Dataset::from_parts(sample_ids, feature_names, values, labels)
    }
}

fn parse_finite(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn read_csv_rows(raw: &[u8]) -> Result<Vec<Vec<String>>, ValidationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| ValidationError::MalformedData(format!("Failed to parse CSV: {}", e)))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_spreadsheet_rows(raw: &[u8]) -> Result<Vec<Vec<String>>, ValidationError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(raw.to_vec()))
        .map_err(|e| ValidationError::MalformedData(format!("Failed to open spreadsheet: {}", e)))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| {
            ValidationError::MalformedData(format!("Failed to read first worksheet: {}", e))
        })?,
        None => return Err(ValidationError::EmptyDataset),
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}
