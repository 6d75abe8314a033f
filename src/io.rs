//! CSV cohort reader.
//!
//! Loads an interim cohort file (encoded feature columns plus an outcome
//! column and an optional clinician triage column) into a `Cohort`.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use ndarray::Array2;

use crate::data_handling::Cohort;

/// Configuration for reading a cohort CSV file.
#[derive(Debug, Clone)]
pub struct CohortReaderConfig {
    /// Column holding the binary outcome (1 = event, 0 = no event).
    pub outcome_column: String,
    /// Optional column holding the clinician triage category (0..=3).
    pub triage_column: Option<String>,
    /// Columns to skip entirely, e.g. a row-index column.
    pub ignore_columns: Vec<String>,
}

impl Default for CohortReaderConfig {
    fn default() -> Self {
        Self {
            outcome_column: "s30d".to_string(),
            triage_column: Some("tc".to_string()),
            ignore_columns: Vec::new(),
        }
    }
}

/// Read a headered cohort CSV into a `Cohort` using the default column names.
pub fn read_cohort_csv<P: AsRef<Path>>(path: P) -> Result<Cohort> {
    read_cohort_csv_with_config(path, &CohortReaderConfig::default())
}

/// Read a headered cohort CSV using a custom configuration. All columns not
/// named as outcome, triage, or ignored are treated as numeric features.
pub fn read_cohort_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &CohortReaderConfig,
) -> Result<Cohort> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open cohort file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read cohort header row")?
        .clone();

    let outcome_idx = find_column(&headers, &config.outcome_column)
        .ok_or_else(|| anyhow!("Missing outcome column '{}'", config.outcome_column))?;
    let triage_idx = match &config.triage_column {
        Some(name) => Some(
            find_column(&headers, name)
                .ok_or_else(|| anyhow!("Missing triage column '{}'", name))?,
        ),
        None => None,
    };

    let feature_indices: Vec<usize> = (0..headers.len())
        .filter(|&idx| {
            idx != outcome_idx
                && Some(idx) != triage_idx
                && !config
                    .ignore_columns
                    .iter()
                    .any(|name| headers.get(idx).map_or(false, |h| h.eq_ignore_ascii_case(name)))
        })
        .collect();
    if feature_indices.is_empty() {
        return Err(anyhow!("No feature columns detected in cohort header"));
    }

    let mut features = Vec::new();
    let mut outcomes = Vec::new();
    let mut triage = triage_idx.map(|_| Vec::new());

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let outcome = parse_cell::<i32>(&record, outcome_idx, &headers, row_idx)?;
        if outcome != 0 && outcome != 1 {
            return Err(anyhow!(
                "Outcome at row {} must be 0 or 1, got {}",
                row_idx + 1,
                outcome
            ));
        }
        outcomes.push(outcome);

        if let (Some(idx), Some(values)) = (triage_idx, triage.as_mut()) {
            let category = parse_cell::<u8>(&record, idx, &headers, row_idx)?;
            if category > 3 {
                return Err(anyhow!(
                    "Triage category at row {} must be 0..=3, got {}",
                    row_idx + 1,
                    category
                ));
            }
            values.push(category);
        }

        for &idx in &feature_indices {
            features.push(parse_cell::<f32>(&record, idx, &headers, row_idx)?);
        }
    }

    let n_samples = outcomes.len();
    let x = Array2::from_shape_vec((n_samples, feature_indices.len()), features)
        .context("Failed to build feature matrix")?;
    let feature_names = feature_indices
        .iter()
        .map(|&idx| headers.get(idx).unwrap_or("").to_string())
        .collect();

    Cohort::new(x, outcomes, triage, feature_names).map_err(Into::into)
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn parse_cell<T: std::str::FromStr>(
    record: &StringRecord,
    idx: usize,
    headers: &StringRecord,
    row_idx: usize,
) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    record
        .get(idx)
        .ok_or_else(|| anyhow!("Missing value at row {}", row_idx + 1))?
        .trim()
        .parse::<T>()
        .with_context(|| {
            format!(
                "Invalid value in column '{}' at row {}",
                headers.get(idx).unwrap_or(""),
                row_idx + 1
            )
        })
}
