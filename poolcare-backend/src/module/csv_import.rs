///! CSV reading import
///!
///! Expected header: `timestamp,chlorine,ph,alkalinity,temperature,notes`.
///! Measurement columns may be blank; `notes` may be omitted.

use anyhow::Result;
use poolcare_common::{ChemicalReading, Measurements};
use serde::Deserialize;

/// One CSV row before conversion
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    #[serde(default)]
    chlorine: Option<f64>,
    #[serde(default)]
    ph: Option<f64>,
    #[serde(default)]
    alkalinity: Option<f64>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
}

impl CsvRow {
    fn into_reading(self) -> Result<ChemicalReading> {
        let measurements = Measurements {
            chlorine: self.chlorine,
            ph: self.ph,
            alkalinity: self.alkalinity,
            temperature: self.temperature,
        };
        if measurements.is_empty() {
            anyhow::bail!("row has no measurements");
        }

        let reading = ChemicalReading::from_iso(&self.timestamp, measurements)?;
        Ok(match self.notes {
            Some(notes) => reading.with_notes(notes),
            None => reading,
        })
    }
}

/// Readings accepted from a CSV file plus the rows that were rejected
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub readings: Vec<ChemicalReading>,
    /// 1-based data row numbers (header excluded)
    pub skipped_rows: Vec<usize>,
}

/// Parse CSV content into readings; bad rows are logged and skipped
pub fn parse_readings_csv(content: &str) -> ImportSummary {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 1;

        let parsed = result
            .map_err(anyhow::Error::from)
            .and_then(CsvRow::into_reading);

        match parsed {
            Ok(reading) => summary.readings.push(reading),
            Err(e) => {
                tracing::warn!("Skipping CSV row {}: {}", row_number, e);
                summary.skipped_rows.push(row_number);
            }
        }
    }

    tracing::debug!(
        "Parsed {} readings from CSV, {} rows skipped",
        summary.readings.len(),
        summary.skipped_rows.len()
    );

    summary
}
