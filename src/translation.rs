//! Translation table: maps detection filenames to recognition filenames and
//! identity labels, and generates the identity CSV consumed downstream.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::Path;

use crate::config::IdsConfig;

/// Directory prefix recorded in the identity CSV for each segmented image.
pub const SEGMENTED_PREFIX: &str = "segmented/";

/// One row of the translation CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationRow {
    #[serde(rename = "Detection filename")]
    pub detection_filename: String,
    #[serde(rename = "Recognition filename")]
    pub recognition_filename: String,
    #[serde(rename = "Class ID")]
    pub class_id: i64,
}

/// Immutable filename translation table, loaded once per run.
#[derive(Debug)]
pub struct TranslationTable {
    rows: Vec<TranslationRow>,
}

impl TranslationTable {
    /// Load the table from a CSV file with "Detection filename",
    /// "Recognition filename" and "Class ID" columns.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("failed to open translation table {}", path.display()))?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let row: TranslationRow =
                record.with_context(|| format!("malformed row in {}", path.display()))?;
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[TranslationRow] {
        &self.rows
    }

    /// Look up the row for a detection filename. First match wins when the
    /// table carries duplicate keys. A missing entry is a hard error: it
    /// means the dataset and the table are out of sync.
    pub fn recognition_for(&self, detection_filename: &str) -> Result<&TranslationRow> {
        self.rows
            .iter()
            .find(|row| row.detection_filename == detection_filename)
            .ok_or_else(|| {
                anyhow::anyhow!("No translation table entry for '{detection_filename}'")
            })
    }
}

/// Flatten path separators so a directory-qualified recognition filename
/// becomes a plain filename (`bank/0001.png` -> `bank_0001.png`).
pub fn flatten_separators(name: &str) -> String {
    name.replace('/', "_")
}

/// Write the identity CSV: one `segmented/<flattened name>,<class id>` row
/// per table row, preserving table order. Returns the number of rows written.
pub fn write_identity_csv(table: &TranslationTable, output: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("failed to create identity CSV {}", output.display()))?;

    for row in table.rows() {
        let rec_filename = format!(
            "{SEGMENTED_PREFIX}{}",
            flatten_separators(&row.recognition_filename)
        );
        let class_id = row.class_id.to_string();
        writer.write_record([rec_filename.as_str(), class_id.as_str()])?;
    }

    writer.flush()?;
    Ok(table.len())
}

/// Run the identity CSV generation pass.
pub fn run_identity_export(config: &IdsConfig) -> Result<usize> {
    let table = TranslationTable::load(&config.translation)?;
    log::info!(
        "📇 Loaded {} translation row(s) from {}",
        table.len(),
        config.translation.display()
    );

    let written = write_identity_csv(&table, &config.output)?;
    log::info!(
        "{} Wrote {} identity row(s) to {}",
        crate::color_utils::symbols::completed_successfully(),
        written,
        config.output.display()
    );

    Ok(written)
}
