//! Schema Flattener & Exporter
//!
//! Writes the collected inventory as CSV: `resource_type`, `prefix`,
//! `compartment_name`, then the shared and specific property columns of
//! the property schema. Every row uses the same columns whatever its kind.

use crate::error::{InventoryError, InventoryResult};
use crate::resource::{get, CompartmentRegistry, PropertyColumns, PropertySchema, ResourceRecord};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Columns written before the property columns
pub const FIXED_COLUMNS: [&str; 3] = ["resource_type", "prefix", "compartment_name"];

/// Run timestamp token, e.g. `20240115-1030`
pub fn run_prefix(now: DateTime<Local>) -> String {
    now.format("%Y%m%d-%H%M").to_string()
}

/// Report file name for a prefix
pub fn report_file_name(prefix: &str) -> String {
    format!("{}_resources.csv", prefix)
}

pub struct CsvExporter {
    columns: PropertyColumns,
    prefix: String,
}

impl CsvExporter {
    pub fn new(schema: &PropertySchema, prefix: &str) -> Self {
        Self {
            columns: schema.columns(),
            prefix: prefix.to_string(),
        }
    }

    pub fn columns(&self) -> &PropertyColumns {
        &self.columns
    }

    pub fn header(&self) -> Vec<&str> {
        FIXED_COLUMNS
            .iter()
            .copied()
            .chain(self.columns.all())
            .collect()
    }

    /// One CSV row for a record
    pub fn row(&self, record: &ResourceRecord, compartments: &CompartmentRegistry) -> Vec<String> {
        let compartment_id = get(record, "compartment_id", "");
        let compartment_name = compartments.name_of(&compartment_id).unwrap_or_default();

        let mut row = Vec::with_capacity(FIXED_COLUMNS.len() + self.columns.len());
        row.push(record.kind.label().to_string());
        row.push(self.prefix.clone());
        row.push(compartment_name.to_string());
        row.extend(self.columns.all().map(|path| get(record, path, "")));
        row
    }

    /// Write header and rows to any writer. Returns the number of rows.
    pub fn write<W: Write>(
        &self,
        writer: W,
        records: &[ResourceRecord],
        compartments: &CompartmentRegistry,
    ) -> InventoryResult<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.header())?;

        for record in records {
            csv_writer.write_record(self.row(record, compartments))?;
        }

        csv_writer.flush().map_err(|e| InventoryError::Export {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        Ok(records.len())
    }

    /// Write `<dir>/<prefix>_resources.csv`
    pub fn write_file(
        &self,
        dir: &Path,
        records: &[ResourceRecord],
        compartments: &CompartmentRegistry,
    ) -> InventoryResult<PathBuf> {
        let path = dir.join(report_file_name(&self.prefix));
        let export_error = |message: String| InventoryError::Export {
            path: path.clone(),
            message,
        };

        std::fs::create_dir_all(dir).map_err(|e| export_error(e.to_string()))?;
        let file = std::fs::File::create(&path).map_err(|e| export_error(e.to_string()))?;

        let rows = self
            .write(std::io::BufWriter::new(file), records, compartments)
            .map_err(|e| export_error(e.to_string()))?;

        tracing::info!("Wrote {} rows to {}", rows, path.display());
        Ok(path)
    }
}
