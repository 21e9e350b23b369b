//! Bulk import of transactions from JSON or CSV
//!
//! Both formats carry the same fields as the API records:
//! `ticker, date, quantity, price, type`, with ISO dates.

use crate::error::{PortfolioError, Result};
use crate::finance::transaction::NewTransaction;
use std::io::Read;
use std::path::Path;

/// Supported import file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Csv,
}

impl ImportFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(ImportFormat::Json),
            Some("csv") => Ok(ImportFormat::Csv),
            _ => Err(PortfolioError::Parse(format!(
                "Unsupported import file: {} (expected .json or .csv)",
                path.display()
            ))),
        }
    }
}

/// Parse a JSON array of transactions
pub fn read_json<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let txns: Vec<NewTransaction> = serde_json::from_reader(reader)?;
    Ok(txns)
}

/// Parse a CSV file with a header row
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut txns = Vec::new();
    for record in csv_reader.deserialize() {
        txns.push(record?);
    }
    Ok(txns)
}

/// Read and parse an import file
pub fn read_file(path: &Path) -> Result<Vec<NewTransaction>> {
    let format = ImportFormat::from_path(path)?;
    let file = std::fs::File::open(path)?;

    let txns = match format {
        ImportFormat::Json => read_json(file)?,
        ImportFormat::Csv => read_csv(file)?,
    };

    log::debug!("Parsed {} transactions from {}", txns.len(), path.display());
    Ok(txns)
}
