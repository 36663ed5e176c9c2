/// Export adapters: every sink takes a [`Table`](crate::data::table::Table)
/// or a small summary and returns the encoded file as bytes. Writing the
/// bytes to disk is left to the caller.
pub mod chart;
pub mod csv;
pub mod pdf;
pub mod xlsx;

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: {0}")]
    Empty(&'static str),
    #[error("CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Excel: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("chart rendering: {0}")]
    Chart(String),
    #[error("PNG encoding: {0}")]
    Image(#[from] image::ImageError),
    #[error("PDF: {0}")]
    Pdf(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write an export buffer to `path`.
pub fn save(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, bytes)?;
    log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
