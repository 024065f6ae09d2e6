use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid similarity parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Errors raised while rendering or writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("render error: {0}")]
    Render(#[from] std::io::Error),

    #[error("invalid row {line} in {}: {reason}", path.display())]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
}
