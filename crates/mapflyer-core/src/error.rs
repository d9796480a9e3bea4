use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read archive: {0}")]
    Archive(String),

    #[error("Archive {0} contains no .kml entry")]
    NoKmlEntry(PathBuf),

    #[error("Failed to parse KML: {0}")]
    Xml(String),
}
