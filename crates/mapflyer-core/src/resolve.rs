//! Input resolution
//!
//! Turns a caller-supplied input file (KMZ container or raw KML) into a
//! single canonical KML file on disk:
//!
//! 1. Try to open the input as a zip archive
//! 2. On success, extract everything into the staging directory and pick
//!    the first `.kml` member in archive order
//! 3. If zip sniffing fails, copy the input byte-for-byte into the staging
//!    directory as `doc.kml`

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ExtractError;

/// Canonical file name used when the input is already raw KML.
const RAW_DOC_NAME: &str = "doc.kml";

/// The resolved, on-disk KML document the extraction queries operate on.
///
/// Created by [`Resolver::resolve`] and passed by reference into the
/// extraction calls; the underlying file is never mutated after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    path: PathBuf,
}

impl ResolvedDocument {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolves an input file into a [`ResolvedDocument`] exactly once.
///
/// The first successful `resolve` call wins; later calls return the same
/// document and ignore their argument. This is a plain once-guard, not a
/// lock: the pipeline is single-threaded batch execution.
#[derive(Debug)]
pub struct Resolver {
    staging: PathBuf,
    resolved: Option<ResolvedDocument>,
}

impl Resolver {
    /// Create a resolver that stages extracted content under `staging`.
    pub fn new<P: Into<PathBuf>>(staging: P) -> Self {
        Self {
            staging: staging.into(),
            resolved: None,
        }
    }

    /// Resolve `input` to a canonical KML file.
    ///
    /// A missing or unreadable input is fatal and propagates as
    /// [`ExtractError::Io`]. A readable zip archive with no `.kml` member
    /// yields [`ExtractError::NoKmlEntry`].
    pub fn resolve(&mut self, input: &Path) -> Result<ResolvedDocument, ExtractError> {
        if let Some(doc) = &self.resolved {
            debug!(path = %doc.path().display(), "Input already resolved");
            return Ok(doc.clone());
        }

        fs::create_dir_all(&self.staging)?;

        let file = File::open(input)?;
        let doc = match ZipArchive::new(file) {
            Ok(archive) => self.extract_kmz(input, archive)?,
            // Real I/O trouble is fatal; anything else means the input is
            // not a zip container and is taken as raw KML.
            Err(ZipError::Io(e)) => return Err(e.into()),
            Err(_) => self.copy_raw(input)?,
        };

        info!(path = %doc.path().display(), "Resolved input document");
        self.resolved = Some(doc.clone());
        Ok(doc)
    }

    fn extract_kmz(
        &self,
        input: &Path,
        mut archive: ZipArchive<File>,
    ) -> Result<ResolvedDocument, ExtractError> {
        archive
            .extract(&self.staging)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;

        // First .kml member in archive order.
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| ExtractError::Archive(e.to_string()))?;
            if !entry.name().ends_with(".kml") {
                continue;
            }
            let relative = entry.enclosed_name().ok_or_else(|| {
                ExtractError::Archive(format!("Unsafe entry name: {}", entry.name()))
            })?;
            return Ok(ResolvedDocument {
                path: self.staging.join(relative),
            });
        }

        Err(ExtractError::NoKmlEntry(input.to_path_buf()))
    }

    fn copy_raw(&self, input: &Path) -> Result<ResolvedDocument, ExtractError> {
        let dest = self.staging.join(RAW_DOC_NAME);
        fs::copy(input, &dest)?;
        Ok(ResolvedDocument { path: dest })
    }
}
