// Packaging service — bundles a selected subset of a session's images into a
// deflate zip in the archive output directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::session::{is_safe_filename, Session};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct PackageResult {
    /// Archive filename within the output directory.
    pub zip_file: String,
    /// Number of images actually written into the archive.
    pub included: usize,
}

pub struct Packager {
    output_dir: PathBuf,
}

impl Packager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build the archive for `selected` filenames out of `session`'s staging
    /// directory. Names that are unsafe or missing on disk are skipped with a
    /// warning; the archive holds whatever subset survives. The archive name
    /// is deterministic per session, so repackaging overwrites.
    pub fn package(&self, session: &Session, selected: &[String]) -> Result<PackageResult> {
        if selected.is_empty() {
            return Err(Error::validation("No images selected"));
        }

        // A concurrent purge may have deleted the staging directory already;
        // that makes the session invalid, not the process broken.
        if !session.staging_path.is_dir() {
            return Err(Error::invalid_session(format!(
                "staging directory for session {} is gone",
                session.id
            )));
        }

        let zip_file = format!("{}_{}_selected.zip", slugify(&session.query), session.id);
        let zip_path = self.output_dir.join(&zip_file);
        fs::create_dir_all(&self.output_dir)?;

        let mut writer = ZipWriter::new(File::create(&zip_path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut included = 0usize;
        for name in selected {
            if !is_safe_filename(name) {
                warn!("rejected unsafe filename in selection: {:?}", name);
                continue;
            }
            let file_path = session.staging_path.join(name);
            if !file_path.is_file() {
                warn!("selected file not found, skipping: {}", file_path.display());
                continue;
            }

            writer.start_file(name.as_str(), options)?;
            let mut src = File::open(&file_path)?;
            io::copy(&mut src, &mut writer)?;
            included += 1;
        }

        // Zero survivors still produce a valid (near-empty) archive; the
        // caller reports included == 0 rather than failing.
        writer.finish()?;

        info!(
            "created archive {} with {} image(s) for session {}",
            zip_file, included, session.id
        );
        Ok(PackageResult { zip_file, included })
    }
}

/// Reduce a query string to a filesystem-friendly slug for the archive name.
fn slugify(query: &str) -> String {
    let slug: String = query
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "query".to_string()
    } else {
        slug
    }
}
