//! Archive extraction for compressed geospatial containers (KMZ)
//!
//! Every extraction gets its own randomly named scratch directory under the
//! configured scratch root. The returned `ExtractedFile` owns that directory
//! and removes it when dropped, so callers never clean up by hand.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipArchive;

use crate::error::{GeolayerError, Result};

/// A file extracted from an archive, alive as long as this guard is
#[derive(Debug)]
pub struct ExtractedFile {
    path: PathBuf,
    entry_name: String,
    // Dropped last; removes the scratch directory
    scratch: TempDir,
}

impl ExtractedFile {
    /// Path of the extracted file inside the scratch directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the entry inside the archive
    pub fn entry_name(&self) -> &str {
        &self.entry_name
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// Extracts embedded files from zip containers into call-scoped scratch space
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    scratch_root: PathBuf,
}

impl ArchiveExtractor {
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Extract the first entry (in archive order) whose name ends in `.{extension}`
    pub fn extract_first(&self, archive_path: &Path, extension: &str) -> Result<ExtractedFile> {
        let file = File::open(archive_path).map_err(|e| open_failure(archive_path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| open_failure(archive_path, e))?;

        fs::create_dir_all(&self.scratch_root)?;
        let scratch = tempfile::Builder::new()
            .prefix("kmz-")
            .tempdir_in(&self.scratch_root)?;

        let suffix = format!(".{}", extension.to_ascii_lowercase());

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| open_failure(archive_path, e))?;
            if entry.is_dir() {
                continue;
            }

            // Entries whose names escape the scratch directory never match
            let Some(name) = entry.enclosed_name().map(Path::to_path_buf) else {
                tracing::warn!(entry = entry.name(), "Skipping archive entry with unsafe path");
                continue;
            };

            if !entry.name().to_ascii_lowercase().ends_with(&suffix) {
                continue;
            }

            let file_name = name
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(format!("doc{}", suffix)));
            let target = scratch.path().join(file_name);

            let mut outfile = File::create(&target)?;
            io::copy(&mut entry, &mut outfile).map_err(|e| GeolayerError::GeoReadError {
                format: "KMZ".to_string(),
                attempts: vec![format!("extract {}: {}", entry.name(), e)],
                cause: e.to_string(),
            })?;

            tracing::debug!(
                archive = %archive_path.display(),
                entry = entry.name(),
                scratch = %scratch.path().display(),
                "Extracted archive entry"
            );

            return Ok(ExtractedFile {
                path: target,
                entry_name: entry.name().to_string(),
                scratch,
            });
        }

        Err(GeolayerError::NoEmbeddedFile {
            archive: archive_path.to_path_buf(),
            target: extension.to_string(),
        })
    }
}

fn open_failure(archive_path: &Path, e: impl std::fmt::Display) -> GeolayerError {
    let cause = format!("Failed to open archive {}: {}", archive_path.display(), e);
    GeolayerError::GeoReadError {
        format: "KMZ".to_string(),
        attempts: vec![format!("zip: {}", cause)],
        cause,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip_file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(&mut zip_file);
        for (name, contents) in entries {
            writer
                .start_file(
                    *name,
                    FileOptions::default().compression_method(zip::CompressionMethod::Stored),
                )
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn scratch_entries(root: &Path) -> usize {
        fs::read_dir(root).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_extracts_first_kml_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("trip.kmz");
        write_zip(
            &archive,
            &[
                ("images/icon.png", "png"),
                ("files/Doc.KML", "<kml>first</kml>"),
                ("second.kml", "<kml>second</kml>"),
            ],
        );

        let scratch_root = temp_dir.path().join("scratch");
        let extractor = ArchiveExtractor::new(&scratch_root);
        let extracted = extractor.extract_first(&archive, "kml").unwrap();

        assert_eq!(extracted.entry_name(), "files/Doc.KML");
        assert_eq!(fs::read_to_string(extracted.path()).unwrap(), "<kml>first</kml>");
        assert!(extracted.scratch_dir().starts_with(&scratch_root));

        let scratch = extracted.scratch_dir().to_path_buf();
        drop(extracted);
        assert!(!scratch.exists());
        assert_eq!(scratch_entries(&scratch_root), 0);
    }

    #[test]
    fn test_no_embedded_file_cleans_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("empty.kmz");
        write_zip(&archive, &[("readme.txt", "nothing here")]);

        let scratch_root = temp_dir.path().join("scratch");
        let err = ArchiveExtractor::new(&scratch_root)
            .extract_first(&archive, "kml")
            .unwrap_err();

        assert!(matches!(err, GeolayerError::NoEmbeddedFile { .. }));
        assert_eq!(scratch_entries(&scratch_root), 0);
    }

    #[test]
    fn test_corrupt_archive_is_read_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("broken.kmz");
        fs::write(&archive, "not a zip file").unwrap();

        let scratch_root = temp_dir.path().join("scratch");
        let err = ArchiveExtractor::new(&scratch_root)
            .extract_first(&archive, "kml")
            .unwrap_err();

        match err {
            GeolayerError::GeoReadError { format, .. } => assert_eq!(format, "KMZ"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(scratch_entries(&scratch_root), 0);
    }

    #[test]
    fn test_concurrent_extractions_use_distinct_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let archive = temp_dir.path().join("a.kmz");
        write_zip(&archive, &[("doc.kml", "<kml/>")]);

        let extractor = ArchiveExtractor::new(temp_dir.path().join("scratch"));
        let first = extractor.extract_first(&archive, "kml").unwrap();
        let second = extractor.extract_first(&archive, "kml").unwrap();

        assert_ne!(first.scratch_dir(), second.scratch_dir());
    }
}
