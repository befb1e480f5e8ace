// ABOUTME: Materializes a zipped artifact onto a filesystem abstraction.
// ABOUTME: Preserves entry modes and optionally overlays a manifest file.

mod filesystem;

pub use filesystem::{FileSystem, MemoryEntry, MemoryFileSystem, OsFileSystem, ReadSeek};

use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

/// Remediation hint shown when an archive cannot be parsed.
const FIX_YOUR_ZIP_HINT: &str = "Please double check your zip compression method and that the correct files are zipped.
You can try confirming that it's valid on your computer by opening or performing some other action on it.
Once you've confirmed that it's valid, please try again.";

/// Mode used when an archive entry records none.
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Errors from artifact extraction. Already-written files are not cleaned
/// up on failure; the caller owns the destination.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open archive {}: {source}", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open zip file: {}: {cause}\n{}", .path.display(), FIX_YOUR_ZIP_HINT)]
    InvalidArchive { path: PathBuf, cause: String },

    #[error("cannot extract file from archive: {name}: {cause}")]
    ExtractEntry { name: String, cause: String },

    #[error("archive entry escapes the destination: {0}")]
    UnsafeEntryPath(String),

    #[error("cannot write manifest file: {0}")]
    Manifest(#[source] std::io::Error),
}

/// Unzips artifacts onto a [`FileSystem`].
pub struct Extractor<F> {
    filesystem: F,
}

impl<F: FileSystem> Extractor<F> {
    pub fn new(filesystem: F) -> Self {
        Self { filesystem }
    }

    pub fn filesystem(&self) -> &F {
        &self.filesystem
    }

    /// Extract `source` into `destination`.
    ///
    /// Every non-directory entry lands at `destination/<entry>` with the
    /// entry's recorded mode; parent directories are created with 0755. A
    /// non-empty `manifest` is written verbatim to
    /// `destination/manifest.yml` (mode 0600, truncating), overriding any
    /// manifest the archive carried. Entries whose normalized path would
    /// escape `destination` are rejected.
    pub fn unzip(
        &self,
        source: &Path,
        destination: &Path,
        manifest: &str,
    ) -> Result<(), ExtractError> {
        tracing::info!("extracting application");
        tracing::debug!(
            source = %source.display(),
            destination = %destination.display(),
            "extractor parameters"
        );

        self.filesystem
            .create_dir_all(destination, 0o755)
            .map_err(|e| ExtractError::CreateDir {
                path: destination.to_path_buf(),
                source: e,
            })?;

        let reader = self
            .filesystem
            .open(source)
            .map_err(|e| ExtractError::OpenArchive {
                path: source.to_path_buf(),
                source: e,
            })?;

        let mut archive = ZipArchive::new(reader).map_err(|e| ExtractError::InvalidArchive {
            path: source.to_path_buf(),
            cause: e.to_string(),
        })?;

        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| ExtractError::InvalidArchive {
                    path: source.to_path_buf(),
                    cause: e.to_string(),
                })?;
            self.unzip_entry(destination, entry)?;
        }

        if !manifest.is_empty() {
            self.filesystem
                .write_file(
                    &destination.join("manifest.yml"),
                    0o600,
                    &mut manifest.as_bytes(),
                )
                .map_err(ExtractError::Manifest)?;
        }

        tracing::info!("extract was successful");
        Ok(())
    }

    fn unzip_entry(
        &self,
        destination: &Path,
        mut entry: zip::read::ZipFile<'_>,
    ) -> Result<(), ExtractError> {
        if entry.is_dir() {
            // Parents are created as files are extracted.
            return Ok(());
        }

        let name = entry.name().to_string();

        // enclosed_name normalizes the entry path and refuses any that
        // escape the destination (zip-slip).
        let relative = entry
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| ExtractError::UnsafeEntryPath(name.clone()))?;
        let target = destination.join(relative);

        if let Some(parent) = target.parent() {
            self.filesystem
                .create_dir_all(parent, 0o755)
                .map_err(|e| ExtractError::ExtractEntry {
                    name: name.clone(),
                    cause: e.to_string(),
                })?;
        }

        let mode = entry.unix_mode().unwrap_or(DEFAULT_FILE_MODE);
        self.filesystem
            .write_file(&target, mode, &mut entry)
            .map_err(|e| ExtractError::ExtractEntry {
                name,
                cause: e.to_string(),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_archive(entries: &[(&str, &[u8], Option<u32>)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data, mode) in entries {
            let mut options = zip::write::FileOptions::default();
            if let Some(mode) = mode {
                options = options.unix_permissions(*mode);
            }
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn invalid_archive_error_carries_the_hint() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("/artifact.zip", b"not a zip at all".to_vec(), 0o644);

        let err = Extractor::new(fs)
            .unzip(Path::new("/artifact.zip"), Path::new("/out"), "")
            .unwrap_err();

        assert!(matches!(err, ExtractError::InvalidArchive { .. }));
        assert!(err.to_string().contains("double check your zip compression"));
    }

    #[test]
    fn entry_without_recorded_mode_gets_default() {
        let fs = MemoryFileSystem::new();
        let archive = build_archive(&[("app.js", b"console.log(1)", None)]);
        fs.insert_file("/artifact.zip", archive, 0o644);

        let extractor = Extractor::new(fs);
        extractor
            .unzip(Path::new("/artifact.zip"), Path::new("/out"), "")
            .unwrap();

        // FileOptions defaults to 0o644 when no permissions are set, which
        // matches the fallback either way.
        assert_eq!(
            extractor.filesystem().file_mode(Path::new("/out/app.js")),
            Some(0o644)
        );
    }
}
