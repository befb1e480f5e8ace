// ABOUTME: Minimal filesystem surface for the extractor.
// ABOUTME: OsFileSystem writes to disk; MemoryFileSystem backs tests.

use std::collections::HashMap;
use std::fmt::Debug;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Readable, seekable handle onto an archive source.
pub trait ReadSeek: Read + Seek + Send + Debug {}

impl<T: Read + Seek + Send + Debug> ReadSeek for T {}

/// The filesystem operations extraction needs.
///
/// Mode bits follow unix semantics; implementations on platforms without
/// them may ignore the mode.
pub trait FileSystem: Send + Sync {
    /// Create `path` and any missing ancestors with the given mode.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Open `path` for random-access reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>>;

    /// Write `contents` to `path` with the given mode, creating the file or
    /// truncating an existing one.
    fn write_file(&self, path: &Path, mode: u32, contents: &mut dyn Read) -> io::Result<()>;
}

/// The host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            std::fs::DirBuilder::new().recursive(true).mode(mode).create(path)
        }
        #[cfg(not(unix))]
        {
            let _ = mode;
            std::fs::create_dir_all(path)
        }
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(std::fs::File::open(path)?))
    }

    fn write_file(&self, path: &Path, mode: u32, contents: &mut dyn Read) -> io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        let mut file = options.open(path)?;
        io::copy(contents, &mut file)?;

        // The open mode only applies to newly created files and is masked
        // by the umask; the recorded mode wins either way.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(mode))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        Ok(())
    }
}

/// An entry in the in-memory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEntry {
    File { data: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
}

/// In-memory filesystem for extractor tests.
#[derive(Default)]
pub struct MemoryFileSystem {
    entries: Mutex<HashMap<PathBuf, MemoryEntry>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating no parent directories.
    pub fn insert_file(&self, path: impl Into<PathBuf>, data: Vec<u8>, mode: u32) {
        self.entries
            .lock()
            .unwrap()
            .insert(path.into(), MemoryEntry::File { data, mode });
    }

    pub fn entry(&self, path: &Path) -> Option<MemoryEntry> {
        self.entries.lock().unwrap().get(path).cloned()
    }

    pub fn file_contents(&self, path: &Path) -> Option<Vec<u8>> {
        match self.entry(path)? {
            MemoryEntry::File { data, .. } => Some(data),
            MemoryEntry::Dir { .. } => None,
        }
    }

    pub fn file_mode(&self, path: &Path) -> Option<u32> {
        match self.entry(path)? {
            MemoryEntry::File { mode, .. } => Some(mode),
            MemoryEntry::Dir { mode } => Some(mode),
        }
    }
}

impl FileSystem for MemoryFileSystem {
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            entries
                .entry(current.clone())
                .or_insert(MemoryEntry::Dir { mode });
        }
        Ok(())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        match self.entries.lock().unwrap().get(path) {
            Some(MemoryEntry::File { data, .. }) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(MemoryEntry::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
        }
    }

    fn write_file(&self, path: &Path, mode: u32, contents: &mut dyn Read) -> io::Result<()> {
        let mut data = Vec::new();
        contents.read_to_end(&mut data)?;
        self.entries
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), MemoryEntry::File { data, mode });
        Ok(())
    }
}
