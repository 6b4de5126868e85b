//! File-system capability used by the tail cursor.
//!
//! Every read opens the file, stats the open handle, seeks, reads and closes
//! again, so a session never holds a descriptor between wake-ups.

use std::fs::{File, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Identity of the file currently behind a path. A change means the path now
/// names a different file (rotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(u64, u64);

impl FileId {
    pub const fn new(hi: u64, lo: u64) -> Self {
        Self(hi, lo)
    }

    /// Device and inode.
    #[cfg(unix)]
    pub fn of(meta: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self(meta.dev(), meta.ino())
    }

    /// Creation time, where the platform has no inode equivalent.
    #[cfg(not(unix))]
    pub fn of(meta: &Metadata) -> Self {
        let created = meta
            .created()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .unwrap_or_default();
        Self(created.as_secs(), u64::from(created.subsec_nanos()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub len: u64,
    pub id: FileId,
}

/// Bytes read from a file plus the stat of the handle they came from.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub stat: FileStat,
    pub bytes: Vec<u8>,
}

pub trait FileSystem: Send + Sync + 'static {
    /// Stat `path`. `Ok(None)` when nothing exists there.
    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>>;

    /// Read up to `max` bytes starting at `offset`. `Ok(None)` when the file
    /// disappeared before it could be opened.
    fn read_from(&self, path: &Path, offset: u64, max: usize) -> io::Result<Option<Chunk>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &Path) -> io::Result<Option<FileStat>> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(Some(stat_of(&meta))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn read_from(&self, path: &Path, offset: u64, max: usize) -> io::Result<Option<Chunk>> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let stat = stat_of(&file.metadata()?);
        let mut bytes = Vec::new();
        if offset < stat.len {
            file.seek(SeekFrom::Start(offset))?;
            file.take(max as u64).read_to_end(&mut bytes)?;
        }
        Ok(Some(Chunk { stat, bytes }))
    }
}

fn stat_of(meta: &Metadata) -> FileStat {
    FileStat {
        len: meta.len(),
        id: FileId::of(meta),
    }
}

// ---------------------------------------------------------------------------
// In-memory double
// ---------------------------------------------------------------------------
