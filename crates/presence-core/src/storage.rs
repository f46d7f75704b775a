//! Persisted log storage
//!
//! The log is a flat, append-only, newline-delimited text file. Live logging
//! appends; the dump engine reads it sequentially through a [`LogReader`]
//! that it owns for the whole dump. Dropping the reader closes the handle.

use alloc::collections::VecDeque;
use alloc::string::{String, ToString};

use crate::errors::StorageError;

// ----------------------------------------------------------------------------
// Storage Traits
// ----------------------------------------------------------------------------

/// Sequential reader over the log
pub trait LogReader {
    /// Next line without its line terminator, `None` at end of file
    fn next_line(&mut self) -> Result<Option<String>, StorageError>;
}

/// Append/read/remove access to the persisted log
pub trait LogStorage {
    type Reader: LogReader;

    /// Append one line; the terminator is added by the storage
    fn append_line(&mut self, line: &str) -> Result<(), StorageError>;

    /// Open the log for sequential reading
    ///
    /// Fails with [`StorageError::NotFound`] when no log exists.
    fn open_reader(&mut self) -> Result<Self::Reader, StorageError>;

    fn exists(&self) -> bool;

    /// Remove the log, returning whether it existed
    fn remove(&mut self) -> Result<bool, StorageError>;
}

// ----------------------------------------------------------------------------
// In-Memory Storage
// ----------------------------------------------------------------------------

/// Log kept in RAM, for tests and targets without a filesystem
#[derive(Debug, Default, Clone)]
pub struct MemoryLogStorage {
    contents: Option<String>,
    fail_appends: bool,
    fail_reads_after: Option<usize>,
}

impl MemoryLogStorage {
    /// Storage with no log file yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with the given lines
    pub fn with_lines<'a, I: IntoIterator<Item = &'a str>>(lines: I) -> Self {
        let mut storage = Self::new();
        for line in lines {
            let contents = storage.contents.get_or_insert_with(String::new);
            contents.push_str(line);
            contents.push('\n');
        }
        storage
    }

    /// Raw file contents, `None` when the file does not exist
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    /// Lines currently in the log
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.contents.as_deref().unwrap_or_default().lines()
    }

    /// Make every subsequent append fail
    pub fn fail_appends(&mut self, fail: bool) {
        self.fail_appends = fail;
    }

    /// Make readers fail after yielding `count` lines
    pub fn fail_reads_after(&mut self, count: usize) {
        self.fail_reads_after = Some(count);
    }
}

/// Snapshot reader over an in-memory log
#[derive(Debug)]
pub struct MemoryLogReader {
    lines: VecDeque<String>,
    fail_after: Option<usize>,
    yielded: usize,
}

impl LogReader for MemoryLogReader {
    fn next_line(&mut self) -> Result<Option<String>, StorageError> {
        if matches!(self.fail_after, Some(limit) if self.yielded >= limit) {
            return Err(StorageError::Read {
                reason: "injected read failure".to_string(),
            });
        }
        self.yielded += 1;
        Ok(self.lines.pop_front())
    }
}

impl LogStorage for MemoryLogStorage {
    type Reader = MemoryLogReader;

    fn append_line(&mut self, line: &str) -> Result<(), StorageError> {
        if self.fail_appends {
            return Err(StorageError::Append {
                reason: "injected append failure".to_string(),
            });
        }
        let contents = self.contents.get_or_insert_with(String::new);
        contents.push_str(line);
        contents.push('\n');
        Ok(())
    }

    fn open_reader(&mut self) -> Result<Self::Reader, StorageError> {
        let contents = self.contents.as_deref().ok_or_else(|| StorageError::NotFound {
            path: "memory".to_string(),
        })?;
        Ok(MemoryLogReader {
            lines: contents.lines().map(ToString::to_string).collect(),
            fail_after: self.fail_reads_after,
            yielded: 0,
        })
    }

    fn exists(&self) -> bool {
        self.contents.is_some()
    }

    fn remove(&mut self) -> Result<bool, StorageError> {
        Ok(self.contents.take().is_some())
    }
}

// ----------------------------------------------------------------------------
// File Storage
// ----------------------------------------------------------------------------

cfg_if::cfg_if! {
    if #[cfg(feature = "std")] {
        use std::fs::{self, File, OpenOptions};
        use std::io::{self, BufRead, BufReader, Read, Take, Write};
        use std::path::{Path, PathBuf};

        /// Log kept in a file on the host or a hosted filesystem
        #[derive(Debug, Clone)]
        pub struct FileLogStorage {
            path: PathBuf,
        }

        impl FileLogStorage {
            pub fn new<P: Into<PathBuf>>(path: P) -> Self {
                Self { path: path.into() }
            }

            pub fn path(&self) -> &Path {
                &self.path
            }
        }

        /// Buffered reader over the log as it was when the dump started
        ///
        /// Reading stops at the length captured on open, so lines appended
        /// during a dump are not replayed by it.
        #[derive(Debug)]
        pub struct FileLogReader {
            reader: BufReader<Take<File>>,
            buffer: String,
        }

        impl LogReader for FileLogReader {
            fn next_line(&mut self) -> Result<Option<String>, StorageError> {
                self.buffer.clear();
                let read = self
                    .reader
                    .read_line(&mut self.buffer)
                    .map_err(|e| StorageError::Read { reason: e.to_string() })?;
                if read == 0 {
                    return Ok(None);
                }
                let line = self.buffer.trim_end_matches(&['\n', '\r'][..]);
                Ok(Some(line.to_string()))
            }
        }

        impl LogStorage for FileLogStorage {
            type Reader = FileLogReader;

            fn append_line(&mut self, line: &str) -> Result<(), StorageError> {
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .map_err(|e| StorageError::Open { reason: e.to_string() })?;
                writeln!(file, "{}", line)
                    .map_err(|e| StorageError::Append { reason: e.to_string() })
            }

            fn open_reader(&mut self) -> Result<Self::Reader, StorageError> {
                let file = File::open(&self.path).map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => StorageError::NotFound {
                        path: self.path.display().to_string(),
                    },
                    _ => StorageError::Open { reason: e.to_string() },
                })?;
                let length = file
                    .metadata()
                    .map_err(|e| StorageError::Open { reason: e.to_string() })?
                    .len();
                Ok(FileLogReader {
                    reader: BufReader::new(file.take(length)),
                    buffer: String::new(),
                })
            }

            fn exists(&self) -> bool {
                self.path.is_file()
            }

            fn remove(&mut self) -> Result<bool, StorageError> {
                match fs::remove_file(&self.path) {
                    Ok(()) => Ok(true),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(StorageError::Remove { reason: e.to_string() }),
                }
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all<R: LogReader>(reader: &mut R) -> alloc::vec::Vec<String> {
        let mut lines = alloc::vec::Vec::new();
        while let Some(line) = reader.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_memory_storage_missing_log() {
        let mut storage = MemoryLogStorage::new();
        assert!(!storage.exists());
        assert!(matches!(
            storage.open_reader(),
            Err(StorageError::NotFound { .. })
        ));
        assert_eq!(storage.remove(), Ok(false));
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryLogStorage::new();
        storage.append_line("one").unwrap();
        storage.append_line("two").unwrap();

        let mut reader = storage.open_reader().unwrap();
        assert_eq!(read_all(&mut reader), alloc::vec!["one", "two"]);
        assert_eq!(storage.remove(), Ok(true));
        assert!(!storage.exists());
    }

    #[test]
    fn test_memory_reader_is_a_snapshot() {
        let mut storage = MemoryLogStorage::with_lines(["a"]);
        let mut reader = storage.open_reader().unwrap();
        storage.append_line("b").unwrap();
        assert_eq!(read_all(&mut reader), alloc::vec!["a"]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_file_storage_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileLogStorage::new(dir.path().join("presence_log.txt"));
        assert!(!storage.exists());
        assert!(matches!(
            storage.open_reader(),
            Err(StorageError::NotFound { .. })
        ));

        storage.append_line("first line").unwrap();
        storage.append_line("second line").unwrap();
        assert!(storage.exists());

        let mut reader = storage.open_reader().unwrap();
        storage.append_line("appended during read").unwrap();
        assert_eq!(read_all(&mut reader), alloc::vec!["first line", "second line"]);

        assert_eq!(storage.remove(), Ok(true));
        assert_eq!(storage.remove(), Ok(false));
    }
}
