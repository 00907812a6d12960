//! Read-only access to mod archives.
//!
//! Mod jars are zip containers. [`ZipArchiveReader`] opens one and lists its entries;
//! the returned [`OpenedArchive`] owns the file handle, so the handle is closed when the
//! value is dropped, whichever way the scan ends.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use thiserror::Error;

/// One entry in an archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in the container, used to read the entry back
    pub index: usize,
    /// Entry path with `\` normalized to `/`
    pub path: String,
    /// Uncompressed size in bytes
    pub size: u64,
    pub is_dir: bool,
}

/// Errors raised while opening or reading an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to open archive {path}: {source}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a readable archive {path}: {source}")]
    Format {
        path: Utf8PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to read entry {entry}: {reason}")]
    Entry { entry: String, reason: String },

    #[error("Entry {entry} is not valid UTF-8")]
    NotText { entry: String },
}

/// Access to the bytes of entries in an opened archive.
pub trait EntryReader {
    /// Read an entry as UTF-8 text, reading at most `limit` bytes.
    fn read_text(&mut self, entry: &ArchiveEntry, limit: u64) -> Result<String, ArchiveError>;
}

/// Opens archives by path.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveReader {
    fn open(&self, path: &Utf8Path) -> Result<OpenedArchive, ArchiveError>;
}

/// An archive listing plus the handle needed to read entry contents.
pub struct OpenedArchive {
    entries: Vec<ArchiveEntry>,
    reader: Box<dyn EntryReader>,
}

impl OpenedArchive {
    pub fn new(entries: Vec<ArchiveEntry>, reader: Box<dyn EntryReader>) -> Self {
        Self { entries, reader }
    }

    /// Build an archive from in-memory `(path, contents)` pairs.
    ///
    /// Paths ending in `/` are listed as directories.
    pub fn from_memory<I, P, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<Vec<u8>>,
    {
        let mut entries = Vec::new();
        let mut contents = HashMap::new();

        for (index, (path, bytes)) in files.into_iter().enumerate() {
            let path: String = path.into();
            let path = normalize_entry_path(&path);
            let bytes: Vec<u8> = bytes.into();
            entries.push(ArchiveEntry {
                index,
                is_dir: path.ends_with('/'),
                size: bytes.len() as u64,
                path,
            });
            contents.insert(index, bytes);
        }

        Self::new(entries, Box::new(MemoryEntryReader { contents }))
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Split into the listing and the content reader so both can be used in one pass.
    pub fn split_mut(&mut self) -> (&[ArchiveEntry], &mut dyn EntryReader) {
        (&self.entries, self.reader.as_mut())
    }
}

impl std::fmt::Debug for OpenedArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedArchive")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Normalize an entry name to forward slashes.
pub fn normalize_entry_path(name: &str) -> String {
    name.replace('\\', "/")
}

/// Opens zip-format archives from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiveReader;

impl ZipArchiveReader {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveReader for ZipArchiveReader {
    fn open(&self, path: &Utf8Path) -> Result<OpenedArchive, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|source| ArchiveError::Format {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            // Raw access lists encrypted entries without needing a password
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| ArchiveError::Format {
                    path: path.to_path_buf(),
                    source,
                })?;
            entries.push(ArchiveEntry {
                index,
                path: normalize_entry_path(entry.name()),
                size: entry.size(),
                is_dir: entry.is_dir(),
            });
        }

        tracing::trace!("Opened {} with {} entries", path, entries.len());

        Ok(OpenedArchive::new(
            entries,
            Box::new(ZipEntryReader { archive }),
        ))
    }
}

struct ZipEntryReader {
    archive: zip::ZipArchive<File>,
}

impl EntryReader for ZipEntryReader {
    fn read_text(&mut self, entry: &ArchiveEntry, limit: u64) -> Result<String, ArchiveError> {
        let file = self
            .archive
            .by_index(entry.index)
            .map_err(|e| ArchiveError::Entry {
                entry: entry.path.clone(),
                reason: e.to_string(),
            })?;

        let mut bytes = Vec::new();
        file.take(limit)
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Entry {
                entry: entry.path.clone(),
                reason: e.to_string(),
            })?;

        String::from_utf8(bytes).map_err(|_| ArchiveError::NotText {
            entry: entry.path.clone(),
        })
    }
}

struct MemoryEntryReader {
    contents: HashMap<usize, Vec<u8>>,
}

impl EntryReader for MemoryEntryReader {
    fn read_text(&mut self, entry: &ArchiveEntry, limit: u64) -> Result<String, ArchiveError> {
        let bytes = self
            .contents
            .get(&entry.index)
            .ok_or_else(|| ArchiveError::Entry {
                entry: entry.path.clone(),
                reason: "no such entry".to_string(),
            })?;

        let end = bytes.len().min(usize::try_from(limit).unwrap_or(usize::MAX));
        String::from_utf8(bytes[..end].to_vec()).map_err(|_| ArchiveError::NotText {
            entry: entry.path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(dir: &TempDir, name: &str, files: &[(&str, &str)]) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (entry, body) in files {
            zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        path
    }

    #[test]
    fn test_open_lists_entries() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(
            &dir,
            "sample.jar",
            &[
                ("fabric.mod.json", r#"{"id":"sample"}"#),
                ("data/sample/recipes/a.json", "{}"),
            ],
        );

        let archive = ZipArchiveReader::new().open(&path).unwrap();
        let paths: Vec<&str> = archive.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["fabric.mod.json", "data/sample/recipes/a.json"]);
        assert_eq!(archive.entries()[0].size, 15);
    }

    #[test]
    fn test_read_text_respects_limit() {
        let dir = TempDir::new().unwrap();
        let path = write_zip(&dir, "sample.jar", &[("notes.txt", "hello world")]);

        let mut archive = ZipArchiveReader::new().open(&path).unwrap();
        let (entries, reader) = archive.split_mut();
        let text = reader.read_text(&entries[0], 5).unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("broken.jar")).unwrap();
        std::fs::write(&path, b"definitely not a zip file").unwrap();

        let err = ZipArchiveReader::new().open(&path).unwrap_err();
        assert!(matches!(err, ArchiveError::Format { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let err = ZipArchiveReader::new()
            .open(Utf8Path::new("/nonexistent/missing.jar"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_memory_archive_normalizes_paths() {
        let mut archive = OpenedArchive::from_memory(vec![
            ("assets\\demo\\lang\\en_us.json", "{}"),
            ("data/", ""),
        ]);
        assert_eq!(archive.entries()[0].path, "assets/demo/lang/en_us.json");
        assert!(archive.entries()[1].is_dir);

        let (entries, reader) = archive.split_mut();
        assert_eq!(reader.read_text(&entries[0], 1024).unwrap(), "{}");
    }

    #[test]
    fn test_memory_archive_rejects_binary_text() {
        let mut archive = OpenedArchive::from_memory(vec![("fabric.mod.json", vec![0xffu8, 0xfe])]);
        let (entries, reader) = archive.split_mut();
        assert!(matches!(
            reader.read_text(&entries[0], 1024),
            Err(ArchiveError::NotText { .. })
        ));
    }
}
