//! Reading and writing the frame archive.
//!
//! Entry order is playback order, so every operation here keeps the order in
//! which entries are stored.

use std::{
    collections::HashSet,
    fs,
    io::{self, Cursor, Read, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Zip(#[from] ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("entry name escapes the archive: {0}")]
    UnsafeName(String),

    #[error("entry {0} appears twice")]
    DuplicateEntry(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Named frame images in archive order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameBundle {
    entries: Vec<FrameEntry>,
}

impl FrameBundle {
    pub fn from_zip(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut bundle = Self::default();
        let mut seen = HashSet::new();

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_owned();
            if file.enclosed_name().is_none() {
                return Err(ArchiveError::UnsafeName(name));
            }
            if !seen.insert(name.clone()) {
                return Err(ArchiveError::DuplicateEntry(name));
            }

            let mut data = Vec::with_capacity(file.size().min(1 << 24) as usize);
            file.read_to_end(&mut data)?;
            bundle.entries.push(FrameEntry { name, data });
        }

        Ok(bundle)
    }

    pub fn push(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.entries.push(FrameEntry {
            name: name.into(),
            data,
        });
    }

    /// Serialize as a new archive; entries are stored uncompressed like the
    /// archives the image host serves.
    pub fn to_zip(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.data)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Write every entry as a file under `dir`, returning the paths in order.
    pub fn unpack_into(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let path = dir.join(&entry.name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &entry.data)?;
            paths.push(path);
        }
        Ok(paths)
    }

    pub fn entries(&self) -> &[FrameEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
