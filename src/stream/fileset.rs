//! Ordered file sets and their logical layout

use std::fs;
use std::path::{Path, PathBuf};

use crate::{DadaSeqError, Result};

/// One file of a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path to the file
    pub path: PathBuf,
    /// On-disk size in bytes
    pub size: u64,
}

/// Ordered, immutable list of files read as one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    entries: Vec<FileEntry>,
}

impl FileSet {
    /// Stat every path, in read order
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the list is empty or a path cannot
    /// be stat'd or is not a regular file
    pub fn new<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let entries = paths
            .into_iter()
            .map(|path| stat(path.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if entries.is_empty() {
            return Err(DadaSeqError::Configuration(
                "At least one file must be given".to_string(),
            ));
        }

        Ok(Self { entries })
    }

    /// Number of files
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; a file set holds at least one file
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    /// All files in read order
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Sum of on-disk sizes
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Size of the first file
    #[must_use]
    pub fn first_size(&self) -> u64 {
        self.entries[0].size
    }
}

fn stat(path: &Path) -> Result<FileEntry> {
    let metadata = fs::metadata(path).map_err(|e| {
        DadaSeqError::Configuration(format!("Cannot stat {}: {e}", path.display()))
    })?;

    if !metadata.is_file() {
        return Err(DadaSeqError::Configuration(format!(
            "Not a regular file: {}",
            path.display()
        )));
    }

    Ok(FileEntry {
        path: path.to_path_buf(),
        size: metadata.len(),
    })
}

/// Mapping between logical offsets and (file, byte offset) positions
///
/// Fixed once the header size is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    header_size: u64,
    /// Logical offset of the first readable byte of each file
    starts: Vec<u64>,
    total: u64,
}

impl Layout {
    /// Build the layout for `files` with a header of `header_size` bytes in file 0
    ///
    /// The caller guarantees `header_size <= files.first_size()`.
    pub(crate) fn new(files: &FileSet, header_size: u64) -> Self {
        debug_assert!(header_size <= files.first_size());

        let mut starts = Vec::with_capacity(files.len());
        let mut total = 0u64;
        for (index, entry) in files.entries().iter().enumerate() {
            starts.push(total);
            total += entry.size - if index == 0 { header_size } else { 0 };
        }

        Self {
            header_size,
            starts,
            total,
        }
    }

    pub(crate) fn header_size(&self) -> u64 {
        self.header_size
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Logical offset at which file `index` begins; `total` for `index == N`
    pub(crate) fn start(&self, index: usize) -> u64 {
        self.starts.get(index).copied().unwrap_or(self.total)
    }

    /// Byte offset in file `index` where its logical data begins
    pub(crate) fn data_offset(&self, index: usize) -> u64 {
        if index == 0 {
            self.header_size
        } else {
            0
        }
    }

    /// File and in-file byte offset holding logical offset `target`
    ///
    /// `target` must be below `total`. Files contributing no logical bytes
    /// are never returned.
    pub(crate) fn locate(&self, target: u64) -> (usize, u64) {
        debug_assert!(target < self.total);

        let index = self.starts.partition_point(|&start| start <= target) - 1;
        let offset = self.data_offset(index) + (target - self.starts[index]);
        (index, offset)
    }
}
