//! Header collaborators for the first file of a sequence
//!
//! The stream reader treats the header as an opaque blob. It only needs to
//! know how many leading bytes of the first file to skip, which is what a
//! [`HeaderParser`] reports.
//!
//! PSRDADA recorders write an ASCII header of `KEY value` lines padded with
//! NUL bytes up to `HDR_SIZE` bytes. [`DadaHeaderParser`] understands that
//! layout.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::{DadaSeqError, Result};

/// Size of a PSRDADA header when the recorder uses the default layout
pub const DADA_DEFAULT_HEADER_SIZE: usize = 4096;

/// Key holding the header length in bytes
pub const HDR_SIZE_KEY: &str = "HDR_SIZE";

/// Reports the size of the header at the start of the first file
pub trait HeaderParser: Send + Sync {
    /// Consume the leading bytes of `source` and return the header length
    ///
    /// `source` is positioned at the start of the first file. The reader
    /// repositions the file afterwards, so parsers may read past the header.
    ///
    /// # Errors
    ///
    /// Returns error if the header cannot be read or understood
    fn header_size(&self, source: &mut dyn Read) -> Result<u64>;
}

/// Header of a fixed, caller-supplied size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeader(pub u64);

impl HeaderParser for FixedHeader {
    fn header_size(&self, _source: &mut dyn Read) -> Result<u64> {
        Ok(self.0)
    }
}

/// Parser for PSRDADA ASCII headers
#[derive(Debug, Clone, Copy, Default)]
pub struct DadaHeaderParser;

impl HeaderParser for DadaHeaderParser {
    fn header_size(&self, source: &mut dyn Read) -> Result<u64> {
        DadaHeader::read_from(source).map(|header| header.header_size())
    }
}

/// Parsed PSRDADA header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DadaHeader {
    size: u64,
    fields: BTreeMap<String, String>,
}

impl DadaHeader {
    /// Read and parse a header from the start of `source`
    ///
    /// # Errors
    ///
    /// Returns error if reading fails, the text is not ASCII, or `HDR_SIZE`
    /// is missing or malformed
    pub fn read_from(source: &mut dyn Read) -> Result<Self> {
        let mut raw = Vec::with_capacity(DADA_DEFAULT_HEADER_SIZE);
        source
            .take(DADA_DEFAULT_HEADER_SIZE as u64)
            .read_to_end(&mut raw)?;

        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let text = std::str::from_utf8(&raw[..end])
            .map_err(|e| DadaSeqError::InvalidHeader(format!("Header is not ASCII text: {e}")))?;

        Self::parse(text)
    }

    /// Parse a header from the start of the file at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or the header is invalid
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Parse header text
    ///
    /// # Errors
    ///
    /// Returns error if `HDR_SIZE` is missing or not an integer
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = BTreeMap::new();

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let (key, value) = match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key, value.trim()),
                None => (line, ""),
            };
            fields.insert(key.to_string(), value.to_string());
        }

        let size = fields
            .get(HDR_SIZE_KEY)
            .ok_or_else(|| DadaSeqError::InvalidHeader(format!("Missing {HDR_SIZE_KEY}")))?
            .parse::<u64>()
            .map_err(|e| DadaSeqError::InvalidHeader(format!("Bad {HDR_SIZE_KEY}: {e}")))?;

        Ok(Self { size, fields })
    }

    /// Header length in bytes, as declared by `HDR_SIZE`
    #[must_use]
    pub fn header_size(&self) -> u64 {
        self.size
    }

    /// Raw value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Value for `key` parsed as `T`; `None` if absent or unparsable
    pub fn get_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| value.parse().ok())
    }

    /// All fields in key order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
