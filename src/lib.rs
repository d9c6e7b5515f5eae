//! dadaseq - read split DADA recordings as one seekable stream
//!
//! Recorders rotate a continuous acquisition into several same-format files
//! with a single header at the start of the first one. [`MultiFileReader`]
//! presents such a sequence as one logical byte stream that begins right
//! after the header.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod header;
pub mod stream;

pub use error::{DadaSeqError, Result};
pub use header::{DadaHeader, DadaHeaderParser, FixedHeader, HeaderParser};
pub use stream::{FileEntry, FileSet, MultiFileReader};
