//! Virtual byte stream over an ordered sequence of files

mod fileset;
mod reader;
mod typed;

pub use fileset::{FileEntry, FileSet};
pub use reader::MultiFileReader;
