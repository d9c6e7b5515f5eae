//! Virtual stream reader over a file sequence

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::fileset::{FileEntry, FileSet, Layout};
use crate::header::{DadaHeaderParser, FixedHeader, HeaderParser};
use crate::{DadaSeqError, Result};

/// Reads an ordered sequence of files as one seekable byte stream
///
/// Logical offsets start immediately after the header of the first file and
/// run to [`total_size`](Self::total_size). At most one underlying file is
/// open at any time; crossing a boundary closes the old file before the next
/// one is opened.
///
/// All operations take `&self` and are serialized by an internal lock, so a
/// reader can be shared between threads. Each operation is applied whole.
pub struct MultiFileReader {
    files: FileSet,
    parser: Box<dyn HeaderParser>,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    /// Set by `open`, once the header size is known
    layout: Option<Layout>,
    position: Position,
}

#[derive(Debug, Default)]
struct Position {
    stream: Stream,
    cursor: Cursor,
    /// Error withheld by the `io::Read` adapter after a partial read
    pending: Option<io::Error>,
}

#[derive(Debug, Default)]
enum Stream {
    /// Not opened yet, or closed by the caller
    #[default]
    Closed,
    /// Handle for the file at `cursor.index`
    Open(File),
    /// Past the end of the last file
    Eof,
    /// An I/O error left no usable handle
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Cursor {
    /// File index; equals the file count at end of stream
    index: usize,
    /// Byte offset in the file, header included for file 0
    offset: u64,
    /// Logical offset
    position: u64,
}

impl MultiFileReader {
    /// Create a reader over `paths`
    ///
    /// With `header_size` of `None` the header length is read from the
    /// PSRDADA header of the first file when the reader is opened.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the list is empty, a path cannot be
    /// stat'd, or `header_size` exceeds the size of the first file
    pub fn new<I, P>(paths: I, header_size: Option<u64>) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let files = FileSet::new(paths)?;

        match header_size {
            Some(size) if size > files.first_size() => Err(DadaSeqError::Configuration(format!(
                "Header size {size} exceeds size of first file ({} bytes)",
                files.first_size()
            ))),
            Some(size) => Ok(Self::from_parts(files, Box::new(FixedHeader(size)))),
            None => Ok(Self::from_parts(files, Box::new(DadaHeaderParser))),
        }
    }

    /// Create a reader whose header length is reported by `parser`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the list is empty or a path cannot
    /// be stat'd
    pub fn with_parser<I, P, H>(paths: I, parser: H) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        H: HeaderParser + 'static,
    {
        Ok(Self::from_parts(FileSet::new(paths)?, Box::new(parser)))
    }

    fn from_parts(files: FileSet, parser: Box<dyn HeaderParser>) -> Self {
        Self {
            files,
            parser,
            state: Mutex::new(State::default()),
        }
    }

    /// Files in read order
    #[must_use]
    pub fn files(&self) -> &FileSet {
        &self.files
    }

    /// Header length in bytes; `None` until the reader has been opened
    pub fn header_size(&self) -> Option<u64> {
        self.lock().layout.as_ref().map(Layout::header_size)
    }

    /// Logical stream size; `None` until the reader has been opened
    pub fn total_size(&self) -> Option<u64> {
        self.lock().layout.as_ref().map(Layout::total)
    }

    /// Open the first file and position just past its header
    ///
    /// Resets the cursor if the reader was already open.
    ///
    /// # Errors
    ///
    /// Returns error if the first file cannot be opened or its header cannot
    /// be parsed
    pub fn open(&self) -> Result<()> {
        let mut state = self.lock();
        state.position.stream = Stream::Closed;

        match self.open_first() {
            Ok((file, layout)) => {
                info!(
                    "Opened sequence of {} files: header {} bytes, {} logical bytes",
                    self.files.len(),
                    layout.header_size(),
                    layout.total()
                );
                state.position = Position {
                    stream: Stream::Open(file),
                    cursor: Cursor {
                        index: 0,
                        offset: layout.header_size(),
                        position: 0,
                    },
                    pending: None,
                };
                state.layout = Some(layout);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to open file sequence: {e}");
                state.position.stream = Stream::Failed;
                state.layout = None;
                Err(e)
            }
        }
    }

    fn open_first(&self) -> Result<(File, Layout)> {
        let first = &self.files.entries()[0];
        let mut file = File::open(&first.path)?;

        let header_size = self.parser.header_size(&mut file)?;
        if header_size > first.size {
            return Err(DadaSeqError::InvalidHeader(format!(
                "Header size {header_size} exceeds size of {} ({} bytes)",
                first.path.display(),
                first.size
            )));
        }

        file.seek(SeekFrom::Start(header_size))?;
        Ok((file, Layout::new(&self.files, header_size)))
    }

    /// Close the current file and move to the start of the next one
    ///
    /// Moving past the last file enters the end-of-stream state; calling this
    /// at end of stream does nothing.
    ///
    /// # Errors
    ///
    /// Returns error if the reader is not open or the next file cannot be
    /// opened
    pub fn open_next(&self) -> Result<()> {
        let mut state = self.lock();
        let State { layout, position } = &mut *state;
        let layout = opened(layout.as_ref(), position)?;
        position.forward(&self.files, layout)
    }

    /// Close the current file and move to the end of the previous one
    ///
    /// # Errors
    ///
    /// Returns [`DadaSeqError::Boundary`] at the first file, or an error if
    /// the previous file cannot be opened
    pub fn open_previous(&self) -> Result<()> {
        let mut state = self.lock();
        let State { layout, position } = &mut *state;
        let layout = opened(layout.as_ref(), position)?;
        position.backward(&self.files, layout)
    }

    /// Move the logical cursor and return the new logical offset
    ///
    /// Valid targets lie in `[0, total_size]`. Seeking to exactly
    /// `total_size` enters the end-of-stream state. A successful seek clears
    /// a previous failure.
    ///
    /// # Errors
    ///
    /// Returns [`DadaSeqError::SeekRange`] for targets outside the stream,
    /// leaving the cursor unchanged, or an I/O error if the target file
    /// cannot be opened
    pub fn seekg(&self, pos: SeekFrom) -> Result<u64> {
        let mut state = self.lock();
        let State { layout, position } = &mut *state;
        let layout = opened(layout.as_ref(), position)?;
        position.seek(&self.files, layout, pos)
    }

    /// Current logical offset
    pub fn tellg(&self) -> u64 {
        self.lock().position.cursor.position
    }

    /// Current file index and byte offset within that file
    ///
    /// At end of stream the index equals the number of files.
    pub fn file_position(&self) -> (usize, u64) {
        let cursor = self.lock().position.cursor;
        (cursor.index, cursor.offset)
    }

    /// Whether the end of the last file has been reached
    pub fn eof(&self) -> bool {
        matches!(self.lock().position.stream, Stream::Eof)
    }

    /// Whether a file is open and no failure is pending
    pub fn good(&self) -> bool {
        matches!(self.lock().position.stream, Stream::Open(_))
    }

    /// Release the current file; idempotent
    pub fn close(&self) {
        let mut state = self.lock();
        if !matches!(state.position.stream, Stream::Closed) {
            debug!("Closing file sequence");
        }
        state.position.stream = Stream::Closed;
        state.position.pending = None;
    }

    /// Read up to `buf.len()` bytes from the logical stream
    ///
    /// Crosses as many file boundaries as needed. Returns fewer bytes than
    /// requested only when the end of the stream is reached, after which
    /// [`eof`](Self::eof) is true.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an underlying read fails. When some bytes
    /// were already copied into `buf` the error is
    /// [`DadaSeqError::PartialRead`]; the cursor then sits just after those
    /// bytes and the reader is failed until reopened or seeked.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.lock();
        let State { layout, position } = &mut *state;
        let layout = opened(layout.as_ref(), position)?;
        position.read(&self.files, layout, buf)
    }

    /// `io::Read` flavour of [`read`](Self::read)
    ///
    /// A failure after some bytes were transferred is reported as a short
    /// read; the underlying error is returned by the next call.
    fn read_io(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.lock();
        let State { layout, position } = &mut *state;
        if let Some(err) = position.pending.take() {
            return Err(err);
        }

        let layout = opened(layout.as_ref(), position)?;
        match position.read(&self.files, layout, buf) {
            Ok(n) => Ok(n),
            Err(DadaSeqError::PartialRead {
                transferred,
                source,
            }) => {
                position.pending = Some(source);
                Ok(transferred)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every operation leaves the state consistent between steps
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn opened<'a>(layout: Option<&'a Layout>, position: &Position) -> Result<&'a Layout> {
    match (layout, &position.stream) {
        (Some(layout), stream) if !matches!(stream, Stream::Closed) => Ok(layout),
        _ => Err(DadaSeqError::NotOpen),
    }
}

fn open_at(entry: &FileEntry, offset: u64) -> Result<File> {
    let mut file = File::open(&entry.path)?;
    if offset > 0 {
        file.seek(SeekFrom::Start(offset))?;
    }
    debug!("Opened {} at byte {offset}", entry.path.display());
    Ok(file)
}

/// Attach the transferred byte count to an I/O error raised mid-read
fn interrupted_at(transferred: usize, err: DadaSeqError) -> DadaSeqError {
    match err {
        DadaSeqError::Io(source) if transferred > 0 => DadaSeqError::PartialRead {
            transferred,
            source,
        },
        other => other,
    }
}

impl Position {
    fn fail(&mut self, err: DadaSeqError) -> DadaSeqError {
        warn!(
            "File sequence failed at file {} byte {}: {err}",
            self.cursor.index, self.cursor.offset
        );
        self.stream = Stream::Failed;
        err
    }

    fn forward(&mut self, files: &FileSet, layout: &Layout) -> Result<()> {
        if matches!(self.stream, Stream::Eof) {
            return Ok(());
        }

        self.stream = Stream::Closed;
        let next = (self.cursor.index + 1).min(files.len());

        let Some(entry) = files.get(next) else {
            debug!("Reached end of file sequence");
            self.stream = Stream::Eof;
            self.cursor = Cursor {
                index: next,
                offset: 0,
                position: layout.total(),
            };
            return Ok(());
        };

        match open_at(entry, 0) {
            Ok(file) => {
                self.stream = Stream::Open(file);
                self.cursor = Cursor {
                    index: next,
                    offset: 0,
                    position: layout.start(next),
                };
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn backward(&mut self, files: &FileSet, layout: &Layout) -> Result<()> {
        if self.cursor.index == 0 {
            return Err(DadaSeqError::Boundary);
        }

        self.stream = Stream::Closed;
        let previous = self.cursor.index - 1;
        let entry = &files.entries()[previous];

        match open_at(entry, entry.size) {
            Ok(file) => {
                self.stream = Stream::Open(file);
                self.cursor = Cursor {
                    index: previous,
                    offset: entry.size,
                    position: layout.start(previous + 1),
                };
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn seek(&mut self, files: &FileSet, layout: &Layout, pos: SeekFrom) -> Result<u64> {
        let total = layout.total();
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.cursor.position) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(total) + i128::from(delta),
        };

        let target = match u64::try_from(target) {
            Ok(target) if target <= total => target,
            _ => return Err(DadaSeqError::SeekRange { target, total }),
        };

        if target == total {
            debug!("Seek to end of file sequence");
            self.stream = Stream::Eof;
            self.pending = None;
            self.cursor = Cursor {
                index: files.len(),
                offset: 0,
                position: total,
            };
            return Ok(total);
        }

        let (index, offset) = layout.locate(target);

        let result = match &mut self.stream {
            Stream::Open(file) if self.cursor.index == index => file
                .seek(SeekFrom::Start(offset))
                .map(drop)
                .map_err(DadaSeqError::from),
            _ => {
                self.stream = Stream::Closed;
                match open_at(&files.entries()[index], offset) {
                    Ok(file) => {
                        self.stream = Stream::Open(file);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        };

        match result {
            Ok(()) => {
                debug!("Seek to logical offset {target} (file {index}, byte {offset})");
                self.pending = None;
                self.cursor = Cursor {
                    index,
                    offset,
                    position: target,
                };
                Ok(target)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn read(&mut self, files: &FileSet, layout: &Layout, buf: &mut [u8]) -> Result<usize> {
        if matches!(self.stream, Stream::Failed) {
            return Err(DadaSeqError::Failed);
        }

        let mut filled = 0;
        while filled < buf.len() {
            if matches!(self.stream, Stream::Eof) {
                break;
            }

            let remaining = files.entries()[self.cursor.index].size - self.cursor.offset;
            if remaining == 0 {
                self.forward(files, layout)
                    .map_err(|e| interrupted_at(filled, e))?;
                continue;
            }

            let wanted = buf.len() - filled;
            let wanted = usize::try_from(remaining).map_or(wanted, |r| r.min(wanted));

            let Stream::Open(file) = &mut self.stream else {
                return Err(DadaSeqError::Failed);
            };

            match file.read(&mut buf[filled..filled + wanted]) {
                Ok(0) => {
                    let err = io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "{} ended {remaining} bytes before its recorded size",
                            files.entries()[self.cursor.index].path.display()
                        ),
                    );
                    return Err(interrupted_at(filled, self.fail(err.into())));
                }
                Ok(n) => {
                    filled += n;
                    self.cursor.offset += n as u64;
                    self.cursor.position += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(interrupted_at(filled, self.fail(e.into()))),
            }
        }

        Ok(filled)
    }
}

impl Read for &MultiFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_io(buf)
    }
}

impl Read for MultiFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_io(buf)
    }
}

impl Seek for &MultiFileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seekg(pos).map_err(Into::into)
    }
}

impl Seek for MultiFileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seekg(pos).map_err(Into::into)
    }
}

impl fmt::Debug for MultiFileReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiFileReader")
            .field("files", &self.files)
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::FileExt;
    use std::sync::Arc;
    use std::thread;
    use tempfile::NamedTempFile;

    /// Files of the given sizes filled with a running byte counter
    fn sequence(sizes: &[usize]) -> Vec<NamedTempFile> {
        let mut counter = 0u8;
        sizes
            .iter()
            .map(|&size| {
                let mut file = NamedTempFile::new().unwrap();
                let data: Vec<u8> = (0..size)
                    .map(|_| {
                        counter = counter.wrapping_add(1);
                        counter
                    })
                    .collect();
                file.write_all(&data).unwrap();
                file.flush().unwrap();
                file
            })
            .collect()
    }

    fn reader(files: &[NamedTempFile], header_size: u64) -> MultiFileReader {
        let reader =
            MultiFileReader::new(files.iter().map(NamedTempFile::path), Some(header_size)).unwrap();
        reader.open().unwrap();
        reader
    }

    #[test]
    fn test_open_positions_after_header() {
        let files = sequence(&[1000, 500, 500]);
        let reader = reader(&files, 100);

        assert_eq!(reader.tellg(), 0);
        assert_eq!(reader.file_position(), (0, 100));
        assert_eq!(reader.total_size(), Some(1900));
        assert_eq!(reader.header_size(), Some(100));
        assert!(reader.good());
        assert!(!reader.eof());
    }

    #[test]
    fn test_header_larger_than_first_file() {
        let files = sequence(&[10, 10]);
        let result = MultiFileReader::new(files.iter().map(NamedTempFile::path), Some(11));
        assert!(matches!(result, Err(DadaSeqError::Configuration(_))));
    }

    #[test]
    fn test_operations_before_open() {
        let files = sequence(&[10]);
        let reader = MultiFileReader::new([files[0].path()], Some(0)).unwrap();

        assert_eq!(reader.total_size(), None);
        assert!(!reader.good());
        assert!(matches!(reader.read(&mut [0u8; 4]), Err(DadaSeqError::NotOpen)));
        assert!(matches!(reader.seekg(SeekFrom::Start(0)), Err(DadaSeqError::NotOpen)));
        assert!(matches!(reader.open_next(), Err(DadaSeqError::NotOpen)));
    }

    #[test]
    fn test_open_next_skips_no_header() {
        let files = sequence(&[100, 50]);
        let reader = reader(&files, 10);

        reader.open_next().unwrap();
        assert_eq!(reader.file_position(), (1, 0));
        assert_eq!(reader.tellg(), 90);

        let mut buf = [0u8; 1];
        reader.read(&mut buf).unwrap();
        assert_eq!(buf[0], 101);
    }

    #[test]
    fn test_open_next_to_end() {
        let files = sequence(&[100, 50]);
        let reader = reader(&files, 10);

        reader.open_next().unwrap();
        reader.open_next().unwrap();
        assert!(reader.eof());
        assert!(!reader.good());
        assert_eq!(reader.tellg(), 140);
        assert_eq!(reader.file_position(), (2, 0));

        // No-op at end of stream
        reader.open_next().unwrap();
        assert!(reader.eof());
        assert_eq!(reader.read(&mut [0u8; 8]).unwrap(), 0);
    }

    #[test]
    fn test_open_previous_at_first_file() {
        let files = sequence(&[100, 50]);
        let reader = reader(&files, 10);

        assert!(matches!(reader.open_previous(), Err(DadaSeqError::Boundary)));
        assert!(reader.good());
        assert_eq!(reader.file_position(), (0, 10));
    }

    #[test]
    fn test_open_previous_positions_at_end() {
        let files = sequence(&[100, 50, 20]);
        let reader = reader(&files, 10);

        reader.seekg(SeekFrom::End(0)).unwrap();
        reader.open_previous().unwrap();
        assert!(!reader.eof());
        assert!(reader.good());
        assert_eq!(reader.file_position(), (2, 20));
        assert_eq!(reader.tellg(), 160);

        reader.open_previous().unwrap();
        assert_eq!(reader.file_position(), (1, 50));
        assert_eq!(reader.tellg(), 140);
    }

    #[test]
    fn test_read_across_boundary() {
        let files = sequence(&[1000, 500, 500]);
        let reader = reader(&files, 100);

        reader.seekg(SeekFrom::Start(950)).unwrap();
        let mut buf = vec![0u8; 100];
        assert_eq!(reader.read(&mut buf).unwrap(), 100);
        assert_eq!(reader.tellg(), 1050);
        assert_eq!(reader.file_position(), (1, 50));

        // Logical byte p lives at global byte p + 100; counter starts at 1
        let expected: Vec<u8> = (1050..1150u32).map(|g| (g + 1) as u8).collect();
        assert_eq!(buf, expected);
    }

    #[test]
    fn test_short_read_at_end() {
        let files = sequence(&[1000, 500, 500]);
        let reader = reader(&files, 100);

        reader.seekg(SeekFrom::Start(1899)).unwrap();
        let mut buf = [0u8; 10];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert!(reader.eof());
        assert_eq!(reader.tellg(), 1900);
    }

    #[test]
    fn test_seek_out_of_range_leaves_state() {
        let files = sequence(&[1000, 500]);
        let reader = reader(&files, 100);
        reader.seekg(SeekFrom::Start(42)).unwrap();

        let err = reader.seekg(SeekFrom::Start(1401)).unwrap_err();
        assert!(matches!(err, DadaSeqError::SeekRange { target: 1401, total: 1400 }));
        let err = reader.seekg(SeekFrom::Current(-43)).unwrap_err();
        assert!(matches!(err, DadaSeqError::SeekRange { target: -1, .. }));

        assert_eq!(reader.tellg(), 42);
        assert!(reader.good());
    }

    #[test]
    fn test_seek_within_same_file_keeps_handle() {
        let files = sequence(&[100, 100]);
        let reader = reader(&files, 0);

        reader.seekg(SeekFrom::Start(150)).unwrap();
        reader.seekg(SeekFrom::Current(-20)).unwrap();
        assert_eq!(reader.file_position(), (1, 30));

        let mut buf = [0u8; 1];
        reader.read(&mut buf).unwrap();
        assert_eq!(buf[0], 131);
    }

    #[test]
    fn test_seek_clears_eof() {
        let files = sequence(&[100, 100]);
        let reader = reader(&files, 0);

        reader.seekg(SeekFrom::End(0)).unwrap();
        assert!(reader.eof());
        reader.seekg(SeekFrom::End(-1)).unwrap();
        assert!(!reader.eof());
        assert_eq!(reader.file_position(), (1, 99));
    }

    #[test]
    fn test_close_is_idempotent() {
        let files = sequence(&[100]);
        let reader = reader(&files, 0);

        reader.close();
        reader.close();
        assert!(!reader.good());
        assert!(matches!(reader.read(&mut [0u8; 1]), Err(DadaSeqError::NotOpen)));

        reader.open().unwrap();
        assert!(reader.good());
        assert_eq!(reader.tellg(), 0);
    }

    #[test]
    fn test_truncated_file_fails_reader() {
        let files = sequence(&[100, 100]);
        let reader = reader(&files, 0);
        files[1].as_file().set_len(40).unwrap();

        reader.seekg(SeekFrom::Start(90)).unwrap();
        let mut buf = [0u8; 100];
        let err = reader.read(&mut buf).unwrap_err();
        assert!(matches!(err, DadaSeqError::PartialRead { transferred: 50, .. }));
        assert_eq!(reader.tellg(), 140);
        assert!(!reader.good());
        assert!(matches!(reader.read(&mut buf), Err(DadaSeqError::Failed)));

        // Seeking in place recovers
        reader.seekg(SeekFrom::Start(0)).unwrap();
        assert!(reader.good());
        assert_eq!(reader.read(&mut buf[..10]).unwrap(), 10);
    }

    #[test]
    fn test_io_read_reports_partial_bytes_first() {
        let files = sequence(&[100, 100]);
        let reader = reader(&files, 0);
        files[1].as_file().set_len(40).unwrap();
        reader.seekg(SeekFrom::Start(90)).unwrap();

        let mut buf = [0u8; 100];
        let n = Read::read(&mut &reader, &mut buf).unwrap();
        assert_eq!(n, 50);
        assert_eq!(reader.tellg(), 140);
        let expected: Vec<u8> = (90..140u32).map(|g| (g + 1) as u8).collect();
        assert_eq!(&buf[..n], &expected[..]);

        // The withheld error surfaces once, then the reader stays failed
        let err = Read::read(&mut &reader, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(Read::read(&mut &reader, &mut buf).is_err());

        reader.seekg(SeekFrom::Start(0)).unwrap();
        assert_eq!(Read::read(&mut &reader, &mut buf[..10]).unwrap(), 10);
    }

    #[test]
    fn test_failed_reopen_forgets_layout() {
        let files = sequence(&[100, 100]);
        let reader = MultiFileReader::new(files.iter().map(NamedTempFile::path), None).unwrap();
        let header = b"HDR_SIZE 10\n";
        files[0].as_file().write_all_at(header, 0).unwrap();
        files[0].as_file().write_all_at(&[0u8], header.len() as u64).unwrap();

        reader.open().unwrap();
        assert_eq!(reader.total_size(), Some(190));

        files[0].as_file().write_all_at(b"NCHAN 64\n", 0).unwrap();
        assert!(matches!(reader.open(), Err(DadaSeqError::InvalidHeader(_))));
        assert_eq!(reader.total_size(), None);
        assert_eq!(reader.header_size(), None);
        assert!(matches!(reader.seekg(SeekFrom::Start(0)), Err(DadaSeqError::NotOpen)));
    }

    #[test]
    fn test_missing_file_at_boundary() {
        let mut files = sequence(&[10, 10]);
        let reader = reader(&files, 0);
        files.pop().unwrap().close().unwrap();

        let err = reader.read(&mut [0u8; 15]).unwrap_err();
        assert!(matches!(err, DadaSeqError::PartialRead { transferred: 10, .. }));
        assert!(!reader.good());
        assert_eq!(reader.file_position(), (0, 10));
    }

    #[test]
    fn test_std_io_traits() {
        let files = sequence(&[30, 30]);
        let mut reader = reader(&files, 10);

        let mut out = Vec::new();
        io::copy(&mut reader, &mut out).unwrap();
        assert_eq!(out.len(), 50);
        assert!(reader.eof());

        let pos = Seek::seek(&mut reader, SeekFrom::Start(5)).unwrap();
        assert_eq!(pos, 5);
        let err = Seek::seek(&mut reader, SeekFrom::Start(51)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_shared_between_threads() {
        let files = sequence(&[64, 64, 64]);
        let reader = Arc::new(reader(&files, 0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reader = Arc::clone(&reader);
                thread::spawn(move || {
                    let mut total = 0;
                    let mut buf = [0u8; 7];
                    loop {
                        let n = reader.read(&mut buf).unwrap();
                        total += n;
                        if n < buf.len() {
                            break total;
                        }
                    }
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 192);
        assert!(reader.eof());
    }
}
