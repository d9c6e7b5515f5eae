//! Typed reads of plain-data values

use bytemuck::Pod;

use super::MultiFileReader;
use crate::{DadaSeqError, Result};

impl MultiFileReader {
    /// Read one value of type `T` from the logical stream
    ///
    /// Reads exactly `size_of::<T>()` bytes, crossing file boundaries as
    /// needed, and reinterprets them in native byte order.
    ///
    /// # Errors
    ///
    /// Returns [`DadaSeqError::ShortValue`] if the stream ends before the
    /// value is complete, or any error [`read`](Self::read) returns
    pub fn read_value<T: Pod>(&self) -> Result<T> {
        let mut value = T::zeroed();
        self.read_exact_bytes(bytemuck::bytes_of_mut(&mut value))?;
        Ok(value)
    }

    /// Fill `values` from the logical stream
    ///
    /// # Errors
    ///
    /// Returns [`DadaSeqError::ShortValue`] if the stream ends before every
    /// value is complete, or any error [`read`](Self::read) returns
    pub fn read_values<T: Pod>(&self, values: &mut [T]) -> Result<()> {
        self.read_exact_bytes(bytemuck::cast_slice_mut(values))
    }

    fn read_exact_bytes(&self, bytes: &mut [u8]) -> Result<()> {
        // A single read is short only at end of stream
        let available = self.read(bytes)?;
        if available < bytes.len() {
            return Err(DadaSeqError::ShortValue {
                needed: bytes.len(),
                available,
            });
        }
        Ok(())
    }
}
