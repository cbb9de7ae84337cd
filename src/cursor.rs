use std::io::SeekFrom;

use crate::error::{BundleError, Result};

/// Sequential big-endian reader over an in-memory buffer.
///
/// The position may be moved past the end of the buffer; that only becomes
/// an error on the next read.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reposition the cursor. Out-of-range targets clamp at zero, not at the
    /// buffer end.
    pub fn seek(&mut self, target: SeekFrom) {
        self.pos = match target {
            SeekFrom::Start(p) => p as usize,
            SeekFrom::End(d) => (self.data.len() as i64).saturating_add(d).max(0) as usize,
            SeekFrom::Current(d) => (self.pos as i64).saturating_add(d).max(0) as usize,
        };
    }

    /// Round the position up to the next multiple of `boundary`.
    pub fn align(&mut self, boundary: usize) {
        self.pos = self.pos.next_multiple_of(boundary);
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.data.len().saturating_sub(self.pos);
        if available < n {
            return Err(BundleError::UnexpectedEndOfData {
                offset: self.pos,
                wanted: n,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Read a null-terminated UTF-8 string, consuming the terminator but
    /// excluding it from the result.
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BundleError::UnexpectedEndOfData {
                offset: start,
                wanted: rest.len() + 1,
                available: rest.len(),
            })?;

        let string = std::str::from_utf8(&rest[..nul])
            .map_err(|_| BundleError::InvalidEncoding { offset: start })?;
        self.pos = start + nul + 1;
        Ok(string.to_string())
    }
}
