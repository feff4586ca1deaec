use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tessera_error::{TesseraExpect, TesseraResult, tessera_bail, tessera_err};

/// An append-only little-endian writer for the fixed-width fields of a serialized schema.
pub(crate) struct SchemaWriter {
    buffer: BytesMut,
}

impl SchemaWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_tag(&mut self, tag: impl Into<u8>) {
        self.buffer.put_u8(tag.into());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buffer.put_i32_le(value);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buffer.put_i64_le(value);
    }

    pub fn put_f64(&mut self, value: f64) {
        self.buffer.put_f64_le(value);
    }

    /// Writes a count or length as a 4-byte integer.
    pub fn put_len(&mut self, len: usize) {
        self.put_i32(
            i32::try_from(len)
                .ok()
                .tessera_expect("lengths are validated at construction"),
        );
    }

    /// Writes a length-prefixed string.
    pub fn put_str(&mut self, value: &str) {
        self.put_len(value.len());
        self.buffer.put_slice(value.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn finish(self) -> Bytes {
        self.buffer.freeze()
    }
}

/// A reader over a serialized schema that fails closed when a field runs past the buffer.
pub(crate) struct SchemaReader<'a> {
    buffer: &'a [u8],
    total: usize,
}

impl<'a> SchemaReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            total: buffer.len(),
        }
    }

    fn position(&self) -> usize {
        self.total - self.buffer.remaining()
    }

    fn ensure(&self, needed: usize, field: &str) -> TesseraResult<()> {
        if self.buffer.remaining() < needed {
            tessera_bail!(
                CorruptSchema: "truncated {field} at byte {}: {needed} bytes needed, {} left",
                self.position(),
                self.buffer.remaining()
            );
        }
        Ok(())
    }

    pub fn get_tag(&mut self, field: &str) -> TesseraResult<u8> {
        self.ensure(size_of::<u8>(), field)?;
        Ok(self.buffer.get_u8())
    }

    pub fn get_i32(&mut self, field: &str) -> TesseraResult<i32> {
        self.ensure(size_of::<i32>(), field)?;
        Ok(self.buffer.get_i32_le())
    }

    pub fn get_i64(&mut self, field: &str) -> TesseraResult<i64> {
        self.ensure(size_of::<i64>(), field)?;
        Ok(self.buffer.get_i64_le())
    }

    pub fn get_f64(&mut self, field: &str) -> TesseraResult<f64> {
        self.ensure(size_of::<f64>(), field)?;
        Ok(self.buffer.get_f64_le())
    }

    /// Reads a 4-byte count or length, rejecting negative values.
    pub fn get_len(&mut self, field: &str) -> TesseraResult<usize> {
        let len = self.get_i32(field)?;
        usize::try_from(len)
            .map_err(|_| tessera_err!(CorruptSchema: "negative {field} {len} at byte {}", self.position()))
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn get_str(&mut self, field: &str) -> TesseraResult<Arc<str>> {
        let len = self.get_len(field)?;
        self.ensure(len, field)?;
        let (bytes, rest) = self.buffer.split_at(len);
        let value = std::str::from_utf8(bytes)
            .map_err(|e| tessera_err!(CorruptSchema: "{field} is not valid UTF-8: {e}"))?;
        self.buffer = rest;
        Ok(value.into())
    }

    /// Fails unless every byte has been consumed.
    pub fn finish(self) -> TesseraResult<()> {
        if self.buffer.has_remaining() {
            tessera_bail!(
                CorruptSchema: "{} trailing bytes after the schema",
                self.buffer.remaining()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use tessera_error::TesseraError;

    use crate::serde::codec::{SchemaReader, SchemaWriter};

    #[test]
    fn fields_are_little_endian() {
        let mut writer = SchemaWriter::with_capacity(0);
        writer.put_str("ab");
        writer.put_tag(7u8);
        writer.put_i64(-2);
        assert_eq!(writer.len(), 4 + 2 + 1 + 8);
        assert_eq!(
            writer.finish().as_ref(),
            &[2, 0, 0, 0, b'a', b'b', 7, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn reader_fails_closed() {
        let mut reader = SchemaReader::new(&[5, 0, 0, 0, b'a']);
        assert!(matches!(
            reader.get_str("name"),
            Err(TesseraError::CorruptSchema(..))
        ));

        let mut reader = SchemaReader::new(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            reader.get_len("count"),
            Err(TesseraError::CorruptSchema(..))
        ));

        let mut reader = SchemaReader::new(&[1, 2, 3]);
        assert!(reader.get_f64("extent").is_err());
    }

    #[test]
    fn reader_rejects_trailing_bytes() {
        let mut reader = SchemaReader::new(&[1, 0]);
        assert_eq!(reader.get_tag("order").unwrap(), 1);
        assert!(reader.finish().is_err());
    }
}
