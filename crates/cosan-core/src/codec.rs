//! NUL-Terminated Record Codec
//!
//! Stored paths and display names are laid out as the raw value bytes followed
//! by a single NUL. A record always occupies `len + 1` bytes.

use tracing::debug;

use crate::error::CodecError;

/// A value stored as one NUL-terminated record
pub trait NulRecord: Sized {
    /// Value bytes, without terminator. Must not contain NUL.
    fn record_bytes(&self) -> &[u8];

    fn from_record_bytes(bytes: &[u8]) -> Self;

    /// Length of the encoded record, terminator included
    fn record_len(&self) -> usize {
        self.record_bytes().len() + 1
    }

    fn to_record(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.record_len());
        out.extend_from_slice(self.record_bytes());
        out.push(0);
        out
    }
}

/// Length of `value`'s record, terminator included. Writes nothing.
pub fn serialized_len<T: NulRecord>(value: &T) -> usize {
    value.record_len()
}

/// Write `value` into `out` as one record and return its length.
///
/// Fails only when `out` cannot hold the record; use [`serialized_len`] to
/// size the buffer first.
pub fn serialize<T: NulRecord>(value: &T, out: &mut [u8]) -> Result<usize, CodecError> {
    let bytes = value.record_bytes();
    let len = serialized_len(value);

    if out.len() < len {
        return Err(CodecError::BufferTooSmall {
            needed: len,
            available: out.len(),
        });
    }
    out[..bytes.len()].copy_from_slice(bytes);
    out[bytes.len()] = 0;

    Ok(len)
}

/// Decode one record from the first `bound` bytes of `buf`.
///
/// Returns the value and the number of bytes consumed (terminator included).
pub fn deserialize<T: NulRecord>(buf: &[u8], bound: usize) -> Result<(T, usize), CodecError> {
    let window = &buf[..bound.min(buf.len())];
    let Some(end) = window.iter().position(|&b| b == 0) else {
        debug!(bound, "no record terminator within bound");
        return Err(CodecError::Malformed { bound });
    };

    Ok((T::from_record_bytes(&window[..end]), end + 1))
}

/// Reads consecutive records out of one buffer
#[derive(Debug)]
pub struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Decode the next record. On failure the offset is left unchanged.
    pub fn read<T: NulRecord>(&mut self) -> Result<T, CodecError> {
        let rest = &self.buf[self.offset..];
        let (value, used) = deserialize(rest, rest.len())?;
        self.offset += used;
        Ok(value)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

/// Appends records to a growable buffer
#[derive(Debug, Default)]
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: NulRecord>(&mut self, value: &T) -> &mut Self {
        self.buf.extend_from_slice(value.record_bytes());
        self.buf.push(0);
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{DisplayNameHandle, PathHandle};

    #[test]
    fn test_len_is_bytes_plus_one() {
        let h = PathHandle::from("/var/log/a.log");
        assert_eq!(serialized_len(&h), 15);
        assert_eq!(serialized_len(&PathHandle::null()), 1);
    }

    #[test]
    fn test_sized_buffer_fits_exactly() {
        let h = PathHandle::from("~/x");
        let mut buf = vec![0u8; serialized_len(&h)];
        assert_eq!(serialize(&h, &mut buf).unwrap(), buf.len());
        assert_eq!(buf, b"~/x\0");
    }

    #[test]
    fn test_serialize_writes_terminator() {
        let h = DisplayNameHandle::from("Mono 10");
        let mut buf = [0xAAu8; 16];
        let n = serialize(&h, &mut buf).unwrap();
        assert_eq!(n, 8);
        assert_eq!(&buf[..8], b"Mono 10\0");
        assert_eq!(buf[8], 0xAA);
    }

    #[test]
    fn test_serialize_short_buffer() {
        let h = PathHandle::from("abc");
        let mut buf = [0u8; 3];
        let err = serialize(&h, &mut buf).unwrap_err();
        assert!(matches!(err, CodecError::BufferTooSmall { needed: 4, available: 3 }));
    }

    #[test]
    fn test_round_trip_exact_bound() {
        let h = PathHandle::from("~/putty-$HOST.log");
        let rec = h.to_record();
        let (back, used) = deserialize::<PathHandle>(&rec, h.record_len()).unwrap();
        assert_eq!(back, h);
        assert_eq!(used, rec.len());
    }

    #[test]
    fn test_bound_short_of_terminator_fails() {
        let h = PathHandle::from("abcdef");
        let rec = h.to_record();
        let err = deserialize::<PathHandle>(&rec, rec.len() - 1).unwrap_err();
        assert!(matches!(err, CodecError::Malformed { bound: 6 }));
    }

    #[test]
    fn test_deserialize_ignores_trailing_bytes() {
        let buf = b"one\0two\0";
        let (h, used) = deserialize::<DisplayNameHandle>(buf, buf.len()).unwrap();
        assert_eq!(h.as_bytes(), b"one");
        assert_eq!(used, 4);
    }

    #[test]
    fn test_bound_larger_than_buffer() {
        let (h, used) = deserialize::<PathHandle>(b"x\0", 100).unwrap();
        assert_eq!(h.as_bytes(), b"x");
        assert_eq!(used, 2);
        assert!(deserialize::<PathHandle>(b"xyz", 100).is_err());
    }

    #[test]
    fn test_reader_walks_records() {
        let mut w = RecordWriter::new();
        w.push(&PathHandle::from("/tmp/log"))
            .push(&DisplayNameHandle::from("Fixed 8"))
            .push(&PathHandle::null());
        let bytes = w.into_bytes();

        let mut r = RecordReader::new(&bytes);
        assert_eq!(r.read::<PathHandle>().unwrap().as_bytes(), b"/tmp/log");
        assert_eq!(r.read::<DisplayNameHandle>().unwrap().as_bytes(), b"Fixed 8");
        assert!(r.read::<PathHandle>().unwrap().is_null());
        assert!(r.is_empty());
        assert!(r.read::<PathHandle>().is_err());
    }

    #[test]
    fn test_reader_keeps_offset_on_error() {
        let mut r = RecordReader::new(b"ok\0trunc");
        r.read::<PathHandle>().unwrap();
        assert_eq!(r.offset(), 3);
        assert!(r.read::<PathHandle>().is_err());
        assert_eq!(r.offset(), 3);
        assert_eq!(r.remaining(), 5);
    }
}
