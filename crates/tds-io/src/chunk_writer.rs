//! Chunk output with back-patched lengths.

use tds_core::byte_stream::ByteStream;
use tds_core::scalar::Scalar;
use tds_core::status::{DecodeError, DecodeResult, Status, StreamError};

fn write_error(err: StreamError) -> DecodeError {
    DecodeError::Io(format!("chunk write failed: {}", err))
}

/// Writes nested chunks to a seekable stream.
///
/// [`begin`](Self::begin) writes a header with a placeholder length and
/// [`end`](Self::end) seeks back to fill it in once the payload is known.
pub struct ChunkWriter<'s> {
    stream: &'s mut ByteStream,
    open: Vec<(u16, u64)>,
}

impl<'s> ChunkWriter<'s> {
    pub fn new(stream: &'s mut ByteStream) -> Self {
        Self {
            stream,
            open: Vec::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn begin(&mut self, tag: u16) -> Status {
        let start = self.stream.position();
        self.stream.write(tag).map_err(write_error)?;
        self.stream.write(0u32).map_err(write_error)?;
        self.open.push((tag, start));
        Ok(())
    }

    pub fn end(&mut self) -> Status {
        let (tag, start) = self
            .open
            .pop()
            .ok_or_else(|| DecodeError::Io("end() without a matching begin()".into()))?;
        let end = self.stream.position();
        let length = u32::try_from(end - start).map_err(|_| {
            DecodeError::InvalidConfiguration(format!(
                "chunk 0x{:04X} is larger than 4 GiB",
                tag
            ))
        })?;
        self.stream.set_position(start + 2).map_err(write_error)?;
        self.stream.write(length).map_err(write_error)?;
        self.stream.set_position(end).map_err(write_error)
    }

    /// Writes `tag` around whatever `body` writes.
    pub fn chunk<F>(&mut self, tag: u16, body: F) -> Status
    where
        F: FnOnce(&mut Self) -> Status,
    {
        self.begin(tag)?;
        body(self)?;
        self.end()
    }

    /// A chunk holding a single scalar.
    pub fn scalar_chunk<T: Scalar>(&mut self, tag: u16, value: T) -> Status {
        self.chunk(tag, |w| w.write(value))
    }

    pub fn empty_chunk(&mut self, tag: u16) -> Status {
        self.begin(tag)?;
        self.end()
    }

    pub fn write<T: Scalar>(&mut self, value: T) -> Status {
        self.stream.write(value).map_err(write_error)
    }

    pub fn write_array<T: Scalar>(&mut self, values: &[T]) -> Status {
        self.stream.write_array(values).map_err(write_error)
    }

    pub fn write_zstring(&mut self, s: &str) -> Status {
        self.stream.write_zstring(s).map_err(write_error)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Status {
        self.stream.write_bytes(bytes).map_err(write_error)
    }

    /// Fails if any chunk is still open.
    pub fn finish(self) -> DecodeResult<()> {
        match self.open.last() {
            Some((tag, _)) => Err(DecodeError::Io(format!(
                "chunk 0x{:04X} was never closed",
                tag
            ))),
            None => Ok(()),
        }
    }
}
