//! Hierarchical chunk traversal.
//!
//! A chunk is a `u16` tag and a `u32` length (header included) followed by a
//! payload that may itself hold child chunks. [`ChunkReader::walk`] reads the
//! children of a parent chunk one by one, hands each to the handler
//! registered for its tag, and always resumes at the child's declared end.
//! Children without a handler are skipped.
//!
//! Every child header is validated against its parent's stop position before
//! the handler runs, so a handler can never be entered with bounds outside
//! its parent. A handler that reads past its own stop fails the decode.

use tds_core::byte_stream::ByteStream;
use tds_core::scalar::Scalar;
use tds_core::status::{DecodeError, DecodeResult, Status};
use tracing::{trace, warn};

use crate::chunk_ids::{chunk_name, CHUNK_HEADER_SIZE, MAX_CHUNK_DEPTH};

/// Position and extent of one chunk in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub tag: u16,
    /// Offset of the header.
    pub start: u64,
    /// Offset one past the last payload byte.
    pub stop: u64,
}

impl Chunk {
    pub fn length(&self) -> u64 {
        self.stop - self.start
    }
}

/// Handler for one chunk tag. `C` is the state being populated.
pub type ChunkHandler<C> = fn(&mut C, &mut ChunkReader<'_>, &Chunk) -> Status;

pub struct ChunkReader<'s> {
    stream: &'s mut ByteStream,
    depth: usize,
    debug_level: u8,
    skipped: usize,
}

impl<'s> ChunkReader<'s> {
    pub fn new(stream: &'s mut ByteStream) -> Self {
        Self {
            stream,
            depth: 0,
            debug_level: 0,
            skipped: 0,
        }
    }

    /// 1 logs skipped chunks, 2 traces every chunk.
    pub fn with_debug_level(mut self, level: u8) -> Self {
        self.debug_level = level;
        self
    }

    pub fn stream(&mut self) -> &mut ByteStream {
        self.stream
    }

    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Chunks that had no handler.
    pub fn skipped_chunks(&self) -> usize {
        self.skipped
    }

    /// Reads the top-level header and checks its tag against `magic`.
    pub fn read_root(&mut self, magic: u16) -> DecodeResult<Chunk> {
        if self.stream.is_bad() {
            return Err(DecodeError::TruncatedStream(
                "stream is already in the bad state".into(),
            ));
        }
        let start = self.stream.position();
        let tag: u16 = self.stream.read()?;
        if tag != magic {
            self.stream.set_bad();
            return Err(DecodeError::MalformedHeader(format!(
                "expected magic 0x{:04X}, found 0x{:04X}",
                magic, tag
            )));
        }
        let length = u64::from(self.stream.read::<u32>()?);
        if length < CHUNK_HEADER_SIZE {
            self.stream.set_bad();
            return Err(DecodeError::MalformedHeader(format!(
                "root chunk length {} is shorter than its header",
                length
            )));
        }
        let stop = start + length;
        if let Some(size) = self.stream.size() {
            if stop > size {
                self.stream.set_bad();
                return Err(DecodeError::TruncatedStream(format!(
                    "root chunk ends at {} but the stream holds {} bytes",
                    stop, size
                )));
            }
        }
        Ok(Chunk { tag, start, stop })
    }

    fn read_child_header(&mut self, parent: &Chunk) -> DecodeResult<Chunk> {
        let start = self.stream.position();
        if start + CHUNK_HEADER_SIZE > parent.stop {
            self.stream.set_bad();
            return Err(DecodeError::MalformedHeader(format!(
                "chunk header at {} crosses the end of 0x{:04X}",
                start, parent.tag
            )));
        }
        let tag: u16 = self.stream.read()?;
        let length = u64::from(self.stream.read::<u32>()?);
        if length < CHUNK_HEADER_SIZE || start + length > parent.stop {
            self.stream.set_bad();
            return Err(DecodeError::MalformedHeader(format!(
                "chunk 0x{:04X} at {} declares length {} outside its parent 0x{:04X} (stop {})",
                tag, start, length, parent.tag, parent.stop
            )));
        }
        Ok(Chunk {
            tag,
            start,
            stop: start + length,
        })
    }

    /// Walks the children of `parent`, calling `visit` for each. `visit`
    /// returns `false` for chunks it does not recognise.
    pub fn walk_with<F>(&mut self, parent: &Chunk, mut visit: F) -> Status
    where
        F: FnMut(&mut Self, &Chunk) -> DecodeResult<bool>,
    {
        if self.depth >= MAX_CHUNK_DEPTH {
            self.stream.set_bad();
            return Err(DecodeError::MalformedHeader(format!(
                "chunks nested deeper than {}",
                MAX_CHUNK_DEPTH
            )));
        }
        self.depth += 1;
        let result = self.walk_children(parent, &mut visit);
        self.depth -= 1;
        result
    }

    fn walk_children<F>(&mut self, parent: &Chunk, visit: &mut F) -> Status
    where
        F: FnMut(&mut Self, &Chunk) -> DecodeResult<bool>,
    {
        loop {
            self.check_stream()?;
            if self.stream.position() >= parent.stop {
                return Ok(());
            }
            let child = self.read_child_header(parent)?;
            if self.debug_level >= 2 {
                trace!(
                    tag = format_args!("0x{:04X}", child.tag),
                    name = chunk_name(child.tag),
                    offset = child.start,
                    length = child.length(),
                    depth = self.depth,
                    "chunk"
                );
            }

            if !visit(self, &child)? {
                self.skipped += 1;
                if self.debug_level >= 1 {
                    warn!(
                        tag = format_args!("0x{:04X}", child.tag),
                        parent = chunk_name(parent.tag),
                        offset = child.start,
                        "skipping unknown chunk"
                    );
                }
            }

            self.check_stream()?;
            if self.stream.position() > child.stop {
                self.stream.set_bad();
                return Err(DecodeError::TruncatedStream(format!(
                    "{} chunk at {} read past its end {}",
                    chunk_name(child.tag),
                    child.start,
                    child.stop
                )));
            }
            self.stream.set_position(child.stop)?;
        }
    }

    /// Dispatches each child of `parent` through `table`.
    pub fn walk<C>(&mut self, ctx: &mut C, parent: &Chunk, table: &[(u16, ChunkHandler<C>)]) -> Status {
        self.walk_with(parent, |reader, chunk| {
            match table.iter().find(|(tag, _)| *tag == chunk.tag) {
                Some((_, handler)) => {
                    handler(ctx, reader, chunk)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn check_stream(&self) -> Status {
        if self.stream.is_bad() {
            Err(DecodeError::TruncatedStream(format!(
                "stream went bad at offset {}",
                self.stream.position()
            )))
        } else {
            Ok(())
        }
    }

    /// Payload bytes left before `chunk` ends.
    pub fn remaining(&self, chunk: &Chunk) -> u64 {
        chunk.stop.saturating_sub(self.stream.position())
    }

    /// Fails unless `count` elements of `size` bytes fit in the rest of `chunk`.
    pub fn check_count(&mut self, chunk: &Chunk, count: usize, size: u64) -> Status {
        let needed = (count as u64).saturating_mul(size);
        if needed > self.remaining(chunk) {
            self.stream.set_bad();
            return Err(DecodeError::TruncatedStream(format!(
                "{} declares {} elements ({} bytes) but only {} remain",
                chunk_name(chunk.tag),
                count,
                needed,
                self.remaining(chunk)
            )));
        }
        Ok(())
    }

    pub fn read<T: Scalar>(&mut self) -> DecodeResult<T> {
        Ok(self.stream.read()?)
    }

    pub fn read_array<T: Scalar, const N: usize>(&mut self) -> DecodeResult<[T; N]> {
        Ok(self.stream.read_array()?)
    }

    pub fn read_zstring(&mut self, max_len: usize) -> DecodeResult<String> {
        Ok(self.stream.read_zstring(max_len)?)
    }
}
