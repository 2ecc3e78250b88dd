//! Storage behind a [`ByteStream`](crate::byte_stream::ByteStream).
//!
//! Three backends share one capability surface (`read`, `write`, `seek`,
//! `size`): a growable memory buffer, a random-access file, and a
//! forward-only wrapped reader.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};

use crate::status::{StreamError, StreamResult};

/// In-memory buffer that grows by roughly 1.5x and never shrinks.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    fn grow_to(&mut self, needed: usize) {
        let capacity = self.data.capacity();
        if needed > capacity {
            let target = needed.max(capacity + capacity / 2);
            self.data.reserve_exact(target - self.data.len());
        }
    }

    fn read(&mut self, out: &mut [u8]) -> StreamResult<()> {
        let end = self.pos.checked_add(out.len()).ok_or(StreamError::ShortRead)?;
        if end > self.data.len() {
            return Err(StreamError::ShortRead);
        }
        out.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> StreamResult<()> {
        let end = self
            .pos
            .checked_add(bytes.len())
            .ok_or(StreamError::WriteFailed)?;
        self.grow_to(end);
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> StreamResult<()> {
        if pos > self.data.len() as u64 {
            return Err(StreamError::InvalidSeek);
        }
        self.pos = pos as usize;
        Ok(())
    }
}

/// Random-access file. Reads are buffered; writes go straight to the file at
/// the logical position.
#[derive(Debug)]
pub struct FileBackend {
    inner: BufReader<File>,
    pos: u64,
    len: u64,
}

impl FileBackend {
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            inner: BufReader::new(file),
            pos: 0,
            len,
        })
    }

    fn read(&mut self, out: &mut [u8]) -> StreamResult<()> {
        self.inner
            .read_exact(out)
            .map_err(|_| StreamError::ShortRead)?;
        self.pos += out.len() as u64;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> StreamResult<()> {
        // Drops the read buffer so the file cursor matches the logical position.
        self.inner
            .seek(SeekFrom::Start(self.pos))
            .map_err(|_| StreamError::WriteFailed)?;
        self.inner
            .get_mut()
            .write_all(bytes)
            .map_err(|_| StreamError::WriteFailed)?;
        self.pos += bytes.len() as u64;
        self.len = self.len.max(self.pos);
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> StreamResult<()> {
        if pos > self.len {
            return Err(StreamError::InvalidSeek);
        }
        let delta = pos as i64 - self.pos as i64;
        self.inner
            .seek_relative(delta)
            .map_err(|_| StreamError::InvalidSeek)?;
        self.pos = pos;
        Ok(())
    }

    fn flush(&mut self) -> StreamResult<()> {
        self.inner
            .get_mut()
            .flush()
            .map_err(|_| StreamError::WriteFailed)
    }
}

/// Forward-only wrapper around an arbitrary reader.
pub struct WrappedReader {
    inner: Box<dyn Read + Send>,
    pos: u64,
}

impl WrappedReader {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            inner: Box::new(reader),
            pos: 0,
        }
    }

    fn read(&mut self, out: &mut [u8]) -> StreamResult<()> {
        self.inner
            .read_exact(out)
            .map_err(|_| StreamError::ShortRead)?;
        self.pos += out.len() as u64;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> StreamResult<()> {
        if pos < self.pos {
            return Err(StreamError::InvalidSeek);
        }
        let skip = pos - self.pos;
        let skipped = io::copy(&mut (&mut self.inner).take(skip), &mut io::sink())
            .map_err(|_| StreamError::InvalidSeek)?;
        self.pos += skipped;
        if skipped != skip {
            return Err(StreamError::InvalidSeek);
        }
        Ok(())
    }
}

impl std::fmt::Debug for WrappedReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedReader").field("pos", &self.pos).finish()
    }
}

/// Tagged storage variant behind a stream.
#[derive(Debug)]
pub enum StreamBackend {
    Memory(MemoryBuffer),
    File(FileBackend),
    Wrapped(WrappedReader),
}

impl StreamBackend {
    pub fn read(&mut self, out: &mut [u8]) -> StreamResult<()> {
        match self {
            StreamBackend::Memory(m) => m.read(out),
            StreamBackend::File(f) => f.read(out),
            StreamBackend::Wrapped(w) => w.read(out),
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> StreamResult<()> {
        match self {
            StreamBackend::Memory(m) => m.write(bytes),
            StreamBackend::File(f) => f.write(bytes),
            StreamBackend::Wrapped(_) => Err(StreamError::Unsupported),
        }
    }

    pub fn seek(&mut self, pos: u64) -> StreamResult<()> {
        match self {
            StreamBackend::Memory(m) => m.seek(pos),
            StreamBackend::File(f) => f.seek(pos),
            StreamBackend::Wrapped(w) => w.seek(pos),
        }
    }

    pub fn position(&self) -> u64 {
        match self {
            StreamBackend::Memory(m) => m.pos as u64,
            StreamBackend::File(f) => f.pos,
            StreamBackend::Wrapped(w) => w.pos,
        }
    }

    /// Total size when the backend knows it.
    pub fn size(&self) -> Option<u64> {
        match self {
            StreamBackend::Memory(m) => Some(m.data.len() as u64),
            StreamBackend::File(f) => Some(f.len),
            StreamBackend::Wrapped(_) => None,
        }
    }

    pub fn flush(&mut self) -> StreamResult<()> {
        match self {
            StreamBackend::File(f) => f.flush(),
            _ => Ok(()),
        }
    }
}
