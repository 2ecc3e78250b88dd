//! Binary and text byte streams with a sticky failure flag.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian};

use crate::scalar::{Scalar, TextIntFormat};
use crate::status::{StreamError, StreamResult};
use crate::stream_backend::{FileBackend, MemoryBuffer, StreamBackend, WrappedReader};

/// Byte ordering requested for multi-byte scalars in binary mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrderConfig {
    #[default]
    Little,
    Big,
    Native,
}

/// Byte ordering after resolving `Native` against the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl ByteOrderConfig {
    pub fn resolve(self) -> Endian {
        match self {
            ByteOrderConfig::Little => Endian::Little,
            ByteOrderConfig::Big => Endian::Big,
            ByteOrderConfig::Native => {
                if cfg!(target_endian = "big") {
                    Endian::Big
                } else {
                    Endian::Little
                }
            }
        }
    }
}

/// Transport used for scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    #[default]
    Binary,
    /// Whitespace-separated ASCII tokens.
    Text,
}

/// Stream configuration, fixed at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamConfig {
    pub byte_order: ByteOrderConfig,
    pub mode: StreamMode,
    pub int_format: TextIntFormat,
}

impl StreamConfig {
    pub fn binary(byte_order: ByteOrderConfig) -> Self {
        Self {
            byte_order,
            ..Self::default()
        }
    }

    pub fn text(int_format: TextIntFormat) -> Self {
        Self {
            mode: StreamMode::Text,
            int_format,
            ..Self::default()
        }
    }
}

const MAX_TEXT_TOKEN: usize = 64;

/// Dual-mode reader/writer over memory, a file, or a wrapped reader.
///
/// Failure is sticky: once any operation fails the stream is *bad*, every
/// later operation returns [`StreamError::Bad`] without touching the
/// backend, and the flag is never cleared.
///
/// # Example
///
/// ```
/// use tds_core::byte_stream::{ByteStream, StreamConfig};
///
/// let mut stream = ByteStream::from_vec(vec![0x4D, 0x4D, 0x06, 0, 0, 0], StreamConfig::default());
/// assert_eq!(stream.read::<u16>().unwrap(), 0x4D4D);
/// assert_eq!(stream.read::<u32>().unwrap(), 6);
/// assert!(stream.read::<u8>().is_err());
/// assert!(stream.is_bad());
/// ```
#[derive(Debug)]
pub struct ByteStream {
    backend: StreamBackend,
    mode: StreamMode,
    endian: Endian,
    int_format: TextIntFormat,
    bad: bool,
}

impl ByteStream {
    fn with_backend(backend: StreamBackend, config: StreamConfig) -> Self {
        Self {
            backend,
            mode: config.mode,
            endian: config.byte_order.resolve(),
            int_format: config.int_format,
            bad: false,
        }
    }

    /// Creates an empty, writable in-memory stream.
    pub fn memory(config: StreamConfig) -> Self {
        Self::with_backend(StreamBackend::Memory(MemoryBuffer::new()), config)
    }

    /// Creates an in-memory stream over existing bytes, positioned at 0.
    pub fn from_vec(data: Vec<u8>, config: StreamConfig) -> Self {
        Self::with_backend(StreamBackend::Memory(MemoryBuffer::from_vec(data)), config)
    }

    /// Opens an existing file for random-access reading.
    pub fn open_file<P: AsRef<Path>>(path: P, config: StreamConfig) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::with_backend(
            StreamBackend::File(FileBackend::new(file)?),
            config,
        ))
    }

    /// Creates (or truncates) a file for reading and writing.
    pub fn create_file<P: AsRef<Path>>(path: P, config: StreamConfig) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::with_backend(
            StreamBackend::File(FileBackend::new(file)?),
            config,
        ))
    }

    /// Wraps a forward-only reader. Backward seeks fail and mark the stream bad.
    pub fn wrap<R: Read + Send + 'static>(reader: R, config: StreamConfig) -> Self {
        Self::with_backend(StreamBackend::Wrapped(WrappedReader::new(reader)), config)
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn is_bad(&self) -> bool {
        self.bad
    }

    pub fn is_good(&self) -> bool {
        !self.bad
    }

    /// Latches the bad flag without an I/O failure (structural errors).
    pub fn set_bad(&mut self) {
        self.bad = true;
    }

    pub fn position(&self) -> u64 {
        self.backend.position()
    }

    /// Total stream size, when the backend knows it.
    pub fn size(&self) -> Option<u64> {
        self.backend.size()
    }

    /// Bytes left before the end, when the size is known.
    pub fn remaining(&self) -> Option<u64> {
        self.size()
            .map(|size| size.saturating_sub(self.position()))
    }

    /// Returns the memory backend's bytes, if this is a memory stream.
    pub fn memory_data(&self) -> Option<&[u8]> {
        match &self.backend {
            StreamBackend::Memory(m) => Some(m.data()),
            _ => None,
        }
    }

    /// Consumes the stream, returning the memory backend's bytes.
    pub fn into_memory(self) -> Option<Vec<u8>> {
        match self.backend {
            StreamBackend::Memory(m) => Some(m.into_vec()),
            _ => None,
        }
    }

    #[inline]
    fn check(&self) -> StreamResult<()> {
        if self.bad {
            Err(StreamError::Bad)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn latch<T>(&mut self, result: StreamResult<T>) -> StreamResult<T> {
        if result.is_err() {
            self.bad = true;
        }
        result
    }

    pub fn set_position(&mut self, pos: u64) -> StreamResult<()> {
        self.check()?;
        let result = self.backend.seek(pos);
        self.latch(result)
    }

    /// Moves forward by `n` bytes.
    pub fn skip(&mut self, n: u64) -> StreamResult<()> {
        self.check()?;
        let target = self.position().checked_add(n).ok_or(StreamError::InvalidSeek);
        let result = target.and_then(|pos| self.backend.seek(pos));
        self.latch(result)
    }

    pub fn read_bytes(&mut self, out: &mut [u8]) -> StreamResult<()> {
        self.check()?;
        let result = self.backend.read(out);
        self.latch(result)
    }

    pub fn read_vec(&mut self, len: usize) -> StreamResult<Vec<u8>> {
        self.check()?;
        if let Some(remaining) = self.remaining() {
            if len as u64 > remaining {
                self.bad = true;
                return Err(StreamError::ShortRead);
            }
        }
        let mut out = vec![0u8; len];
        self.read_bytes(&mut out)?;
        Ok(out)
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> StreamResult<()> {
        self.check()?;
        let result = self.backend.write(bytes);
        self.latch(result)
    }

    pub fn flush(&mut self) -> StreamResult<()> {
        self.check()?;
        let result = self.backend.flush();
        self.latch(result)
    }

    /// Reads one scalar in the stream's mode and byte order.
    pub fn read<T: Scalar>(&mut self) -> StreamResult<T> {
        match self.mode {
            StreamMode::Binary => {
                let mut buf = [0u8; 8];
                let buf = &mut buf[..T::WIDTH];
                self.read_bytes(buf)?;
                Ok(match self.endian {
                    Endian::Little => T::decode::<LittleEndian>(buf),
                    Endian::Big => T::decode::<BigEndian>(buf),
                })
            }
            StreamMode::Text => {
                let token = self.read_token()?;
                let parsed = T::parse_text(&token).ok_or(StreamError::InvalidText);
                self.latch(parsed)
            }
        }
    }

    /// Writes one scalar in the stream's mode and byte order.
    pub fn write<T: Scalar>(&mut self, value: T) -> StreamResult<()> {
        match self.mode {
            StreamMode::Binary => {
                let mut buf = [0u8; 8];
                let buf = &mut buf[..T::WIDTH];
                match self.endian {
                    Endian::Little => value.encode::<LittleEndian>(buf),
                    Endian::Big => value.encode::<BigEndian>(buf),
                }
                self.write_bytes(buf)
            }
            StreamMode::Text => {
                let mut token = value.format_text(self.int_format);
                token.push(' ');
                self.write_bytes(token.as_bytes())
            }
        }
    }

    pub fn read_array<T: Scalar, const N: usize>(&mut self) -> StreamResult<[T; N]> {
        let mut out = [T::default(); N];
        for slot in out.iter_mut() {
            *slot = self.read()?;
        }
        Ok(out)
    }

    pub fn write_array<T: Scalar>(&mut self, values: &[T]) -> StreamResult<()> {
        for &v in values {
            self.write(v)?;
        }
        Ok(())
    }

    /// Reads a NUL-terminated string of at most `max_len` bytes including the
    /// terminator. Fails with [`StreamError::StringTooLong`] otherwise.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_zstring(&mut self, max_len: usize) -> StreamResult<String> {
        self.check()?;
        let mut bytes = Vec::new();
        loop {
            if bytes.len() >= max_len {
                self.bad = true;
                return Err(StreamError::StringTooLong(max_len));
            }
            let mut b = [0u8; 1];
            self.read_bytes(&mut b)?;
            if b[0] == 0 {
                break;
            }
            bytes.push(b[0]);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn write_zstring(&mut self, s: &str) -> StreamResult<()> {
        self.write_bytes(s.as_bytes())?;
        self.write_bytes(&[0])
    }

    fn read_token(&mut self) -> StreamResult<String> {
        self.check()?;
        let mut token = Vec::new();
        loop {
            let mut b = [0u8; 1];
            match self.backend.read(&mut b) {
                Ok(()) => {}
                Err(_) if !token.is_empty() => break,
                Err(e) => return self.latch(Err(e)),
            }
            if b[0].is_ascii_whitespace() {
                if token.is_empty() {
                    continue;
                }
                break;
            }
            if token.len() >= MAX_TEXT_TOKEN {
                return self.latch(Err(StreamError::InvalidText));
            }
            token.push(b[0]);
        }
        String::from_utf8(token).map_err(|_| {
            self.bad = true;
            StreamError::InvalidText
        })
    }
}
