//! Streaming Deflate and Store transfer loops.
//!
//! Each function pulls `chunk_size` slices from its source, pushes the
//! transformed bytes to its sink, and keeps a running CRC-32 over the
//! uncompressed side. All codec state lives inside the call: nothing is
//! shared between entries and every transfer starts fresh.

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::crc::crc32;
use crate::error::Result;

/// Default transfer chunk; also the buffering granularity of a session.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Byte counts and checksum accumulated by a streaming transfer.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Transfer {
    /// Bytes pulled from the source (uncompressed side on compress,
    /// compressed side on decompress).
    pub bytes_read: u64,
    /// Bytes pushed to the sink.
    pub bytes_written: u64,
    /// CRC-32 over the uncompressed bytes.
    pub crc32: u32,
}

struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Deflate `source` into `sink`.
pub(crate) fn compress<R, W>(source: &mut R, sink: &mut W, chunk_size: usize) -> Result<Transfer>
where
    R: Read + ?Sized,
    W: Write,
{
    let counter = CountingWriter {
        inner: sink,
        written: 0,
    };
    let mut encoder = DeflateEncoder::new(counter, Compression::default());
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut bytes_read = 0u64;
    let mut crc = 0u32;
    loop {
        let n = source.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        crc = crc32(crc, &chunk[..n]);
        bytes_read += n as u64;
        encoder.write_all(&chunk[..n])?;
    }
    let counter = encoder.finish()?;
    Ok(Transfer {
        bytes_read,
        bytes_written: counter.written,
        crc32: crc,
    })
}

/// Forward `source` into `sink` unchanged, still hashing and counting.
pub(crate) fn store<R, W>(source: &mut R, sink: &mut W, chunk_size: usize) -> Result<Transfer>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut copied = 0u64;
    let mut crc = 0u32;
    loop {
        let n = source.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        crc = crc32(crc, &chunk[..n]);
        sink.write_all(&chunk[..n])?;
        copied += n as u64;
    }
    Ok(Transfer {
        bytes_read: copied,
        bytes_written: copied,
        crc32: crc,
    })
}

/// Inflate `source` (already limited to the compressed span) into `sink`.
pub(crate) fn decompress<R, W>(source: R, sink: &mut W, chunk_size: usize) -> Result<Transfer>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut decoder = DeflateDecoder::new(source);
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut written = 0u64;
    let mut crc = 0u32;
    loop {
        let n = decoder.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        crc = crc32(crc, &chunk[..n]);
        sink.write_all(&chunk[..n])?;
        written += n as u64;
    }
    Ok(Transfer {
        bytes_read: decoder.total_in(),
        bytes_written: written,
        crc32: crc,
    })
}
