//! On-the-fly gzip compression of response bodies.
//!
//! [`CompressionPolicy`] decides whether a body is worth compressing;
//! [`GzipCompressor`] does the work with a deflate state that survives between
//! requests, checked out of a [`CompressorPool`].

use std::collections::HashSet;
use std::io::{self, ErrorKind, Read, Write};

use flate2::{Compress, Compression, Crc, FlushCompress, Status};

use crate::pool::{Pool, Reset};

/// Bodies of this many bytes or fewer are always sent raw.
pub const MIN_COMPRESS_SIZE: u64 = 1024;

/// `Content-Encoding` value for compressed bodies.
pub const GZIP_ENCODING: &str = "gzip";

const COMPRESSIBLE_EXTENSIONS: &[&str] = &[
    "css", "csv", "eot", "html", "js", "json", "otf", "svg", "ttf", "txt", "xhtml", "xml",
];

// Magic, CM=deflate, no flags, no mtime, XFL=0, OS=unknown
const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0xff];

const CHUNK_SIZE: usize = 32 * 1024;

/// Idle compressors kept around between requests.
const MAX_IDLE_COMPRESSORS: usize = 64;

/// Which responses get compressed.
#[derive(Debug, Clone)]
pub struct CompressionPolicy {
    extensions: HashSet<&'static str>,
    min_size: u64,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            extensions: COMPRESSIBLE_EXTENSIONS.iter().copied().collect(),
            min_size: MIN_COMPRESS_SIZE,
        }
    }
}

impl CompressionPolicy {
    pub fn is_compressible(&self, extension: &str) -> bool {
        !extension.is_empty()
            && self
                .extensions
                .contains(extension.to_ascii_lowercase().as_str())
    }

    /// True when the body is larger than the threshold, the extension is
    /// compressible and `Accept-Encoding` mentions gzip anywhere.
    pub fn should_compress(&self, size: u64, extension: &str, accept_encoding: Option<&str>) -> bool {
        size > self.min_size
            && accept_encoding.is_some_and(|value| value.contains(GZIP_ENCODING))
            && self.is_compressible(extension)
    }
}

/// Reusable gzip stream encoder.
///
/// Holds the deflate state and scratch buffers; [`GzipCompressor::encode`]
/// writes one complete gzip member per call.
pub struct GzipCompressor {
    deflate: Compress,
    crc: Crc,
    input: Vec<u8>,
    output: Vec<u8>,
}

impl GzipCompressor {
    pub fn new(level: Compression) -> Self {
        Self {
            deflate: Compress::new(level, false),
            crc: Crc::new(),
            input: vec![0; CHUNK_SIZE],
            output: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    /// Compresses everything readable from `src` into `dst` as a single gzip
    /// member and returns the number of compressed bytes written.
    pub fn encode<R, W>(&mut self, src: &mut R, dst: &mut W) -> io::Result<u64>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.reset();
        dst.write_all(&GZIP_HEADER)?;

        loop {
            let n = match src.read(&mut self.input) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.crc.update(&self.input[..n]);

            let mut pending = &self.input[..n];
            while !pending.is_empty() {
                let before = self.deflate.total_in();
                self.output.clear();
                self.deflate
                    .compress_vec(pending, &mut self.output, FlushCompress::None)?;
                let consumed = (self.deflate.total_in() - before) as usize;
                pending = &pending[consumed..];
                dst.write_all(&self.output)?;
            }
        }

        loop {
            self.output.clear();
            let status = self
                .deflate
                .compress_vec(&[], &mut self.output, FlushCompress::Finish)?;
            dst.write_all(&self.output)?;
            if status == Status::StreamEnd {
                break;
            }
        }

        dst.write_all(&self.crc.sum().to_le_bytes())?;
        dst.write_all(&self.crc.amount().to_le_bytes())?;

        Ok(GZIP_HEADER.len() as u64 + self.deflate.total_out() + 8)
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(Compression::default())
    }
}

impl Reset for GzipCompressor {
    fn reset(&mut self) {
        self.deflate.reset();
        self.crc.reset();
        self.output.clear();
    }
}

/// Process-wide pool of gzip compressors.
pub type CompressorPool = Pool<GzipCompressor>;

pub fn compressor_pool() -> CompressorPool {
    Pool::new(MAX_IDLE_COMPRESSORS, GzipCompressor::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;

    fn gunzip(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn policy_threshold_is_exclusive() {
        let policy = CompressionPolicy::default();
        assert!(!policy.should_compress(1024, "css", Some("gzip")));
        assert!(policy.should_compress(1025, "css", Some("gzip")));
    }

    #[test]
    fn policy_needs_gzip_and_known_extension() {
        let policy = CompressionPolicy::default();
        assert!(!policy.should_compress(4096, "png", Some("gzip")));
        assert!(!policy.should_compress(4096, "", Some("gzip")));
        assert!(!policy.should_compress(4096, "css", Some("br, deflate")));
        assert!(!policy.should_compress(4096, "css", None));
        assert!(policy.should_compress(4096, "CSS", Some("deflate, x-gzip")));
    }

    #[test]
    fn encodes_valid_gzip() {
        let source: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let mut out = Vec::new();

        let written = GzipCompressor::default()
            .encode(&mut source.as_slice(), &mut out)
            .unwrap();

        assert_eq!(written, out.len() as u64);
        assert_eq!(gunzip(&out), source);
    }

    #[test]
    fn empty_input_still_produces_a_member() {
        let mut out = Vec::new();
        GzipCompressor::default()
            .encode(&mut io::empty(), &mut out)
            .unwrap();

        assert!(gunzip(&out).is_empty());
    }
}
