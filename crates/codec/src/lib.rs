//! Byte-level collaborators of the canvas core: zlib compression for tile
//! and image payloads, PNG for whole-image input and output.

use std::fmt;
use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

pub mod png;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    Inflate(String),
    Deflate(String),
    SizeMismatch { expected: usize, actual: usize },
    Png(String),
    TooLarge { width: u32, height: u32 },
    Io(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Inflate(message) => write!(formatter, "inflate failed: {message}"),
            CodecError::Deflate(message) => write!(formatter, "deflate failed: {message}"),
            CodecError::SizeMismatch { expected, actual } => {
                write!(
                    formatter,
                    "decompression needs size {expected}, but got {actual}"
                )
            }
            CodecError::Png(message) => write!(formatter, "png error: {message}"),
            CodecError::TooLarge { width, height } => {
                write!(formatter, "image dimensions {width}x{height} out of range")
            }
            CodecError::Io(message) => write!(formatter, "io error: {message}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(error: std::io::Error) -> Self {
        CodecError::Io(error.to_string())
    }
}

/// Inflate a zlib stream. The decompressed size is reported to
/// `provide_buffer`, which either returns a writable buffer of exactly
/// that size or an error; a buffer of any other length is reported as a
/// size mismatch without touching it.
pub fn inflate<'a, F>(input: &[u8], provide_buffer: F) -> Result<(), CodecError>
where
    F: FnOnce(usize) -> Result<&'a mut [u8], CodecError>,
{
    let mut decoder = ZlibDecoder::new(input);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|error| CodecError::Inflate(error.to_string()))?;

    let buffer = provide_buffer(decompressed.len())?;
    if buffer.len() != decompressed.len() {
        return Err(CodecError::SizeMismatch {
            expected: buffer.len(),
            actual: decompressed.len(),
        });
    }
    buffer.copy_from_slice(&decompressed);
    Ok(())
}

/// Inflate a zlib stream whose decompressed size must be exactly
/// `expected_size`.
pub fn inflate_exact(input: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError> {
    let mut decoder = ZlibDecoder::new(input);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|error| CodecError::Inflate(error.to_string()))?;
    if decompressed.len() != expected_size {
        return Err(CodecError::SizeMismatch {
            expected: expected_size,
            actual: decompressed.len(),
        });
    }
    Ok(decompressed)
}

pub fn deflate(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(input)
        .map_err(|error| CodecError::Deflate(error.to_string()))?;
    encoder
        .finish()
        .map_err(|error| CodecError::Deflate(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_then_inflate_round_trips() {
        let payload: Vec<u8> = (0..=255).cycle().take(4096).collect();
        let compressed = deflate(&payload).expect("deflate");
        let decompressed = inflate_exact(&compressed, payload.len()).expect("inflate");
        assert_eq!(decompressed, payload);
    }

    #[test]
    fn inflate_reports_size_to_the_buffer_provider() {
        let compressed = deflate(&[7; 100]).expect("deflate");
        let mut buffer = vec![0_u8; 100];
        let mut reported = 0;
        inflate(&compressed, |size| {
            reported = size;
            Ok(&mut buffer[..])
        })
        .expect("inflate");
        assert_eq!(reported, 100);
        assert_eq!(buffer, vec![7; 100]);
    }

    #[test]
    fn inflate_rejects_wrong_buffer_size() {
        let compressed = deflate(&[1, 2, 3, 4]).expect("deflate");
        let mut buffer = vec![0_u8; 3];
        let result = inflate(&compressed, |_| Ok(&mut buffer[..]));
        assert_eq!(
            result,
            Err(CodecError::SizeMismatch {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn inflate_exact_rejects_wrong_size() {
        let compressed = deflate(&[0; 16]).expect("deflate");
        assert_eq!(
            inflate_exact(&compressed, 8),
            Err(CodecError::SizeMismatch {
                expected: 8,
                actual: 16
            })
        );
    }

    #[test]
    fn inflate_rejects_garbage() {
        assert!(matches!(
            inflate_exact(b"not a zlib stream", 4),
            Err(CodecError::Inflate(_))
        ));
    }
}
