//! PNG reading and writing.
//!
//! The reader accepts any bit depth, paletted and grayscale input and
//! always yields 8-bit RGBA rows. The writer emits 8-bit RGBA with no
//! interlacing and default compression and filtering.

use std::io::{Read, Write};

use png::{BitDepth, ColorType, Transformations};

use crate::CodecError;

pub const MAX_PNG_DIMENSION: u32 = 32767;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Whether `buf` starts with the PNG signature. Used to sniff image file
/// formats before committing to a reader.
pub fn guess(buf: &[u8]) -> bool {
    buf.len() >= PNG_SIGNATURE.len() && buf[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

pub struct DecodedPng {
    pub width: u32,
    pub height: u32,
    /// Tightly packed 8-bit RGBA rows.
    pub rgba: Vec<u8>,
}

pub fn read<R: Read>(reader: R) -> Result<DecodedPng, CodecError> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut png_reader = decoder
        .read_info()
        .map_err(|error| CodecError::Png(error.to_string()))?;

    let info = png_reader.info();
    let width = info.width;
    let height = info.height;
    if width == 0 || height == 0 || width > MAX_PNG_DIMENSION || height > MAX_PNG_DIMENSION {
        return Err(CodecError::TooLarge { width, height });
    }

    let mut buffer = vec![0_u8; png_reader.output_buffer_size()];
    let frame = png_reader
        .next_frame(&mut buffer)
        .map_err(|error| CodecError::Png(error.to_string()))?;
    buffer.truncate(frame.buffer_size());

    if frame.bit_depth != BitDepth::Eight {
        return Err(CodecError::Png(format!(
            "expected 8-bit samples after transformation, got {:?}",
            frame.bit_depth
        )));
    }

    let samples_per_pixel = match frame.color_type {
        ColorType::Rgba => 4,
        ColorType::Rgb => 3,
        ColorType::GrayscaleAlpha => 2,
        ColorType::Grayscale => 1,
        ColorType::Indexed => {
            return Err(CodecError::Png(
                "indexed color was not expanded".to_string(),
            ));
        }
    };
    let expected_row = width as usize * samples_per_pixel;
    let actual_row = frame.buffer_size() / height as usize;
    if actual_row != expected_row {
        return Err(CodecError::Png(format!(
            "expected row length of {expected_row}, but got {actual_row}"
        )));
    }

    let rgba = match frame.color_type {
        ColorType::Rgba => buffer,
        ColorType::Rgb => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for chunk in buffer.chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
            rgba
        }
        ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for chunk in buffer.chunks_exact(2) {
                rgba.extend_from_slice(&[chunk[0], chunk[0], chunk[0], chunk[1]]);
            }
            rgba
        }
        ColorType::Grayscale => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for &gray in &buffer {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
            rgba
        }
        ColorType::Indexed => unreachable!(),
    };

    for text_chunk in png_reader.info().utf8_text.iter() {
        // Text chunks are harmless but unexpected in canvas payloads.
        log::warn!("ignoring png text chunk {:?}", text_chunk.keyword);
    }

    Ok(DecodedPng {
        width,
        height,
        rgba,
    })
}

pub fn write<W: Write>(
    writer: W,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<(), CodecError> {
    if width == 0 || height == 0 || width > MAX_PNG_DIMENSION || height > MAX_PNG_DIMENSION {
        return Err(CodecError::TooLarge { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(CodecError::Png(format!(
            "expected {expected} bytes of RGBA data, but got {}",
            rgba.len()
        )));
    }

    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut png_writer = encoder
        .write_header()
        .map_err(|error| CodecError::Png(error.to_string()))?;
    png_writer
        .write_image_data(rgba)
        .map_err(|error| CodecError::Png(error.to_string()))?;
    png_writer
        .finish()
        .map_err(|error| CodecError::Png(error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_recognizes_the_signature() {
        assert!(guess(&PNG_SIGNATURE));
        assert!(!guess(b"GIF89a"));
        assert!(!guess(&PNG_SIGNATURE[..4]));
    }

    #[test]
    fn write_then_read_round_trips() {
        let width = 5;
        let height = 3;
        let rgba: Vec<u8> = (0..width * height * 4).map(|i| (i * 7 % 256) as u8).collect();

        let mut encoded = Vec::new();
        write(&mut encoded, width as u32, height as u32, &rgba).expect("write png");

        let decoded = read(&encoded[..]).expect("read png");
        assert_eq!(decoded.width, width as u32);
        assert_eq!(decoded.height, height as u32);
        assert_eq!(decoded.rgba, rgba);
    }

    #[test]
    fn write_rejects_wrong_buffer_length() {
        let mut encoded = Vec::new();
        assert!(matches!(
            write(&mut encoded, 2, 2, &[0_u8; 3]),
            Err(CodecError::Png(_))
        ));
    }

    #[test]
    fn write_rejects_out_of_range_dimensions() {
        let mut encoded = Vec::new();
        assert!(matches!(
            write(&mut encoded, 0, 1, &[]),
            Err(CodecError::TooLarge { .. })
        ));
        assert!(matches!(
            write(&mut encoded, 40000, 1, &[0; 160000]),
            Err(CodecError::TooLarge { .. })
        ));
    }

    #[test]
    fn read_expands_grayscale_to_rgba() {
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, 2, 1);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header().expect("header");
            writer.write_image_data(&[0x40, 0xc0]).expect("data");
        }
        let decoded = read(&encoded[..]).expect("read png");
        assert_eq!(
            decoded.rgba,
            vec![0x40, 0x40, 0x40, 255, 0xc0, 0xc0, 0xc0, 255]
        );
    }

    #[test]
    fn read_rejects_non_png_input() {
        assert!(matches!(
            read(&b"definitely not a png"[..]),
            Err(CodecError::Png(_))
        ));
    }
}
