//! PNG validation, color-model normalization, resize, dark-mode recolor and
//! watermark compositing.
//!
//! Grounded on `original_source/worker.go` (`convertAndOptimizePNG`,
//! `palettedToRGBA`, `rgba64ToRGBA`, `resizePng`, `ConvertToDarkMode`,
//! `overlayImages`, `colorDistance`) and spec §4.6. `validatePNGFile` itself
//! was not present in the retrieved source; the chunk-walk below is built
//! directly from the signature/IHDR/IDAT/IEND contract in spec §4.6/§8.

use std::path::Path;

use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::error::ImageError;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Navy background used by the pixel-level dark recolor routine.
const COLOR_BACKGROUND: Rgba<u8> = Rgba([40, 40, 86, 255]);
/// Sky-yellow text color used by the pixel-level dark recolor routine.
const COLOR_TEXT: Rgba<u8> = Rgba([250, 226, 203, 255]);

/// Walk a PNG's chunk structure without decoding pixel data, per spec §4.6.
pub fn validate_png(path: &Path, bytes: &[u8]) -> Result<(), ImageError> {
    if bytes.len() < 8 || bytes[0..8] != PNG_SIGNATURE {
        return Err(ImageError::BadSignature { path: path.to_path_buf() });
    }

    let mut offset = 8usize;
    let mut ihdr_count = 0u32;
    let mut has_idat = false;
    let mut has_iend = false;

    while offset + 8 <= bytes.len() {
        let length = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap());
        let chunk_type = &bytes[offset + 4..offset + 8];
        let data_end = offset + 8 + length as usize;
        let chunk_end = data_end + 4; // + CRC
        if chunk_end > bytes.len() {
            return Err(ImageError::TruncatedChunks { path: path.to_path_buf() });
        }

        match chunk_type {
            b"IHDR" => {
                ihdr_count += 1;
                if length != 13 {
                    return Err(ImageError::BadIhdrLength {
                        path: path.to_path_buf(),
                        length,
                    });
                }
            }
            b"IDAT" => has_idat = true,
            b"IEND" => {
                if length != 0 {
                    return Err(ImageError::BadIend { path: path.to_path_buf() });
                }
                has_iend = true;
            }
            _ => {}
        }

        offset = chunk_end;
        if has_iend {
            break;
        }
    }

    if ihdr_count == 0 {
        return Err(ImageError::MissingIhdr { path: path.to_path_buf() });
    }
    if ihdr_count > 1 {
        return Err(ImageError::MultipleIhdr { path: path.to_path_buf() });
    }
    if !has_idat {
        return Err(ImageError::MissingIdat { path: path.to_path_buf() });
    }
    if !has_iend {
        return Err(ImageError::BadIend { path: path.to_path_buf() });
    }

    Ok(())
}

/// Normalize a decoded image to 8-bit RGBA, regardless of the source's
/// color model (paletted, non-premultiplied, or 16-bit).
pub fn normalize_to_rgba8(img: DynamicImage) -> RgbaImage {
    img.to_rgba8()
}

/// Bilinear resize to `target_width`, deriving height from the aspect ratio.
pub fn resize_bilinear(img: &RgbaImage, target_width: u32) -> RgbaImage {
    let (width, height) = img.dimensions();
    let target_height = ((target_width as f64 / width as f64) * height as f64).round() as u32;
    image::imageops::resize(img, target_width, target_height.max(1), image::imageops::FilterType::Triangle)
}

/// Encode `img` as a JPEG at `quality` (1-100), progressive when `progressive`
/// is set (per the configurable `progressive_jpeg` setting).
pub fn encode_jpeg(img: &RgbaImage, quality: u8, progressive: bool) -> Result<Vec<u8>, ImageError> {
    let rgb: image::RgbImage = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buffer, quality);
    encoder.set_progressive(progressive);
    encoder
        .encode(&rgb, rgb.width() as u16, rgb.height() as u16, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| ImageError::UnparseableEncode { reason: e.to_string() })?;
    Ok(buffer)
}

fn color_distance(a: Rgba<u8>, b: Rgba<u8>) -> i64 {
    let scale = |v: u8| -> i64 { v as i64 * 257 };
    let dr = scale(a[0]) - scale(b[0]);
    let dg = scale(a[1]) - scale(b[1]);
    let db = scale(a[2]) - scale(b[2]);
    dr * dr + dg * dg + db * db
}

/// Alternate pixel-level dark-mode recolor, retained as a library routine
/// per spec §4.6's "alternate algorithm" note.
pub fn recolor_dark_pixels(img: &RgbaImage) -> RgbaImage {
    const NEAR_BLACK: i64 = 0x050505 * 0x050505;
    const NEAR_WHITE: i64 = 0x0F0F0F * 0x0F0F0F;
    let black = Rgba([0, 0, 0, 255]);
    let white = Rgba([255, 255, 255, 255]);

    let mut out = RgbaImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let recolored = if color_distance(*pixel, black) <= NEAR_BLACK {
            COLOR_TEXT
        } else if color_distance(*pixel, white) <= NEAR_WHITE {
            COLOR_BACKGROUND
        } else {
            *pixel
        };
        out.put_pixel(x, y, recolored);
    }
    out
}

/// Composite `overlay` over `base` (Src then Over), used for watermarking.
pub fn overlay(base: &RgbaImage, overlay_img: &RgbaImage) -> RgbaImage {
    let mut out = base.clone();
    for (x, y, pixel) in overlay_img.enumerate_pixels() {
        if x >= out.width() || y >= out.height() {
            continue;
        }
        let alpha = pixel[3] as f32 / 255.0;
        if alpha <= 0.0 {
            continue;
        }
        let existing = *out.get_pixel(x, y);
        let blend = |src: u8, dst: u8| -> u8 { (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8 };
        out.put_pixel(
            x,
            y,
            Rgba([
                blend(pixel[0], existing[0]),
                blend(pixel[1], existing[1]),
                blend(pixel[2], existing[2]),
                255,
            ]),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_minimal_png_bytes(ihdr_count: u8, idat_count: u8, with_iend: bool, ihdr_length: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        let push_chunk = |bytes: &mut Vec<u8>, typ: &[u8; 4], length: u32| {
            bytes.extend_from_slice(&length.to_be_bytes());
            bytes.extend_from_slice(typ);
            bytes.extend(std::iter::repeat(0u8).take(length as usize));
            bytes.extend_from_slice(&[0, 0, 0, 0]); // fake CRC
        };
        for _ in 0..ihdr_count {
            push_chunk(&mut bytes, b"IHDR", ihdr_length);
        }
        for _ in 0..idat_count {
            push_chunk(&mut bytes, b"IDAT", 4);
        }
        if with_iend {
            push_chunk(&mut bytes, b"IEND", 0);
        }
        bytes
    }

    #[test]
    fn rejects_bad_signature() {
        let bytes = vec![0u8; 16];
        let err = validate_png(Path::new("x.png"), &bytes).unwrap_err();
        assert!(matches!(err, ImageError::BadSignature { .. }));
    }

    #[test]
    fn rejects_missing_ihdr() {
        let bytes = make_minimal_png_bytes(0, 1, true, 13);
        let err = validate_png(Path::new("x.png"), &bytes).unwrap_err();
        assert!(matches!(err, ImageError::MissingIhdr { .. }));
    }

    #[test]
    fn rejects_multiple_ihdr() {
        let bytes = make_minimal_png_bytes(2, 1, true, 13);
        let err = validate_png(Path::new("x.png"), &bytes).unwrap_err();
        assert!(matches!(err, ImageError::MultipleIhdr { .. }));
    }

    #[test]
    fn rejects_wrong_ihdr_length() {
        let bytes = make_minimal_png_bytes(1, 1, true, 10);
        let err = validate_png(Path::new("x.png"), &bytes).unwrap_err();
        assert!(matches!(err, ImageError::BadIhdrLength { .. }));
    }

    #[test]
    fn rejects_missing_idat() {
        let bytes = make_minimal_png_bytes(1, 0, true, 13);
        let err = validate_png(Path::new("x.png"), &bytes).unwrap_err();
        assert!(matches!(err, ImageError::MissingIdat { .. }));
    }

    #[test]
    fn rejects_missing_iend() {
        let bytes = make_minimal_png_bytes(1, 1, false, 13);
        let err = validate_png(Path::new("x.png"), &bytes).unwrap_err();
        assert!(matches!(err, ImageError::BadIend { .. }));
    }

    #[test]
    fn accepts_well_formed_minimal_png() {
        let bytes = make_minimal_png_bytes(1, 1, true, 13);
        assert!(validate_png(Path::new("x.png"), &bytes).is_ok());
    }

    #[test]
    fn resize_preserves_aspect_ratio() {
        let img = RgbaImage::new(200, 100);
        let resized = resize_bilinear(&img, 100);
        assert_eq!(resized.width(), 100);
        assert_eq!(resized.height(), 50);
    }

    #[test]
    fn dark_recolor_maps_black_and_white_extremes() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let recolored = recolor_dark_pixels(&img);
        assert_eq!(*recolored.get_pixel(0, 0), COLOR_TEXT);
        assert_eq!(*recolored.get_pixel(1, 0), COLOR_BACKGROUND);
    }

    #[test]
    fn dark_recolor_passes_through_midtones() {
        let mut img = RgbaImage::new(1, 1);
        img.put_pixel(0, 0, Rgba([128, 64, 200, 255]));
        let recolored = recolor_dark_pixels(&img);
        assert_eq!(*recolored.get_pixel(0, 0), Rgba([128, 64, 200, 255]));
    }
}
