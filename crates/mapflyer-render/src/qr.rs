//! QR code rendering
//!
//! Encodes link text with low error correction and rasterizes the module
//! matrix straight to a grayscale PNG: each module becomes a fixed-size
//! box, surrounded by a two-module quiet zone.

use qrcode::{Color, EcLevel, QrCode};

use crate::error::RenderError;

/// Pixels per QR module.
const BOX_SIZE: u32 = 20;

/// Quiet zone around the symbol, in modules.
const QUIET_ZONE: u32 = 2;

/// Render `data` as a grayscale PNG.
pub fn qr_png(data: &str) -> Result<Vec<u8>, RenderError> {
    let code = QrCode::with_error_correction_level(data, EcLevel::L)
        .map_err(|e| RenderError::Qr(e.to_string()))?;

    let modules = code.to_colors();
    let width = code.width() as u32;
    let side = (width + 2 * QUIET_ZONE) * BOX_SIZE;

    let mut pixels = vec![0xFFu8; (side * side) as usize];
    for (i, color) in modules.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let module_x = i as u32 % width;
        let module_y = i as u32 / width;
        let x0 = (module_x + QUIET_ZONE) * BOX_SIZE;
        let y0 = (module_y + QUIET_ZONE) * BOX_SIZE;
        for y in y0..y0 + BOX_SIZE {
            let row = (y * side + x0) as usize;
            pixels[row..row + BOX_SIZE as usize].fill(0x00);
        }
    }

    encode_gray(side, side, &pixels)
}

fn encode_gray(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| RenderError::Png(e.to_string()))?;
    writer
        .write_image_data(pixels)
        .map_err(|e| RenderError::Png(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| RenderError::Png(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::EmbeddedImage;

    #[test]
    fn test_qr_png_is_square_and_decodable() {
        let bytes = qr_png("https://bit.ly/4bTcu4W").unwrap();
        let image = EmbeddedImage::from_png(&bytes).unwrap();
        assert_eq!(image.width(), image.height());
        assert_eq!(image.width() % BOX_SIZE, 0);
    }

    #[test]
    fn test_quiet_zone_is_light_and_finder_is_dark() {
        let bytes = qr_png("hello").unwrap();
        let image = EmbeddedImage::from_png(&bytes).unwrap();
        let side = image.width();
        let samples = image.samples();

        // Top-left corner lies in the quiet zone
        assert_eq!(samples[0], 0xFF);
        // The finder pattern starts right after the quiet zone
        let offset = QUIET_ZONE * BOX_SIZE;
        assert_eq!(samples[(offset * side + offset) as usize], 0x00);
    }

    #[test]
    fn test_longer_payload_grows_the_symbol() {
        let short = qr_png("a").unwrap();
        let long = qr_png(&"a".repeat(120)).unwrap();
        let short_side = EmbeddedImage::from_png(&short).unwrap().width();
        let long_side = EmbeddedImage::from_png(&long).unwrap().width();
        assert!(long_side > short_side);
    }
}
