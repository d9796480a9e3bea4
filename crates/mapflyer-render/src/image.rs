//! Raster images for embedding
//!
//! Decodes the fetched map and rendered QR PNGs into 8-bit samples,
//! supports the pixel-margin crop applied to the map (the static-map
//! response carries an attribution strip the flyer cuts off), and wraps
//! the samples into a PDF Image XObject with FlateDecode.

use std::io::{Cursor, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, Stream};

use crate::error::RenderError;

/// Pixel margins trimmed from each edge of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CropMargins {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleFormat {
    Gray,
    Rgb,
}

impl SampleFormat {
    fn channels(self) -> u32 {
        match self {
            SampleFormat::Gray => 1,
            SampleFormat::Rgb => 3,
        }
    }

    fn color_space(self) -> &'static [u8] {
        match self {
            SampleFormat::Gray => b"DeviceGray",
            SampleFormat::Rgb => b"DeviceRGB",
        }
    }
}

/// A decoded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    width: u32,
    height: u32,
    format: SampleFormat,
    data: Vec<u8>,
}

impl EmbeddedImage {
    /// Decode a PNG into 8-bit grayscale or RGB samples. Alpha channels
    /// are dropped; palettes and sub-byte depths are expanded.
    pub fn from_png(bytes: &[u8]) -> Result<Self, RenderError> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder
            .read_info()
            .map_err(|e| RenderError::Png(e.to_string()))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| RenderError::Png(e.to_string()))?;
        buf.truncate(info.buffer_size());

        let (format, data) = match info.color_type {
            png::ColorType::Grayscale => (SampleFormat::Gray, buf),
            png::ColorType::Rgb => (SampleFormat::Rgb, buf),
            png::ColorType::GrayscaleAlpha => (
                SampleFormat::Gray,
                buf.chunks_exact(2).map(|px| px[0]).collect(),
            ),
            png::ColorType::Rgba => (
                SampleFormat::Rgb,
                buf.chunks_exact(4)
                    .flat_map(|px| px[..3].to_vec())
                    .collect(),
            ),
            other => {
                return Err(RenderError::Image(format!(
                    "Unsupported color type after expansion: {:?}",
                    other
                )))
            }
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[u8] {
        &self.data
    }

    /// Trim the given margins off each edge.
    pub fn crop(&self, margins: CropMargins) -> Result<Self, RenderError> {
        if margins.left + margins.right >= self.width
            || margins.top + margins.bottom >= self.height
        {
            return Err(RenderError::Image(format!(
                "Crop margins {:?} exceed image size {}x{}",
                margins, self.width, self.height
            )));
        }

        let channels = self.format.channels() as usize;
        let new_width = self.width - margins.left - margins.right;
        let new_height = self.height - margins.top - margins.bottom;
        let row_bytes = self.width as usize * channels;

        let mut data = Vec::with_capacity(new_width as usize * new_height as usize * channels);
        for y in margins.top..margins.top + new_height {
            let start = y as usize * row_bytes + margins.left as usize * channels;
            data.extend_from_slice(&self.data[start..start + new_width as usize * channels]);
        }

        Ok(Self {
            width: new_width,
            height: new_height,
            format: self.format,
            data,
        })
    }

    /// Build the PDF Image XObject stream with FlateDecode samples.
    pub(crate) fn to_xobject(&self) -> Result<Stream, RenderError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.data)?;
        let compressed = encoder.finish()?;

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(self.width as i64));
        dict.set("Height", Object::Integer(self.height as i64));
        dict.set("ColorSpace", Object::Name(self.format.color_space().to_vec()));
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));

        Ok(Stream::new(dict, compressed))
    }
}
