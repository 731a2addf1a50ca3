//! Straight re-encode of a finished input.

use image::{DynamicImage, ImageBuffer, ImageFormat};
use std::io::Cursor;

use crate::error::EngineError;
use crate::input::{FinishedInput, RawSpec};

use super::inspect::{check_pixel_limit, check_raw_len, image_error, open_reader};

/// Decode `bytes` and encode them as `target` (default: the input's format,
/// or PNG for raw pixels). Runs on a blocking thread.
pub(crate) fn render(
    bytes: &[u8],
    input: &FinishedInput,
    target: Option<ImageFormat>,
) -> Result<Vec<u8>, EngineError> {
    let (image, source_format) = match input.raw {
        Some(raw) => (from_raw(bytes, raw, input.limit_input_pixels)?, ImageFormat::Png),
        None => {
            let (probe, format) = open_reader(bytes, input.path())?;
            let (width, height) = probe.into_dimensions().map_err(image_error)?;
            check_pixel_limit(width, height, input.limit_input_pixels)?;

            let (reader, _) = open_reader(bytes, input.path())?;
            (reader.decode().map_err(image_error)?, format)
        }
    };

    let format = target.unwrap_or(source_format);
    let image = match format {
        // The JPEG encoder has no alpha support.
        ImageFormat::Jpeg if image.color().has_alpha() => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };

    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), format)
        .map_err(|e| EngineError::Encode(e.to_string()))?;
    tracing::trace!(?format, bytes = out.len(), "Encoded output");
    Ok(out)
}

fn from_raw(bytes: &[u8], raw: RawSpec, limit: u64) -> Result<DynamicImage, EngineError> {
    check_raw_len(bytes, raw)?;
    check_pixel_limit(raw.width, raw.height, limit)?;

    let (w, h, data) = (raw.width, raw.height, bytes.to_vec());
    let image = match raw.channels {
        1 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        _ => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
    };
    image.ok_or_else(|| EngineError::Decode("Raw pixel buffer does not match its dimensions".into()))
}
