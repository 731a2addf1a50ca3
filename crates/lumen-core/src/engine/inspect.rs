//! Header-only inspection: format, dimensions, colour type, ICC and EXIF.

use exif::{In, Reader, Tag, Value};
use image::{ColorType, ImageDecoder, ImageError, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

use crate::error::EngineError;
use crate::input::{FinishedInput, RawSpec};
use crate::types::ImageMetadata;

/// Inspect `bytes` as described by `input`. Runs on a blocking thread.
pub(crate) fn inspect(bytes: &[u8], input: &FinishedInput) -> Result<ImageMetadata, EngineError> {
    if let Some(raw) = input.raw {
        return inspect_raw(bytes, raw, input);
    }

    let (reader, format) = open_reader(bytes, input.path())?;
    let mut decoder = reader.into_decoder().map_err(image_error)?;
    let (width, height) = decoder.dimensions();
    check_pixel_limit(width, height, input.limit_input_pixels)?;

    let color = decoder.color_type();
    // Lenient: a broken ICC chunk should not fail the whole query.
    let icc = decoder.icc_profile().ok().flatten();
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok();

    Ok(ImageMetadata {
        format: format_to_string(format),
        width,
        height,
        space: space_for(color).to_string(),
        channels: color.channel_count(),
        depth: depth_for(color).to_string(),
        density: exif.as_ref().and_then(exif_density).or(input.density),
        has_profile: icc.is_some(),
        has_alpha: color.has_alpha(),
        orientation: exif.as_ref().and_then(|e| get_u32(e, Tag::Orientation)),
        exif: exif.as_ref().map(|e| e.buf().to_vec()),
        icc,
    })
}

fn inspect_raw(bytes: &[u8], raw: RawSpec, input: &FinishedInput) -> Result<ImageMetadata, EngineError> {
    check_raw_len(bytes, raw)?;
    check_pixel_limit(raw.width, raw.height, input.limit_input_pixels)?;
    Ok(ImageMetadata {
        format: "raw".to_string(),
        width: raw.width,
        height: raw.height,
        space: if raw.channels < 3 { "b-w" } else { "srgb" }.to_string(),
        channels: raw.channels,
        depth: "uchar".to_string(),
        density: input.density,
        has_profile: false,
        has_alpha: raw.channels == 2 || raw.channels == 4,
        orientation: None,
        exif: None,
        icc: None,
    })
}

/// Open a reader with the format detected by content, falling back to the
/// path's extension.
pub(super) fn open_reader<'a>(
    bytes: &'a [u8],
    path: Option<&Path>,
) -> Result<(ImageReader<Cursor<&'a [u8]>>, ImageFormat), EngineError> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EngineError::Decode(format!("Cannot detect image format: {e}")))?;
    let format = match reader.format() {
        Some(format) => format,
        None => {
            let format = path
                .and_then(|p| ImageFormat::from_path(p).ok())
                .ok_or(EngineError::UnsupportedFormat { detail: None })?;
            reader.set_format(format);
            format
        }
    };
    Ok((reader, format))
}

pub(super) fn check_pixel_limit(width: u32, height: u32, limit: u64) -> Result<(), EngineError> {
    if limit > 0 && width as u64 * height as u64 > limit {
        return Err(EngineError::PixelLimitExceeded {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

pub(super) fn check_raw_len(bytes: &[u8], raw: RawSpec) -> Result<(), EngineError> {
    match raw.expected_len() {
        Some(expected) if bytes.len() == expected => Ok(()),
        expected => Err(EngineError::RawLength {
            actual: bytes.len(),
            // Unaddressable sizes can never match.
            expected: expected.unwrap_or(usize::MAX),
            width: raw.width,
            height: raw.height,
            channels: raw.channels,
        }),
    }
}

pub(super) fn image_error(err: ImageError) -> EngineError {
    match err {
        ImageError::Unsupported(e) => EngineError::UnsupportedFormat {
            detail: Some(e.to_string()),
        },
        other => EngineError::Decode(other.to_string()),
    }
}

/// Convert an ImageFormat to a string representation.
pub(super) fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Ico => "ico".to_string(),
        ImageFormat::Pnm => "pnm".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        other => other
            .extensions_str()
            .first()
            .copied()
            .unwrap_or("unknown")
            .to_string(),
    }
}

fn space_for(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::La8 => "b-w",
        ColorType::L16 | ColorType::La16 => "grey16",
        ColorType::Rgb16 | ColorType::Rgba16 => "rgb16",
        ColorType::Rgb32F | ColorType::Rgba32F => "scrgb",
        _ => "srgb",
    }
}

fn depth_for(color: ColorType) -> &'static str {
    match color.bytes_per_pixel() / color.channel_count().max(1) {
        2 => "ushort",
        4 => "float",
        _ => "uchar",
    }
}

/// Get a u32 field from EXIF data.
fn get_u32(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Short(v) => v.first().map(|&x| x as u32),
            Value::Long(v) => v.first().copied(),
            _ => None,
        })
}

/// Horizontal resolution in pixels per inch, converting from centimetres.
fn exif_density(exif: &exif::Exif) -> Option<u32> {
    let resolution = exif
        .get_field(Tag::XResolution, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Rational(v) => v.first().map(|r| r.to_f64()),
            _ => None,
        })?;
    let per_inch = match get_u32(exif, Tag::ResolutionUnit) {
        Some(3) => resolution * 2.54,
        _ => resolution,
    };
    (per_inch.is_finite() && per_inch >= 1.0).then(|| per_inch.round() as u32)
}
