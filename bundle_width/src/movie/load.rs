use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};

use super::{Frame, FrameDimensions};
use crate::error::{Error, Result};

pub(super) fn load_frames(path: &Path) -> Result<Vec<Frame>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "tif" | "tiff" => load_tiff_pages(path),
        "png" | "jpg" | "jpeg" => Ok(vec![load_single_image(path)?]),
        _ => Err(Error::UnsupportedFormat { extension }),
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> Error {
    Error::Decode {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Reads every page of a (multi-page) TIFF as one frame. Samples keep their
/// stored values; integer types are not rescaled.
fn load_tiff_pages(path: &Path) -> Result<Vec<Frame>> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // Microscopy stacks routinely exceed the default decoder limits.
    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| decode_error(path, e))?
        .with_limits(Limits::unlimited());

    let mut frames = Vec::new();
    loop {
        let page = frames.len();
        let channels = match decoder.colortype().map_err(|e| decode_error(path, e))? {
            tiff::ColorType::Gray(_) => 1,
            tiff::ColorType::GrayA(_) => 2,
            tiff::ColorType::RGB(_) => 3,
            tiff::ColorType::RGBA(_) => 4,
            other => {
                return Err(decode_error(
                    path,
                    format!("page {page}: unsupported color type {other:?}"),
                ));
            }
        };
        let (width, height) = decoder.dimensions().map_err(|e| decode_error(path, e))?;
        let samples = decoder.read_image().map_err(|e| decode_error(path, e))?;
        let pixels = samples_to_f32(samples)
            .ok_or_else(|| decode_error(path, format!("page {page}: unsupported sample format")))?;

        let dimensions = FrameDimensions {
            width: width as usize,
            height: height as usize,
            channels,
        };
        frames.push(Frame::new(dimensions, pixels)?);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(|e| decode_error(path, e))?;
    }

    tracing::debug!(path = %path.display(), pages = frames.len(), "Decoded TIFF pages");
    Ok(frames)
}

fn samples_to_f32(samples: DecodingResult) -> Option<Vec<f32>> {
    let pixels = match samples {
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(pixels)
}

/// Reads a PNG or JPEG as a single frame with samples scaled to [0, 1].
fn load_single_image(path: &Path) -> Result<Frame> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(source) => Error::Io {
            path: path.to_path_buf(),
            source,
        },
        other => decode_error(path, other),
    })?;

    let channels = img.color().channel_count() as usize;
    let pixels = match channels {
        1 => img.to_luma32f().into_raw(),
        2 => img.to_luma_alpha32f().into_raw(),
        3 => img.to_rgb32f().into_raw(),
        _ => img.to_rgba32f().into_raw(),
    };

    let dimensions = FrameDimensions {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: channels.min(4),
    };
    Frame::new(dimensions, pixels)
}
