//! Side-by-side PNG preview of one frame's processing stages.

use std::io::Cursor;

use common::Buffer2;
use image::{GrayImage, ImageFormat, Luma};

use crate::analysis::MovieAnalysis;
use crate::config::DistanceMapConfig;
use crate::distance_map::DistanceMapBuilder;
use crate::error::{Error, Result};
use crate::movie::FrameStack;

/// Width of the separator between panels.
const PANEL_GAP: u32 = 4;
const GAP_VALUE: u8 = 128;

/// PNG of three panels left to right: the grayscale image, the denoised
/// mask and the distance map. Image and distance map are min-max stretched.
pub fn render_preview(
    image: &Buffer2<f32>,
    mask: &Buffer2<bool>,
    distance: &Buffer2<f64>,
) -> Result<Vec<u8>> {
    if !image.same_shape(mask) || !image.same_shape(distance) {
        return Err(Error::invalid(
            "preview",
            format!(
                "panel shapes differ: image {:?}, mask {:?}, distance {:?}",
                image.dimensions(),
                mask.dimensions(),
                distance.dimensions()
            ),
        ));
    }

    let panels = [
        stretched(image.pixels().iter().map(|&v| v as f64), image)?,
        to_gray(mask.map(|&m| if m { 255 } else { 0 }))?,
        stretched(distance.pixels().iter().copied(), distance)?,
    ];
    let combined = side_by_side(&panels);

    let mut bytes = Vec::new();
    combined
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::Render(e.to_string()))?;
    Ok(bytes)
}

/// Rebuilds the distance map of the middle processed frame and renders it.
pub fn example_preview(
    stack: &FrameStack,
    analysis: &MovieAnalysis,
    config: &DistanceMapConfig,
) -> Result<Vec<u8>> {
    let index = analysis
        .example_frame_index()
        .ok_or_else(|| Error::Render("analysis has no processed frames".to_string()))?;
    if index >= stack.len() {
        return Err(Error::Render(format!(
            "example frame {index} is outside a movie of {} frames",
            stack.len()
        )));
    }

    let image = stack.frame(index).to_grayscale();
    let map = DistanceMapBuilder::new(*config)?.build(&image)?;
    tracing::debug!(frame = index, "Rendering preview");
    render_preview(&image, &map.mask, &map.distance)
}

fn stretched<T>(values: impl Iterator<Item = f64> + Clone, shape: &Buffer2<T>) -> Result<GrayImage> {
    let (min, max) = values
        .clone()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;

    let bytes: Vec<u8> = values
        .map(|v| {
            if range > 0.0 && v.is_finite() {
                (((v - min) / range) * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect();
    to_gray(Buffer2::new(shape.width(), shape.height(), bytes))
}

fn to_gray(buffer: Buffer2<u8>) -> Result<GrayImage> {
    let (width, height) = buffer.dimensions();
    GrayImage::from_raw(width as u32, height as u32, buffer.into_vec())
        .ok_or_else(|| Error::Render(format!("cannot build {width}x{height} panel")))
}

fn side_by_side(panels: &[GrayImage]) -> GrayImage {
    let height = panels.iter().map(|p| p.height()).max().unwrap_or(0);
    let width = panels.iter().map(|p| p.width()).sum::<u32>()
        + PANEL_GAP * panels.len().saturating_sub(1) as u32;

    let mut result = GrayImage::from_pixel(width, height, Luma([GAP_VALUE]));
    let mut offset = 0;
    for panel in panels {
        for (x, y, pixel) in panel.enumerate_pixels() {
            result.put_pixel(offset + x, y, *pixel);
        }
        offset += panel.width() + PANEL_GAP;
    }
    result
}
