//! Local (adaptive) threshold maps.

use common::Buffer2;
use rayon::prelude::*;

use super::AdaptiveThreshold;
use crate::config::ThresholdMethod;

/// Gaussian kernel support in standard deviations.
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Separable local-mean threshold with reflected borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalThreshold {
    pub method: ThresholdMethod,
}

impl LocalThreshold {
    pub fn new(method: ThresholdMethod) -> Self {
        Self { method }
    }

    fn kernel(&self, block_size: usize) -> Vec<f64> {
        match self.method {
            ThresholdMethod::Gaussian => gaussian_kernel((block_size as f64 - 1.0) / 6.0),
            ThresholdMethod::Mean => vec![1.0 / block_size as f64; block_size],
        }
    }
}

impl AdaptiveThreshold for LocalThreshold {
    fn threshold_map(&self, image: &Buffer2<f32>, block_size: usize, offset: f32) -> Buffer2<f32> {
        let kernel = self.kernel(block_size);

        let horizontal = correlate_rows(image, &kernel);
        let mut smoothed = correlate_rows(&horizontal.transposed(), &kernel).transposed();

        if offset != 0.0 {
            smoothed.iter_mut().for_each(|v| *v -= offset);
        }
        smoothed
    }
}

/// Normalized Gaussian weights over `[-r, r]` with `r = round(4 * sigma)`.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let inv_two_var = -0.5 / (sigma * sigma);
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|k| ((k * k) as f64 * inv_two_var).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= sum);
    weights
}

/// Maps an out-of-range index onto `[0, len)` by half-sample symmetric
/// reflection: `d c b a | a b c d | d c b a`.
#[inline]
pub fn reflect_index(index: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as isize;
    let period = 2 * len;
    let m = index.rem_euclid(period);
    if m < len {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Correlates every row with `kernel`, whose center sits at `len / 2`.
fn correlate_rows(src: &Buffer2<f32>, kernel: &[f64]) -> Buffer2<f32> {
    let (width, height) = src.dimensions();
    let anchor = (kernel.len() / 2) as isize;
    let mut out = vec![0.0f32; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = src.row(y);
            for (x, out) in out_row.iter_mut().enumerate() {
                let start = x as isize - anchor;
                let acc: f64 = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, &w)| w * row[reflect_index(start + k as isize, width)] as f64)
                    .sum();
                *out = acc as f32;
            }
        });

    Buffer2::new(width, height, out)
}
