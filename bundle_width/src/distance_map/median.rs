//! Median filter specialised for binary masks.
//!
//! The median of a window of booleans is `true` exactly when enough cells
//! are `true`, so the filter reduces to a separable box count.

use common::Buffer2;
use rayon::prelude::*;

use super::{MedianFilter, reflect_index};

/// Box-count median over a `size x size` window with reflected borders.
///
/// For an even `size` the window spans `[p - size/2, p + (size - 1)/2]` and
/// the median is the sorted element at rank `n/2` (the upper median).
#[derive(Debug, Clone, Copy, Default)]
pub struct MajorityMedianFilter;

impl MedianFilter for MajorityMedianFilter {
    fn filter(&self, mask: &Buffer2<bool>, size: usize) -> Buffer2<bool> {
        if size <= 1 {
            return mask.clone();
        }

        let counts = mask.map(|&v| v as u32);
        let horizontal = box_sum_rows(&counts, size);
        let window = box_sum_rows(&horizontal.transposed(), size).transposed();

        let n = (size * size) as u32;
        let min_true = n - n / 2;
        window.map(|&count| count >= min_true)
    }
}

/// Sum of each row over a `size`-wide window anchored at `size / 2`.
fn box_sum_rows(src: &Buffer2<u32>, size: usize) -> Buffer2<u32> {
    let (width, height) = src.dimensions();
    let anchor = (size / 2) as isize;
    let mut out = vec![0u32; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = src.row(y);
            for (x, out) in out_row.iter_mut().enumerate() {
                let start = x as isize - anchor;
                *out = (0..size as isize)
                    .map(|k| row[reflect_index(start + k, width)])
                    .sum();
            }
        });

    Buffer2::new(width, height, out)
}
