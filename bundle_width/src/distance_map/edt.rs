//! Exact Euclidean distance transform.
//!
//! Separable lower-envelope-of-parabolas algorithm (Felzenszwalb &
//! Huttenlocher): a 1D squared-distance pass down every column, then a pass
//! along every row of that result, then a square root.

use common::Buffer2;
use rayon::prelude::*;

use super::DistanceTransform;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEuclideanTransform;

impl DistanceTransform for ExactEuclideanTransform {
    fn transform(&self, mask: &Buffer2<bool>) -> Buffer2<f64> {
        let (width, height) = mask.dimensions();

        // Without any background cell there is nothing to measure against.
        if mask.iter().all(|&foreground| foreground) {
            return Buffer2::new_default(width, height);
        }

        let seeds = mask
            .transposed()
            .map(|&foreground| if foreground { f64::INFINITY } else { 0.0 });
        let columns = squared_distance_rows(&seeds).transposed();
        let squared = squared_distance_rows(&columns);

        squared.map(|&d| d.sqrt())
    }
}

/// Applies the 1D squared distance transform to every row.
fn squared_distance_rows(src: &Buffer2<f64>) -> Buffer2<f64> {
    let (width, height) = src.dimensions();
    let mut out = vec![0.0f64; width * height];

    out.par_chunks_mut(width).enumerate().for_each_init(
        || Envelope::with_capacity(width),
        |envelope, (y, out_row)| envelope.squared_distance(src.row(y), out_row),
    );

    Buffer2::new(width, height, out)
}

/// Scratch space for the lower envelope of one row.
struct Envelope {
    /// Positions of the parabolas forming the envelope.
    vertices: Vec<usize>,
    /// Left boundary of each envelope parabola.
    boundaries: Vec<f64>,
}

impl Envelope {
    fn with_capacity(len: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(len),
            boundaries: Vec::with_capacity(len),
        }
    }

    /// `out[q] = min_p (q - p)^2 + f[p]`. Infinite `f[p]` never contributes;
    /// a row of only infinite samples stays infinite.
    fn squared_distance(&mut self, f: &[f64], out: &mut [f64]) {
        self.vertices.clear();
        self.boundaries.clear();

        for (q, &fq) in f.iter().enumerate() {
            if !fq.is_finite() {
                continue;
            }
            let qf = q as f64;
            let mut boundary = f64::NEG_INFINITY;
            while let Some(&p) = self.vertices.last() {
                let pf = p as f64;
                let s = ((fq + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf));
                if self.boundaries.last().is_some_and(|&z| s <= z) {
                    self.vertices.pop();
                    self.boundaries.pop();
                } else {
                    boundary = s;
                    break;
                }
            }
            self.vertices.push(q);
            self.boundaries.push(boundary);
        }

        if self.vertices.is_empty() {
            out.fill(f64::INFINITY);
            return;
        }

        let mut j = 0;
        for (q, out) in out.iter_mut().enumerate() {
            let qf = q as f64;
            while j + 1 < self.vertices.len() && self.boundaries[j + 1] < qf {
                j += 1;
            }
            let p = self.vertices[j];
            let dq = qf - p as f64;
            *out = dq * dq + f[p];
        }
    }
}
