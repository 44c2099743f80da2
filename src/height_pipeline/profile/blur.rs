//! Gaussian pre-blur applied to a frame before scoring.

use rayon::prelude::*;

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::types::{PixelGrid, Rgba};

/// Square `size`×`size` Gaussian kernel with sigma `size / 2`, normalized to sum to 1.
pub fn gaussian_kernel(size: usize) -> Result<Vec<f64>> {
    if size % 2 != 1 {
        return Err(ProcessorError::ConfigurationError(format!(
            "blur kernel size must be a positive odd number, got {}",
            size
        )));
    }

    let half = ((size - 1) / 2) as f64;
    let sigma = size as f64 / 2.0;
    let mut kernel: Vec<f64> = (0..size * size)
        .map(|idx| {
            let dy = (idx / size) as f64 - half;
            let dx = (idx % size) as f64 - half;
            (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    Ok(kernel)
}

/// Blurs the color channels, clamping reads at the frame border. Alpha is
/// carried over unchanged. Rows are blurred in parallel.
pub fn gaussian_blur(grid: &PixelGrid, size: usize) -> Result<PixelGrid> {
    let kernel = gaussian_kernel(size)?;
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Ok(grid.clone());
    }
    let half = (size - 1) / 2;

    let rows: Vec<Vec<Rgba>> = (0..height)
        .into_par_iter()
        .map(|y| {
            (0..width)
                .map(|x| {
                    let mut acc = [0.0f64; 3];
                    for ky in 0..size {
                        let sy = (y + ky).saturating_sub(half).min(height - 1);
                        let src_row = grid.row(sy);
                        for kx in 0..size {
                            let sx = (x + kx).saturating_sub(half).min(width - 1);
                            let weight = kernel[ky * size + kx];
                            let p = src_row[sx];
                            acc[0] += p.r as f64 * weight;
                            acc[1] += p.g as f64 * weight;
                            acc[2] += p.b as f64 * weight;
                        }
                    }
                    let [r, g, b] = acc.map(|v| v.round().clamp(0.0, u16::MAX as f64) as u16);
                    Rgba::new(r, g, b, grid.row(y)[x].a)
                })
                .collect()
        })
        .collect();

    PixelGrid::new(width, height, rows.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_peaks_in_the_center() {
        let kernel = gaussian_kernel(5).unwrap();
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);

        let center = kernel[12];
        assert!(kernel.iter().all(|&k| k <= center));
        assert_eq!(kernel[0], kernel[24]);
    }

    #[test]
    fn even_kernel_is_rejected() {
        assert!(gaussian_kernel(4).is_err());
        assert!(gaussian_kernel(0).is_err());
    }

    #[test]
    fn uniform_frame_is_unchanged() {
        let color = Rgba::from_rgba8(40, 120, 200, 255);
        let grid = PixelGrid::new(6, 4, vec![color; 24]).unwrap();
        assert_eq!(gaussian_blur(&grid, 3).unwrap(), grid);
    }

    #[test]
    fn blur_spreads_a_single_line() {
        let mut rows = vec![vec![Rgba::TRANSPARENT; 7]; 3];
        for row in rows.iter_mut() {
            row[3] = Rgba::RED;
        }
        let grid = PixelGrid::from_rows(rows).unwrap();
        let blurred = gaussian_blur(&grid, 3).unwrap();

        let line = blurred.get(3, 1).unwrap();
        let beside = blurred.get(2, 1).unwrap();
        let far = blurred.get(0, 1).unwrap();
        assert!(line.r > beside.r);
        assert!(beside.r > 0);
        assert_eq!(far.r, 0);
    }

    #[test]
    fn size_one_is_identity() {
        let grid = PixelGrid::from_rows(vec![vec![Rgba::RED, Rgba::TRANSPARENT]]).unwrap();
        assert_eq!(gaussian_blur(&grid, 1).unwrap(), grid);
    }

    #[test]
    fn alpha_is_not_blurred() {
        let grid = PixelGrid::from_rows(vec![vec![
            Rgba::TRANSPARENT,
            Rgba::RED,
            Rgba::TRANSPARENT,
        ]])
        .unwrap();
        let blurred = gaussian_blur(&grid, 3).unwrap();

        let alpha: Vec<u16> = blurred.row(0).iter().map(|p| p.a).collect();
        assert_eq!(alpha, vec![0, u16::MAX, 0]);
        assert!(blurred.get(0, 0).unwrap().r > 0);
    }
}
