//! Frame data types

use crate::height_pipeline::common::error::{ProcessorError, Result};

/// A color sample with 16-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub a: u16,
}

impl Rgba {
    pub const RED: Rgba = Rgba::new(u16::MAX, 0, 0, u16::MAX);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u16, g: u16, b: u16, a: u16) -> Self {
        Self { r, g, b, a }
    }

    /// Widens 8-bit channels by replicating each byte into the high byte,
    /// so 0xFF maps to 0xFFFF.
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: widen(r),
            g: widen(g),
            b: widen(b),
            a: widen(a),
        }
    }

    /// The channels reduced to 8 bits by dropping the low byte.
    pub const fn to_rgba8(self) -> [u8; 4] {
        [
            (self.r >> 8) as u8,
            (self.g >> 8) as u8,
            (self.b >> 8) as u8,
            (self.a >> 8) as u8,
        ]
    }
}

const fn widen(v: u8) -> u16 {
    (v as u16) << 8 | v as u16
}

/// Read-only grid of decoded pixels, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelGrid {
    pub fn new(width: usize, height: usize, pixels: Vec<Rgba>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(ProcessorError::DecodeError(format!(
                "expected {} pixels for a {}x{} grid, got {}",
                width * height,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a grid from interleaved RGBA8 bytes.
    pub fn from_rgba8(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != width * height * 4 {
            return Err(ProcessorError::DecodeError(format!(
                "expected {} bytes for a {}x{} RGBA frame, got {}",
                width * height * 4,
                width,
                height,
                bytes.len()
            )));
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|p| Rgba::from_rgba8(p[0], p[1], p[2], p[3]))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Builds a grid from equally long rows.
    pub fn from_rows(rows: Vec<Vec<Rgba>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if let Some(y) = rows.iter().position(|row| row.len() != width) {
            return Err(ProcessorError::DecodeError(format!(
                "row {} has {} pixels, expected {}",
                y,
                rows[y].len(),
                width
            )));
        }
        Self::new(width, height, rows.into_iter().flatten().collect())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn row(&self, y: usize) -> &[Rgba] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgba]> {
        (0..self.height).map(|y| self.row(y))
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_replicates_high_byte() {
        let c = Rgba::from_rgba8(255, 0, 0x12, 1);
        assert_eq!(c, Rgba::new(0xFFFF, 0, 0x1212, 0x0101));
        assert_eq!(c.to_rgba8(), [255, 0, 0x12, 1]);
    }

    #[test]
    fn from_rgba8_rejects_wrong_length() {
        let result = PixelGrid::from_rgba8(2, 2, &[0u8; 15]);
        assert!(matches!(result, Err(ProcessorError::DecodeError(_))));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![vec![Rgba::RED; 3], vec![Rgba::RED; 2]];
        assert!(matches!(
            PixelGrid::from_rows(rows),
            Err(ProcessorError::DecodeError(_))
        ));
    }

    #[test]
    fn rows_are_addressable() {
        let grid = PixelGrid::from_rows(vec![
            vec![Rgba::RED, Rgba::TRANSPARENT],
            vec![Rgba::TRANSPARENT, Rgba::RED],
        ])
        .unwrap();

        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.row(1), &[Rgba::TRANSPARENT, Rgba::RED]);
        assert_eq!(grid.get(0, 0), Some(Rgba::RED));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.rows().count(), 2);
    }

    #[test]
    fn zero_width_grid_still_has_its_rows() {
        let grid = PixelGrid::new(0, 3, Vec::new()).unwrap();
        assert_eq!(grid.rows().count(), grid.height());
        assert!(grid.rows().all(|row| row.is_empty()));
        assert!(grid.row(2).is_empty());
    }
}
