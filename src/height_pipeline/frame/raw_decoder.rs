//! Camera RAW frame decoder built on rawloader and the bayer crate.
//!
//! Supports any format rawloader can read (ARW, CR2, NEF, DNG, ...). The sensor
//! mosaic is demosaiced assuming an RGGB pattern, then black/white levels are
//! applied so each channel spans the full 16-bit range.

use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::height_pipeline::common::error::{ProcessorError, Result};
use crate::height_pipeline::frame::decoder::FrameDecoder;
use crate::height_pipeline::frame::types::{PixelGrid, Rgba};

pub struct RawFrameDecoder;

/// Bytes per channel in the 16-bit demosaic raster.
const BYTES_PER_CHANNEL: usize = 2;

/// Sensor data as rawloader reports it, before demosaicing.
struct SensorMosaic {
    width: usize,
    height: usize,
    /// Components per pixel; only single-channel Bayer mosaics are supported
    cpp: usize,
    data: RawloaderImageData,
    black_level: u16,
    white_level: u16,
}

impl From<rawloader::RawImage> for SensorMosaic {
    fn from(image: rawloader::RawImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            cpp: image.cpp,
            data: image.data,
            black_level: image.blacklevels[0],
            white_level: image.whitelevels[0],
        }
    }
}

impl FrameDecoder for RawFrameDecoder {
    fn decode(&self, data: &[u8]) -> Result<PixelGrid> {
        debug!("Decoding RAW frame, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ProcessorError::DecodeError(e.to_string()))?;

        demosaic(SensorMosaic::from(decoded))
    }
}

fn demosaic(sensor: SensorMosaic) -> Result<PixelGrid> {
    let SensorMosaic {
        width,
        height,
        cpp,
        data,
        black_level,
        white_level,
    } = sensor;

    if width == 0 || height == 0 {
        return Err(ProcessorError::DecodeError(format!(
            "RAW frame has no pixels ({}x{})",
            width, height
        )));
    }
    if cpp != 1 {
        return Err(ProcessorError::DecodeError(format!(
            "RAW frame has {} components per pixel, expected a single-channel Bayer mosaic",
            cpp
        )));
    }

    // Float data is normalized 0.0-1.0, scale it into the u16 range
    let mosaic: Vec<u16> = match data {
        RawloaderImageData::Integer(values) => values,
        RawloaderImageData::Float(values) => values
            .iter()
            .map(|&v| (v * u16::MAX as f32).clamp(0.0, u16::MAX as f32) as u16)
            .collect(),
    };
    if mosaic.len() != width * height {
        return Err(ProcessorError::DecodeError(format!(
            "RAW mosaic has {} samples, expected {} for {}x{}",
            mosaic.len(),
            width * height,
            width,
            height
        )));
    }

    let mosaic_bytes: Vec<u8> = mosaic.iter().flat_map(|v| v.to_le_bytes()).collect();
    let mut raster_buf = vec![0u8; width * height * 3 * BYTES_PER_CHANNEL];
    {
        let mut raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut raster_buf);
        bayer::run_demosaic(
            &mut Cursor::new(&mosaic_bytes[..]),
            BayerDepth::Depth16LE,
            CFA::RGGB,
            Demosaic::Linear,
            &mut raster,
        )
        .map_err(|e| ProcessorError::DecodeError(format!("demosaic failed: {:?}", e)))?;
    }

    let black_level = black_level as f32;
    let white_level = white_level as f32;
    let range = (white_level - black_level).max(1.0);
    debug!(
        "Demosaiced {}x{} (black level {}, white level {})",
        width, height, black_level, white_level
    );

    let normalize = |raw: u16| -> u16 {
        let linear = (raw as f32 - black_level).max(0.0) / range;
        (linear * u16::MAX as f32).clamp(0.0, u16::MAX as f32) as u16
    };

    let pixels = raster_buf
        .chunks_exact(3 * BYTES_PER_CHANNEL)
        .map(|px| {
            let r = u16::from_le_bytes([px[0], px[1]]);
            let g = u16::from_le_bytes([px[2], px[3]]);
            let b = u16::from_le_bytes([px[4], px[5]]);
            Rgba::new(normalize(r), normalize(g), normalize(b), u16::MAX)
        })
        .collect();

    PixelGrid::new(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_raw_bytes_are_a_decode_error() {
        let result = RawFrameDecoder.decode(b"not a raw file");
        assert!(matches!(result, Err(ProcessorError::DecodeError(_))));
    }

    fn mosaic(width: usize, height: usize, cpp: usize, value: u16) -> SensorMosaic {
        SensorMosaic {
            width,
            height,
            cpp,
            data: RawloaderImageData::Integer(vec![value; width * height * cpp]),
            black_level: 0,
            white_level: u16::MAX,
        }
    }

    #[test]
    fn multi_component_pixels_are_a_decode_error() {
        let result = demosaic(mosaic(4, 4, 3, 1000));
        assert!(matches!(result, Err(ProcessorError::DecodeError(msg)) if msg.contains("3 components")));
    }

    #[test]
    fn short_mosaic_is_a_decode_error() {
        let mut sensor = mosaic(4, 4, 1, 0);
        sensor.data = RawloaderImageData::Integer(vec![0; 10]);
        assert!(matches!(demosaic(sensor), Err(ProcessorError::DecodeError(_))));
    }

    #[test]
    fn empty_mosaic_is_a_decode_error() {
        assert!(matches!(
            demosaic(mosaic(0, 4, 1, 0)),
            Err(ProcessorError::DecodeError(_))
        ));
    }

    #[test]
    fn saturated_bayer_mosaic_becomes_white() {
        let grid = demosaic(mosaic(4, 4, 1, u16::MAX)).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 4));
        let white = Rgba::new(u16::MAX, u16::MAX, u16::MAX, u16::MAX);
        assert!(grid.pixels().iter().all(|&p| p == white));
    }

    #[test]
    fn black_level_maps_to_zero() {
        let mut sensor = mosaic(4, 4, 1, 512);
        sensor.black_level = 512;
        sensor.white_level = 4095;
        let grid = demosaic(sensor).unwrap();
        assert!(grid.pixels().iter().all(|p| p.r == 0 && p.g == 0 && p.b == 0));
    }
}
