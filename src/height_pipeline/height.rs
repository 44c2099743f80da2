//! Conversion from trough positions to physical heights

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::height_pipeline::options::CalibrationResults;

/// Height recorded for rows that do not show exactly one or two laser lines.
pub const AMBIGUOUS_HEIGHT: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowHeight {
    /// Height above the calibration plate in millimeters
    Measured(f64),
    /// Zero or more than two troughs; no height can be derived
    Ambiguous { troughs: usize },
}

impl RowHeight {
    pub fn value(&self) -> f64 {
        match self {
            RowHeight::Measured(mm) => *mm,
            RowHeight::Ambiguous { .. } => AMBIGUOUS_HEIGHT,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, RowHeight::Ambiguous { .. })
    }
}

/// One trough means both lines coincide on the plate (height 0); two troughs
/// are converted through `pixel_per_mm`.
///
/// The linear formula ignores `distance_at_0`, `distance_at_10` and
/// `width_of_laser`.
pub fn row_height(troughs: &[usize], calibration: &CalibrationResults) -> RowHeight {
    match troughs {
        [_] => RowHeight::Measured(0.0),
        [a, b] => {
            let pixel_distance = a.abs_diff(*b) as f64;
            RowHeight::Measured(pixel_distance / calibration.pixel_per_mm)
        }
        _ => RowHeight::Ambiguous {
            troughs: troughs.len(),
        },
    }
}

/// Heights of one frame, indexed by row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightMap {
    heights: Vec<f64>,
}

impl HeightMap {
    pub fn from_rows(rows: impl IntoIterator<Item = RowHeight>) -> Self {
        Self {
            heights: rows.into_iter().map(|h| h.value()).collect(),
        }
    }

    pub fn get(&self, row: usize) -> Option<f64> {
        self.heights.get(row).copied()
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.heights.iter().copied().enumerate()
    }

    pub fn ambiguous_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter()
            .filter(|&(_, h)| h == AMBIGUOUS_HEIGHT)
            .map(|(row, _)| row)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.heights
    }

    pub fn to_btree_map(&self) -> BTreeMap<usize, f64> {
        self.iter().collect()
    }
}

impl Serialize for HeightMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration(pixel_per_mm: f64) -> CalibrationResults {
        CalibrationResults {
            distance_at_0: 0.0,
            distance_at_10: 10.0,
            width_of_laser: 1.0,
            pixel_per_mm,
        }
    }

    #[test]
    fn one_trough_is_the_baseline() {
        assert_eq!(row_height(&[42], &calibration(3.0)), RowHeight::Measured(0.0));
    }

    #[test]
    fn two_troughs_are_scaled_by_pixel_per_mm() {
        let cal = calibration(4.0);
        assert_eq!(row_height(&[10, 20], &cal), RowHeight::Measured(2.5));
        assert_eq!(row_height(&[20, 10], &cal), RowHeight::Measured(2.5));
        assert_eq!(
            row_height(&[3, 10], &calibration(3.0)),
            RowHeight::Measured(7.0 / 3.0)
        );
    }

    #[test]
    fn zero_or_many_troughs_are_ambiguous() {
        let cal = calibration(1.0);
        assert_eq!(row_height(&[], &cal), RowHeight::Ambiguous { troughs: 0 });
        let three = row_height(&[1, 5, 9], &cal);
        assert_eq!(three, RowHeight::Ambiguous { troughs: 3 });
        assert_eq!(three.value(), AMBIGUOUS_HEIGHT);
        assert!(three.is_ambiguous());
    }

    #[test]
    fn height_map_is_indexed_by_row() {
        let map = HeightMap::from_rows([
            RowHeight::Measured(0.0),
            RowHeight::Ambiguous { troughs: 0 },
            RowHeight::Measured(4.0),
        ]);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(1), Some(AMBIGUOUS_HEIGHT));
        assert_eq!(map.get(3), None);
        assert_eq!(map.ambiguous_rows().collect::<Vec<_>>(), vec![1]);
        assert_eq!(
            map.to_btree_map(),
            BTreeMap::from([(0, 0.0), (1, -1.0), (2, 4.0)])
        );
    }

    #[test]
    fn height_map_serializes_as_row_keyed_object() {
        let map = HeightMap::from_rows([RowHeight::Measured(0.0), RowHeight::Measured(2.0)]);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"0":0.0,"1":2.0}"#);
    }
}
