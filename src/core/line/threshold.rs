use image::GrayImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// 掩码约定: 255 = 前景, 0 = 背景
pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

pub const DEFAULT_THRESHOLD: u8 = 127;

/// Which side of the threshold counts as line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// `sample >= threshold` is foreground
    #[default]
    Bright,
    /// `sample < threshold` is foreground (dark tape on a light floor)
    Dark,
}

/// 固定阈值二值化（非自适应）
#[derive(Debug, Clone, Copy)]
pub struct Binarizer {
    threshold: u8,
    polarity: Polarity,
}

impl Binarizer {
    pub fn new(threshold: u8, polarity: Polarity) -> Self {
        Self {
            threshold,
            polarity,
        }
    }

    pub fn is_foreground(&self, sample: u8) -> bool {
        match self.polarity {
            Polarity::Bright => sample >= self.threshold,
            Polarity::Dark => sample < self.threshold,
        }
    }

    pub fn apply(&self, grid: &GrayImage) -> GrayImage {
        let mut mask = grid.clone();
        self.apply_in_place(&mut mask);
        mask
    }

    pub fn apply_in_place(&self, grid: &mut GrayImage) {
        let samples: &mut [u8] = grid;
        samples.par_iter_mut().for_each(|v| {
            *v = if self.is_foreground(*v) {
                FOREGROUND
            } else {
                BACKGROUND
            };
        });
    }
}

impl Default for Binarizer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, Polarity::Bright)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_threshold_boundary() {
        let b = Binarizer::default();
        assert!(!b.is_foreground(126));
        assert!(b.is_foreground(127));
        assert!(b.is_foreground(255));
    }

    #[test]
    fn test_dark_polarity() {
        let b = Binarizer::new(100, Polarity::Dark);
        assert!(b.is_foreground(0));
        assert!(b.is_foreground(99));
        assert!(!b.is_foreground(100));
    }

    #[test]
    fn test_apply_same_size_binary() {
        let grid = GrayImage::from_fn(5, 3, |x, _| Luma([(x * 60) as u8]));
        let mask = Binarizer::new(120, Polarity::Bright).apply(&grid);

        assert_eq!(mask.dimensions(), (5, 3));
        for y in 0..3 {
            let row: Vec<u8> = (0..5).map(|x| mask.get_pixel(x, y).0[0]).collect();
            assert_eq!(row, vec![0, 0, 255, 255, 255]);
        }
    }
}
