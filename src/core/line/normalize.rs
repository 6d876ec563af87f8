//! 逐行对比度拉伸
//!
//! 每一行用自己的 min/max 拉伸到 0-255。相机视野里远近光照不同，
//! 整帧统一拉伸会抹掉近处/远处的对比度差异。

use image::GrayImage;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowStats {
    pub min: u8,
    pub max: u8,
}

impl RowStats {
    pub fn from_row(row: &[u8]) -> Option<Self> {
        let (&first, rest) = row.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    /// 整行同值，拉伸无定义
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    /// `255 / (max - min)`, or 0 for a flat row.
    pub fn scale_factor(&self) -> f32 {
        if self.is_degenerate() {
            0.0
        } else {
            255.0 / (self.max - self.min) as f32
        }
    }

    /// `round((v - min) * 255 / (max - min))`, clamped to the byte range.
    pub fn stretch(&self, v: u8) -> u8 {
        if self.is_degenerate() {
            return v;
        }
        let v = v.clamp(self.min, self.max);
        let range = (self.max - self.min) as u32;
        let offset = (v - self.min) as u32;
        // 整数四舍五入: floor((2 * offset * 255 + range) / (2 * range))
        ((offset * 510 + range) / (2 * range)).min(255) as u8
    }
}

pub fn row_stats(grid: &GrayImage) -> Vec<RowStats> {
    let width = grid.width() as usize;
    if width == 0 {
        return Vec::new();
    }
    grid.as_raw()
        .par_chunks(width)
        .filter_map(RowStats::from_row)
        .collect()
}

pub fn normalize_row(row: &mut [u8]) {
    let Some(stats) = RowStats::from_row(row) else {
        return;
    };
    if stats.is_degenerate() {
        return;
    }
    for v in row.iter_mut() {
        *v = stats.stretch(*v);
    }
}

/// In-place, rows processed independently.
pub fn normalize_rows(grid: &mut GrayImage) {
    let width = grid.width() as usize;
    if width == 0 {
        return;
    }
    grid.par_chunks_mut(width).for_each(normalize_row);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_rows_unchanged_for_every_value() {
        for value in 0..=255u8 {
            let mut row = vec![value; 16];
            normalize_row(&mut row);
            assert!(row.iter().all(|&v| v == value), "value {}", value);
        }
    }

    #[test]
    fn test_stretch_hits_full_range() {
        let mut row = vec![40, 90, 60, 41, 89, 75];
        normalize_row(&mut row);

        assert_eq!(*row.iter().min().unwrap(), 0);
        assert_eq!(*row.iter().max().unwrap(), 255);
    }

    #[test]
    fn test_stretch_rounds_to_nearest() {
        let stats = RowStats { min: 10, max: 13 };
        // 1 * 255 / 3 = 85, 2 * 255 / 3 = 170
        assert_eq!(stats.stretch(11), 85);
        assert_eq!(stats.stretch(12), 170);

        let stats = RowStats { min: 0, max: 2 };
        // 127.5 rounds up
        assert_eq!(stats.stretch(1), 128);
    }

    #[test]
    fn test_scale_factor() {
        assert_eq!(RowStats { min: 5, max: 5 }.scale_factor(), 0.0);
        assert_eq!(RowStats { min: 0, max: 255 }.scale_factor(), 1.0);
        assert!((RowStats { min: 100, max: 151 }.scale_factor() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_rows_are_independent() {
        let mut grid = GrayImage::new(4, 3);
        // row 0: 10..40, row 1: flat 77, row 2: 200..220
        for (x, v) in [10u8, 20, 30, 40].into_iter().enumerate() {
            grid.put_pixel(x as u32, 0, image::Luma([v]));
        }
        for x in 0..4 {
            grid.put_pixel(x, 1, image::Luma([77]));
        }
        for (x, v) in [200u8, 220, 210, 205].into_iter().enumerate() {
            grid.put_pixel(x as u32, 2, image::Luma([v]));
        }

        let stats = row_stats(&grid);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0], RowStats { min: 10, max: 40 });
        assert!(stats[1].is_degenerate());

        normalize_rows(&mut grid);

        assert_eq!(grid.get_pixel(0, 0).0[0], 0);
        assert_eq!(grid.get_pixel(3, 0).0[0], 255);
        assert!((0..4).all(|x| grid.get_pixel(x, 1).0[0] == 77));
        assert_eq!(grid.get_pixel(0, 2).0[0], 0);
        assert_eq!(grid.get_pixel(1, 2).0[0], 255);
    }
}
