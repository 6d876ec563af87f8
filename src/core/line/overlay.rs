//! 相机画面上的叠加标注

use image::{Pixel, Rgba, RgbaImage};

use super::lanes::LaneBounds;
use super::pipeline::LineEstimate;

/// 半透明红色
pub const MARK_COLOR: Rgba<u8> = Rgba([0xff, 0, 0, 0x80]);

fn blend_rect(canvas: &mut RgbaImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
    let (w, h) = canvas.dimensions();
    let x0 = x0.floor().max(0.0) as u32;
    let y0 = y0.floor().max(0.0) as u32;
    let x1 = (x1.ceil().max(0.0) as u32).min(w);
    let y1 = (y1.ceil().max(0.0) as u32).min(h);

    for y in y0..y1 {
        for x in x0..x1 {
            canvas.get_pixel_mut(x, y).blend(&color);
        }
    }
}

/// Each point becomes a marker spanning its grid row in source pixels.
pub fn draw_line_points(canvas: &mut RgbaImage, estimate: &LineEstimate, half_width: f32) {
    let row_height = estimate.scale.y;
    for (x, y) in estimate.to_source() {
        blend_rect(
            canvas,
            x - half_width,
            y,
            x + half_width,
            y + row_height,
            MARK_COLOR,
        );
    }
}

/// 两条边界各画一个贯穿全高的矩形
pub fn draw_lanes(canvas: &mut RgbaImage, lanes: &LaneBounds) {
    let height = canvas.height() as f32;
    let (left, right) = lanes.to_source();
    for edge in [left, right] {
        blend_rect(canvas, edge.start, 0.0, edge.end, height, MARK_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::line::lanes::EdgeSpan;
    use crate::core::line::reducer::{GridSize, ScaleFactors};
    use crate::core::line::tracker::LinePoint;

    fn black(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_points_marked_in_source_coordinates() {
        let mut canvas = black(40, 40);
        let estimate = LineEstimate {
            points: vec![LinePoint { x: 5.0, y: 2 }],
            scale: ScaleFactors { x: 4.0, y: 4.0 },
            grid: GridSize::new(10, 10),
        };

        draw_line_points(&mut canvas, &estimate, 1.0);

        // x 20 ± 1, rows 8..12
        assert!(canvas.get_pixel(19, 8).0[0] > 0);
        assert!(canvas.get_pixel(20, 11).0[0] > 0);
        assert_eq!(canvas.get_pixel(20, 12).0[0], 0);
        assert_eq!(canvas.get_pixel(22, 9).0[0], 0);
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_lanes_span_full_height() {
        let mut canvas = black(32, 10);
        let lanes = LaneBounds {
            left: EdgeSpan { start: 1.0, end: 2.0 },
            right: EdgeSpan { start: 6.0, end: 7.0 },
            rows: 3,
            scale: ScaleFactors { x: 2.0, y: 1.0 },
        };

        draw_lanes(&mut canvas, &lanes);

        for y in 0..10 {
            assert!(canvas.get_pixel(2, y).0[0] > 0);
            assert!(canvas.get_pixel(13, y).0[0] > 0);
            assert_eq!(canvas.get_pixel(8, y).0[0], 0);
        }
    }

    #[test]
    fn test_out_of_bounds_marks_are_clipped() {
        let mut canvas = black(8, 8);
        let estimate = LineEstimate {
            points: vec![LinePoint { x: 100.0, y: 100 }],
            scale: ScaleFactors::IDENTITY,
            grid: GridSize::new(8, 8),
        };
        draw_line_points(&mut canvas, &estimate, 2.0);
        assert!(canvas.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }
}
