use image::GrayImage;
use rayon::prelude::*;
use serde::Serialize;

use super::threshold::BACKGROUND;

/// 最小游程宽度，宽度为 1 的游程视为噪声
pub const MIN_RUN_WIDTH: u32 = 2;

/// One row's candidate line centers, left to right.
pub type RowCandidates = Vec<f32>;

/// 一行中连续前景像素的游程，`end` 不包含
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Blob {
    pub start: u32,
    pub end: u32,
}

impl Blob {
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    pub fn center(&self) -> f32 {
        (self.start + self.end) as f32 / 2.0
    }
}

/// Single left-to-right scan over one mask row. Any non-zero byte is foreground.
pub fn find_blobs(row: &[u8]) -> Vec<Blob> {
    let mut blobs = Vec::new();
    let mut run_start: Option<u32> = None;

    for (x, &v) in row.iter().enumerate() {
        let x = x as u32;
        match (run_start, v != BACKGROUND) {
            (None, true) => run_start = Some(x),
            (Some(start), false) => {
                push_run(&mut blobs, start, x);
                run_start = None;
            }
            _ => {}
        }
    }

    // 行尾仍未闭合的游程以行宽为右边界
    if let Some(start) = run_start {
        push_run(&mut blobs, start, row.len() as u32);
    }

    blobs
}

fn push_run(blobs: &mut Vec<Blob>, start: u32, end: u32) {
    if end - start >= MIN_RUN_WIDTH {
        blobs.push(Blob { start, end });
    }
}

/// Per-row blobs for the whole mask, row order preserved.
pub fn extract_blobs(mask: &GrayImage) -> Vec<Vec<Blob>> {
    let width = mask.width() as usize;
    if width == 0 {
        return vec![Vec::new(); mask.height() as usize];
    }
    mask.as_raw().par_chunks(width).map(find_blobs).collect()
}

pub fn row_candidates(rows: &[Vec<Blob>]) -> Vec<RowCandidates> {
    rows.iter()
        .map(|blobs| blobs.iter().map(Blob::center).collect())
        .collect()
}
