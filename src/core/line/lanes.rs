use serde::Serialize;

use super::blobs::Blob;
use super::reducer::ScaleFactors;

/// Averaged column span of one edge, in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeSpan {
    pub start: f32,
    pub end: f32,
}

impl EdgeSpan {
    pub fn center(&self) -> f32 {
        (self.start + self.end) / 2.0
    }

    fn scaled(&self, sx: f32) -> EdgeSpan {
        EdgeSpan {
            start: self.start * sx,
            end: self.end * sx,
        }
    }
}

/// 左右两条边界的平均位置（只统计恰好两个游程的行）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneBounds {
    pub left: EdgeSpan,
    pub right: EdgeSpan,
    /// Number of rows that contributed.
    pub rows: usize,
    pub scale: ScaleFactors,
}

impl LaneBounds {
    /// Column spans mapped back to source-frame pixels.
    pub fn to_source(&self) -> (EdgeSpan, EdgeSpan) {
        (self.left.scaled(self.scale.x), self.right.scaled(self.scale.x))
    }

    pub fn midline(&self) -> f32 {
        (self.left.center() + self.right.center()) / 2.0
    }
}

#[derive(Default)]
struct SpanSum {
    start: u64,
    end: u64,
}

impl SpanSum {
    fn add(&mut self, blob: &Blob) {
        self.start += blob.start as u64;
        self.end += blob.end as u64;
    }

    fn mean(&self, n: usize) -> EdgeSpan {
        EdgeSpan {
            start: self.start as f32 / n as f32,
            end: self.end as f32 / n as f32,
        }
    }
}

/// Rows with any other blob count are ignored. `None` when no row qualifies.
pub fn estimate_lanes(rows: &[Vec<Blob>], scale: ScaleFactors) -> Option<LaneBounds> {
    let mut left = SpanSum::default();
    let mut right = SpanSum::default();
    let mut n = 0usize;

    for blobs in rows {
        if let [l, r] = blobs.as_slice() {
            left.add(l);
            right.add(r);
            n += 1;
        }
    }

    if n == 0 {
        return None;
    }

    Some(LaneBounds {
        left: left.mean(n),
        right: right.mean(n),
        rows: n,
        scale,
    })
}
