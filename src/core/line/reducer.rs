use image::imageops::{self, FilterType};
use image::GrayImage;
use log::debug;
use serde::{Deserialize, Serialize};

use super::error::LineError;
use super::frame::Frame;

/// 工作网格尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::square(16)
    }
}

/// Source pixels per grid cell, per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    pub x: f32,
    pub y: f32,
}

impl ScaleFactors {
    pub const IDENTITY: ScaleFactors = ScaleFactors { x: 1.0, y: 1.0 };

    pub fn between(source_width: u32, source_height: u32, grid: GridSize) -> Self {
        Self {
            x: source_width as f32 / grid.width as f32,
            y: source_height as f32 / grid.height as f32,
        }
    }

    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.x, y * self.y)
    }
}

#[derive(Debug, Clone)]
pub struct ReducedFrame {
    pub grid: GrayImage,
    pub scale: ScaleFactors,
}

/// 线性插值降采样到固定工作网格
pub fn reduce(frame: &Frame<'_>, target: GridSize) -> Result<ReducedFrame, LineError> {
    if frame.is_empty() {
        return Err(LineError::InvalidFrame(format!(
            "zero-area frame {}x{}",
            frame.width(),
            frame.height()
        )));
    }
    if target.is_empty() {
        return Err(LineError::InvalidConfig(format!(
            "zero-area target grid {}x{}",
            target.width, target.height
        )));
    }

    let scale = ScaleFactors::between(frame.width(), frame.height(), target);
    let source = frame.to_gray_image()?;

    let grid = if source.dimensions() == (target.width, target.height) {
        source
    } else {
        imageops::resize(&source, target.width, target.height, FilterType::Triangle)
    };

    debug!(
        "Reduced {}x{} -> {}x{} (scale {:.2}, {:.2})",
        frame.width(),
        frame.height(),
        target.width,
        target.height,
        scale.x,
        scale.y
    );

    Ok(ReducedFrame { grid, scale })
}
