use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::line::blobs::{extract_blobs, row_candidates};
use crate::core::line::error::LineError;
use crate::core::line::frame::Frame;
use crate::core::line::gradient::column_delta;
use crate::core::line::lanes::{estimate_lanes, LaneBounds};
use crate::core::line::normalize::normalize_rows;
use crate::core::line::reducer::{reduce, GridSize, ReducedFrame, ScaleFactors};
use crate::core::line::threshold::{Binarizer, Polarity, DEFAULT_THRESHOLD};
use crate::core::line::tracker::{LinePoint, LineTracker, SeedPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grid: GridSize,
    pub binarization_threshold: u8,
    pub polarity: Polarity,
    pub seed_policy: SeedPolicy,
    /// 保留帧顶部的比例，(0, 1]
    pub roi_height_ratio: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            binarization_threshold: DEFAULT_THRESHOLD,
            polarity: Polarity::Bright,
            seed_policy: SeedPolicy::FirstNonEmpty,
            roi_height_ratio: 1.0,
        }
    }
}

impl PipelineConfig {
    /// 白色地面上的黑色胶带
    pub fn for_dark_line() -> Self {
        Self {
            polarity: Polarity::Dark,
            ..Default::default()
        }
    }

    pub fn for_bright_line() -> Self {
        Self {
            polarity: Polarity::Bright,
            ..Default::default()
        }
    }

    pub fn for_fine_grid() -> Self {
        Self {
            grid: GridSize::square(32),
            ..Default::default()
        }
    }

    pub fn from_json5(text: &str) -> Result<Self, LineError> {
        let config: PipelineConfig =
            json5::from_str(text).map_err(|e| LineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LineError> {
        let path = path.as_ref();
        info!("📖 Loading pipeline config: {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_json5(&text)
    }

    pub fn validate(&self) -> Result<(), LineError> {
        if self.grid.is_empty() {
            return Err(LineError::InvalidConfig(format!(
                "grid must be non-empty, got {}x{}",
                self.grid.width, self.grid.height
            )));
        }
        if !(self.roi_height_ratio > 0.0 && self.roi_height_ratio <= 1.0) {
            return Err(LineError::InvalidConfig(format!(
                "roi_height_ratio must be in (0, 1], got {}",
                self.roi_height_ratio
            )));
        }
        Ok(())
    }
}

/// Sparse centerline for one frame, in working-grid coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineEstimate {
    pub points: Vec<LinePoint>,
    pub scale: ScaleFactors,
    pub grid: GridSize,
}

impl LineEstimate {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_source(&self) -> Vec<(f32, f32)> {
        self.points
            .iter()
            .map(|p| self.scale.to_source(p.x, p.y as f32))
            .collect()
    }

    pub fn to_json(&self) -> Result<String, LineError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 逐行线提取流水线：降采样 -> 行归一化 -> 二值化 -> 游程 -> 跟踪
pub struct LinePipeline {
    config: PipelineConfig,
    binarizer: Binarizer,
    edge_binarizer: Binarizer,
}

impl LinePipeline {
    pub fn new() -> Self {
        Self::build(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self, LineError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PipelineConfig) -> Self {
        Self {
            binarizer: Binarizer::new(config.binarization_threshold, config.polarity),
            // 差分图里边缘总是亮的
            edge_binarizer: Binarizer::new(config.binarization_threshold, Polarity::Bright),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process(&self, frame: &Frame<'_>) -> Result<LineEstimate, LineError> {
        let ReducedFrame { mut grid, scale } = self.reduce(frame)?;

        normalize_rows(&mut grid);
        self.binarizer.apply_in_place(&mut grid);

        let candidates = row_candidates(&extract_blobs(&grid));
        let points = LineTracker::with_policy(self.config.seed_policy).track(&candidates);

        debug!(
            "Tracked {} points over {} rows",
            points.len(),
            candidates.len()
        );

        Ok(LineEstimate {
            points,
            scale,
            grid: self.config.grid,
        })
    }

    /// 差分变体：用列差分找到胶带左右两条边
    pub fn estimate_lanes(&self, frame: &Frame<'_>) -> Result<Option<LaneBounds>, LineError> {
        let ReducedFrame { grid, scale } = self.reduce(frame)?;

        let mut delta = column_delta(&grid);
        normalize_rows(&mut delta);
        self.edge_binarizer.apply_in_place(&mut delta);

        let lanes = estimate_lanes(&extract_blobs(&delta), scale);
        if let Some(l) = &lanes {
            debug!(
                "Lane edges from {} rows: left {:.1}-{:.1}, right {:.1}-{:.1}",
                l.rows, l.left.start, l.left.end, l.right.start, l.right.end
            );
        }
        Ok(lanes)
    }

    fn reduce(&self, frame: &Frame<'_>) -> Result<ReducedFrame, LineError> {
        let roi = frame.crop_top(self.config.roi_height_ratio);
        reduce(&roi, self.config.grid)
    }
}

impl Default for LinePipeline {
    fn default() -> Self {
        Self::new()
    }
}
