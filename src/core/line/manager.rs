//! 线跟踪管理器

use std::sync::Mutex;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::Serialize;

use super::error::LineError;
use super::frame::{Frame, LumaPlane};
use super::pipeline::{LineEstimate, LinePipeline, PipelineConfig};

/// 跟踪统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    pub processed_frames: u64,
    pub failed_frames: u64,
    /// Frames that ran fine but found no line.
    pub empty_frames: u64,
}

/// 录制下来的亮度帧
#[derive(Debug, Clone)]
pub struct LumaFrameData {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub y_plane: Vec<u8>,
    pub timestamp_ms: u64,
    pub frame_number: u64,
}

#[derive(Debug, Clone)]
pub struct FrameLineResult {
    pub timestamp_ms: u64,
    pub frame_number: u64,
    /// `None` when the frame was rejected.
    pub estimate: Option<LineEstimate>,
}

pub struct LineExtractorManager {
    pipeline: LinePipeline,
    stats: Mutex<LineStats>,
    last_estimate: Mutex<Option<LineEstimate>>,
    pool: ThreadPool,
}

impl LineExtractorManager {
    pub fn new() -> Result<Self, LineError> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self, LineError> {
        let num_threads = num_cpus::get().min(4);
        debug!("Using {} threads for batch extraction", num_threads);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        Ok(Self {
            pipeline: LinePipeline::with_config(config)?,
            stats: Mutex::new(LineStats::default()),
            last_estimate: Mutex::new(None),
            pool,
        })
    }

    pub fn pipeline(&self) -> &LinePipeline {
        &self.pipeline
    }

    /// 单帧处理（每个 tick 调用一次）
    ///
    /// A successful result replaces the last estimate; a failed frame leaves it
    /// in place so the caller can keep showing it.
    pub fn process(&self, frame: &Frame<'_>) -> Result<LineEstimate, LineError> {
        self.commit(self.pipeline.process(frame))
    }

    /// 直接处理调用方的原始亮度缓冲区，缓冲区不合法也计入失败帧
    pub fn process_raw(
        &self,
        width: u32,
        height: u32,
        stride: usize,
        data: &[u8],
    ) -> Result<LineEstimate, LineError> {
        let result =
            Frame::new(width, height, stride, data).and_then(|frame| self.pipeline.process(&frame));
        self.commit(result)
    }

    /// 处理采集层转换出来的亮度平面，转换失败同样计入失败帧
    pub fn process_plane(
        &self,
        plane: Result<LumaPlane, LineError>,
    ) -> Result<LineEstimate, LineError> {
        let result = plane.and_then(|plane| {
            let frame = plane.as_frame()?;
            self.pipeline.process(&frame)
        });
        self.commit(result)
    }

    fn commit(&self, result: Result<LineEstimate, LineError>) -> Result<LineEstimate, LineError> {
        self.record(&result);

        if let Ok(estimate) = &result {
            if let Ok(mut last) = self.last_estimate.lock() {
                *last = Some(estimate.clone());
            }
        }
        result
    }

    pub fn last_estimate(&self) -> Option<LineEstimate> {
        self.last_estimate
            .lock()
            .ok()
            .and_then(|last| last.clone())
    }

    /// 批量处理录制帧，结果按输入顺序返回
    pub fn process_batch(&self, frames: Vec<LumaFrameData>) -> Vec<FrameLineResult> {
        let results: Vec<(FrameLineResult, Result<(), LineError>)> = self.pool.install(|| {
            frames
                .par_iter()
                .map(|f| {
                    let outcome = Frame::new(f.width, f.height, f.stride, &f.y_plane)
                        .and_then(|frame| self.pipeline.process(&frame));
                    match outcome {
                        Ok(estimate) => (
                            FrameLineResult {
                                timestamp_ms: f.timestamp_ms,
                                frame_number: f.frame_number,
                                estimate: Some(estimate),
                            },
                            Ok(()),
                        ),
                        Err(e) => (
                            FrameLineResult {
                                timestamp_ms: f.timestamp_ms,
                                frame_number: f.frame_number,
                                estimate: None,
                            },
                            Err(e),
                        ),
                    }
                })
                .collect()
        });

        results
            .into_iter()
            .map(|(result, outcome)| {
                if let Err(e) = &outcome {
                    warn!("⚠️ Frame {} rejected: {}", result.frame_number, e);
                }
                self.record_outcome(outcome.is_ok(), result.estimate.as_ref());
                result
            })
            .collect()
    }

    fn record(&self, result: &Result<LineEstimate, LineError>) {
        match result {
            Ok(estimate) => self.record_outcome(true, Some(estimate)),
            Err(e) => {
                warn!("⚠️ Frame rejected: {}", e);
                self.record_outcome(false, None);
            }
        }
    }

    fn record_outcome(&self, ok: bool, estimate: Option<&LineEstimate>) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.processed_frames += 1;
            if !ok {
                stats.failed_frames += 1;
            } else if estimate.map_or(true, LineEstimate::is_empty) {
                stats.empty_frames += 1;
            }
        }
    }

    pub fn get_stats(&self) -> LineStats {
        self.stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default()
    }

    pub fn reset(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            *stats = LineStats::default();
        }
        if let Ok(mut last) = self.last_estimate.lock() {
            *last = None;
        }
    }
}
