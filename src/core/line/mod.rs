//! 逐行线提取 - 从巡线小车的相机帧中估计地面轨迹中心线
//!
//! 处理流程（每帧一次，自上而下）：
//! 1. 降采样 - 线性插值缩到固定工作网格
//! 2. 行归一化 - 每行用自身 min/max 拉伸对比度
//! 3. 二值化 - 固定阈值
//! 4. 游程提取 - 每行宽度 >= 2 的前景游程中心
//! 5. 连续性跟踪 - 按预测位置选最近候选，空行跳过

pub mod blobs;
pub mod capture;
pub mod error;
pub mod frame;
pub mod gradient;
pub mod lanes;
pub mod manager;
pub mod normalize;
pub mod overlay;
pub mod pipeline;
pub mod reducer;
pub mod threshold;
pub mod tracker;

pub use blobs::{Blob, RowCandidates, MIN_RUN_WIDTH};
pub use error::LineError;
pub use frame::{Frame, LumaPlane, YuvFrame};
pub use lanes::{EdgeSpan, LaneBounds};
pub use manager::{FrameLineResult, LineExtractorManager, LineStats, LumaFrameData};
pub use normalize::RowStats;
pub use pipeline::{LineEstimate, LinePipeline, PipelineConfig};
pub use reducer::{GridSize, ScaleFactors};
pub use threshold::{Binarizer, Polarity};
pub use tracker::{LinePoint, LineTracker, SeedPolicy, TrackState};
