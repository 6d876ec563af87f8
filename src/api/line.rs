//! 巡线识别器

use std::path::{Path, PathBuf};

use image::{GrayImage, RgbaImage};
use log::{error, info};

use crate::core::line::capture::save_capture;
use crate::core::line::overlay::{draw_lanes, draw_line_points};
use crate::core::line::{
    LaneBounds, LineError, LineEstimate, LineExtractorManager, LineStats, LumaPlane,
    PipelineConfig, YuvFrame,
};

/// 线点标记的半宽（源图像素）
const MARKER_HALF_WIDTH: f32 = 2.0;

/// 巡线识别器 - 每个 tick 喂一帧，拿回中心线
///
/// ```no_run
/// use rover_vision::api::line::LineFollower;
///
/// let follower = LineFollower::create()?;
/// let y_plane = vec![0u8; 640 * 480];
/// if let Some(estimate) = follower.process_luma(640, 480, 640, &y_plane) {
///     println!("{} points", estimate.points.len());
/// }
/// # Ok::<(), rover_vision::core::line::LineError>(())
/// ```
pub struct LineFollower {
    manager: LineExtractorManager,
}

impl LineFollower {
    pub fn create() -> Result<Self, LineError> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self, LineError> {
        crate::init_logging();
        info!(
            "🛤️ LineFollower: created ({}x{} grid, threshold {})",
            config.grid.width, config.grid.height, config.binarization_threshold
        );
        Ok(Self {
            manager: LineExtractorManager::with_config(config)?,
        })
    }

    /// 从 JSON5 配置文件创建
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, LineError> {
        let config = PipelineConfig::load(path).map_err(|e| {
            error!("❌ Failed to load config: {}", e);
            e
        })?;
        Self::with_config(config)
    }

    pub fn config(&self) -> &PipelineConfig {
        self.manager.pipeline().config()
    }

    /// `None` when the frame is rejected; the previous estimate stays available
    /// through [`LineFollower::last_estimate`].
    pub fn process_luma(
        &self,
        width: u32,
        height: u32,
        stride: usize,
        y_plane: &[u8],
    ) -> Option<LineEstimate> {
        self.manager
            .process_raw(width, height, stride, y_plane)
            .map_err(|e| error!("❌ Invalid luma buffer: {}", e))
            .ok()
    }

    /// RGBA 相机画面，先转 BT.601 亮度
    pub fn process_rgba(&self, width: u32, height: u32, rgba: &[u8]) -> Option<LineEstimate> {
        self.manager
            .process_plane(LumaPlane::from_rgba(width, height, rgba))
            .map_err(|e| error!("❌ Invalid RGBA buffer: {}", e))
            .ok()
    }

    pub fn process_gray(&self, img: &GrayImage) -> Option<LineEstimate> {
        self.manager
            .process_plane(Ok(LumaPlane::from_gray_image(img)))
            .map_err(|e| error!("❌ Gray image rejected: {}", e))
            .ok()
    }

    pub fn process_yuv(&self, frame: &YuvFrame) -> Option<LineEstimate> {
        self.process_luma(frame.width, frame.height, frame.width as usize, &frame.y_plane)
    }

    pub fn lanes(&self, frame: &YuvFrame) -> Option<LaneBounds> {
        let luma = match frame.luma() {
            Ok(luma) => luma,
            Err(e) => {
                error!("❌ Invalid YUV frame: {}", e);
                return None;
            }
        };
        match self.manager.pipeline().estimate_lanes(&luma) {
            Ok(lanes) => lanes,
            Err(e) => {
                error!("❌ Lane estimation failed: {}", e);
                None
            }
        }
    }

    pub fn last_estimate(&self) -> Option<LineEstimate> {
        self.manager.last_estimate()
    }

    /// 相机画面 + 中心线 + 边界标注
    pub fn annotate(&self, frame: &YuvFrame) -> Result<RgbaImage, LineError> {
        let luma = frame.luma()?;
        let pipeline = self.manager.pipeline();
        let estimate = self.manager.process(&luma)?;
        let lanes = pipeline.estimate_lanes(&luma)?;

        let mut canvas = frame.to_rgba();
        draw_line_points(&mut canvas, &estimate, MARKER_HALF_WIDTH);
        if let Some(lanes) = &lanes {
            draw_lanes(&mut canvas, lanes);
        }
        Ok(canvas)
    }

    pub fn snapshot(&self, frame: &YuvFrame, dir: impl AsRef<Path>) -> Result<PathBuf, LineError> {
        save_capture(&frame.luma()?, dir.as_ref())
    }

    pub fn stats(&self) -> LineStats {
        self.manager.get_stats()
    }

    pub fn reset(&self) {
        self.manager.reset()
    }
}

impl Drop for LineFollower {
    fn drop(&mut self) {
        info!("🗑️ LineFollower: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripe_yuv(width: u32, height: u32, x0: u32, x1: u32) -> YuvFrame {
        let mut y_plane = vec![30u8; (width * height) as usize];
        for y in 0..height {
            for x in x0..x1 {
                y_plane[(y * width + x) as usize] = 220;
            }
        }
        YuvFrame {
            width,
            height,
            y_plane,
            u_plane: vec![128u8; (width * height / 4) as usize],
            v_plane: vec![128u8; (width * height / 4) as usize],
            timestamp_ms: 0,
            frame_number: 1,
        }
    }

    #[test]
    fn test_process_yuv() {
        let follower = LineFollower::create().unwrap();
        let estimate = follower.process_yuv(&stripe_yuv(64, 48, 28, 36)).unwrap();

        assert_eq!(estimate.points.len(), 16);
        for (x, _) in estimate.to_source() {
            assert!((x - 32.0).abs() <= 1.0);
        }
        assert_eq!(follower.stats().processed_frames, 1);
    }

    #[test]
    fn test_bad_buffer_returns_none() {
        let follower = LineFollower::create().unwrap();
        assert!(follower.process_luma(64, 64, 64, &[0u8; 100]).is_none());
        assert!(follower.process_luma(0, 0, 0, &[]).is_none());
        assert!(follower.last_estimate().is_none());

        let stats = follower.stats();
        assert_eq!(stats.processed_frames, 2);
        assert_eq!(stats.failed_frames, 2);
    }

    #[test]
    fn test_process_rgba() {
        let (width, height) = (64u32, 48u32);
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..height {
            for x in 0..width {
                // 白色胶带，深灰地面
                let px = if (28..36).contains(&x) { [240, 240, 240, 255] } else { [40, 40, 40, 255] };
                rgba.extend_from_slice(&px);
            }
        }

        let follower = LineFollower::create().unwrap();
        let estimate = follower.process_rgba(width, height, &rgba).unwrap();
        assert_eq!(estimate.points.len(), 16);
        for (x, _) in estimate.to_source() {
            assert!((x - 32.0).abs() <= 1.0);
        }

        assert!(follower.process_rgba(width, height, &rgba[..64]).is_none());
        assert_eq!(follower.stats().failed_frames, 1);
        assert_eq!(follower.last_estimate(), Some(estimate));
    }

    #[test]
    fn test_process_gray() {
        let img = GrayImage::from_fn(32, 32, |x, _| {
            image::Luma([if (14..18).contains(&x) { 255 } else { 0 }])
        });

        let follower = LineFollower::create().unwrap();
        let estimate = follower.process_gray(&img).unwrap();
        assert_eq!(estimate.points.len(), 16);
        for (x, _) in estimate.to_source() {
            assert!((x - 16.0).abs() <= 1.0);
        }

        assert!(follower.process_gray(&GrayImage::new(0, 0)).is_none());
        assert_eq!(follower.stats().failed_frames, 1);
    }

    #[test]
    fn test_lanes_rejects_bad_yuv() {
        let follower = LineFollower::create().unwrap();
        let mut frame = stripe_yuv(32, 32, 10, 14);
        frame.y_plane.truncate(10);
        assert!(follower.lanes(&frame).is_none());
    }

    #[test]
    fn test_annotate_marks_the_line() {
        let follower = LineFollower::create().unwrap();
        let frame = stripe_yuv(64, 48, 28, 36);
        let canvas = follower.annotate(&frame).unwrap();

        assert_eq!(canvas.dimensions(), (64, 48));
        let marked = canvas.get_pixel(32, 10).0;
        let plain = canvas.get_pixel(5, 10).0;
        assert!(marked[0] > marked[1]);
        assert_eq!(plain[0], plain[1]);
    }

    #[test]
    fn test_from_config_file() {
        let path = std::env::temp_dir().join(format!("rover_cfg_{}.json5", std::process::id()));
        std::fs::write(&path, "{ grid: { width: 8, height: 8 }, polarity: 'dark' }").unwrap();

        let follower = LineFollower::from_config_file(&path).unwrap();
        assert_eq!(follower.config().grid.width, 8);

        let _ = std::fs::remove_file(&path);
        assert!(LineFollower::from_config_file(&path).is_err());
    }

    #[test]
    fn test_reset_clears_state() {
        let follower = LineFollower::create().unwrap();
        follower.process_yuv(&stripe_yuv(32, 32, 10, 14));
        assert!(follower.last_estimate().is_some());

        follower.reset();
        assert!(follower.last_estimate().is_none());
        assert_eq!(follower.stats(), LineStats::default());
    }
}
