use image::{GrayImage, Rgba, RgbaImage};

use super::error::LineError;

/// 单通道亮度帧（借用视图，行跨距 >= 宽度）
///
/// 只在一次流水线调用期间借用调用方的缓冲区。
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    stride: usize,
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(width: u32, height: u32, stride: usize, data: &'a [u8]) -> Result<Self, LineError> {
        let w = width as usize;
        if stride < w {
            return Err(LineError::InvalidFrame(format!(
                "stride {} is smaller than width {}",
                stride, width
            )));
        }

        // 最后一行只需要 width 个字节
        let required = match height {
            0 => 0,
            h => (h as usize - 1)
                .checked_mul(stride)
                .and_then(|n| n.checked_add(w))
                .ok_or_else(|| LineError::InvalidFrame("frame size overflow".into()))?,
        };

        if data.len() < required {
            return Err(LineError::InvalidFrame(format!(
                "buffer too short: expected at least {} bytes, got {}",
                required,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// 无填充的紧凑帧（stride == width）
    pub fn packed(width: u32, height: u32, data: &'a [u8]) -> Result<Self, LineError> {
        Self::new(width, height, width as usize, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn row(&self, y: u32) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        self.data.get(start..start + self.width as usize)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.height).filter_map(move |y| self.row(y))
    }

    /// 只保留顶部 `ratio` 比例的行，原点不变
    ///
    /// 裁剪后的行数向下取偶；`ratio >= 1` 时整帧保留。
    pub fn crop_top(&self, ratio: f32) -> Frame<'a> {
        if ratio >= 1.0 {
            return *self;
        }
        let kept = (self.height as f32 * ratio.max(0.0)) as u32;
        Frame {
            height: (kept - kept % 2).min(self.height),
            ..*self
        }
    }

    pub fn to_gray_image(&self) -> Result<GrayImage, LineError> {
        let mut packed = Vec::with_capacity(self.width as usize * self.height as usize);
        for row in self.rows() {
            packed.extend_from_slice(row);
        }

        GrayImage::from_raw(self.width, self.height, packed).ok_or_else(|| {
            LineError::InvalidFrame(format!(
                "cannot pack {}x{} luma plane",
                self.width, self.height
            ))
        })
    }
}

/// 自有的亮度平面，由各种采集格式转换而来
#[derive(Debug, Clone)]
pub struct LumaPlane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl LumaPlane {
    /// BT.601 integer luma, alpha ignored
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self, LineError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(LineError::InvalidFrame(format!(
                "RGBA buffer size mismatch: expected {}, got {}",
                expected,
                rgba.len()
            )));
        }

        let data = rgba
            .chunks_exact(4)
            .map(|px| {
                let r = px[0] as u32;
                let g = px[1] as u32;
                let b = px[2] as u32;
                ((r * 299 + g * 587 + b * 114) / 1000) as u8
            })
            .collect();

        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_gray_image(img: &GrayImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }

    pub fn as_frame(&self) -> Result<Frame<'_>, LineError> {
        Frame::packed(self.width, self.height, &self.data)
    }
}

/// 从相机传输层拿到的 YUV 4:2:0 原始帧
#[derive(Debug, Clone)]
pub struct YuvFrame {
    pub width: u32,
    pub height: u32,
    pub y_plane: Vec<u8>,
    pub u_plane: Vec<u8>,
    pub v_plane: Vec<u8>,
    pub timestamp_ms: u64,
    pub frame_number: u64,
}

impl YuvFrame {
    /// Y 平面本身就是灰度，直接作为流水线输入
    pub fn luma(&self) -> Result<Frame<'_>, LineError> {
        Frame::packed(self.width, self.height, &self.y_plane)
    }

    pub fn to_rgba(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        let chroma_width = (self.width as usize).div_ceil(2);

        for (x, y, pixel) in canvas.enumerate_pixels_mut() {
            let y_idx = y as usize * self.width as usize + x as usize;
            let uv_idx = (y as usize / 2) * chroma_width + x as usize / 2;

            let y_val = self.y_plane.get(y_idx).copied().unwrap_or(0) as f32;
            let u_val = self.u_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;
            let v_val = self.v_plane.get(uv_idx).copied().unwrap_or(128) as f32 - 128.0;

            let r = (y_val + 1.402 * v_val).clamp(0.0, 255.0) as u8;
            let g = (y_val - 0.344136 * u_val - 0.714136 * v_val).clamp(0.0, 255.0) as u8;
            let b = (y_val + 1.772 * u_val).clamp(0.0, 255.0) as u8;

            *pixel = Rgba([r, g, b, 255]);
        }

        canvas
    }
}
