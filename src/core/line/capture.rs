use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::ImageFormat;
use log::info;

use super::error::LineError;
use super::frame::Frame;

/// 保存当前帧为 PNG，文件名 `capture-<unix毫秒>.png`
pub fn save_capture(frame: &Frame<'_>, dir: &Path) -> Result<PathBuf, LineError> {
    if frame.is_empty() {
        return Err(LineError::InvalidFrame(format!(
            "cannot capture {}x{} frame",
            frame.width(),
            frame.height()
        )));
    }

    fs::create_dir_all(dir)?;

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let path = dir.join(format!("capture-{}.png", millis));

    frame
        .to_gray_image()?
        .save_with_format(&path, ImageFormat::Png)?;

    info!("📸 Saved capture: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_round_trip() {
        let dir = std::env::temp_dir().join(format!("rover_capture_{}", std::process::id()));
        let data: Vec<u8> = (0..48).map(|v| (v * 5) as u8).collect();
        let frame = Frame::packed(8, 6, &data).unwrap();

        let path = save_capture(&frame, &dir).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("capture-"));

        let loaded = image::open(&path).unwrap().into_luma8();
        assert_eq!(loaded.dimensions(), (8, 6));
        assert_eq!(loaded.as_raw(), &data);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_capture_rejects_empty_frame() {
        let frame = Frame::packed(0, 4, &[]).unwrap();
        assert!(matches!(
            save_capture(&frame, &std::env::temp_dir()),
            Err(LineError::InvalidFrame(_))
        ));
    }
}
