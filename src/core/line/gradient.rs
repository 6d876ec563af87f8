use image::GrayImage;
use rayon::prelude::*;

/// 水平方向相邻列差分 `|v[x+1] - v[x]|`，最后一列为 0
///
/// 胶带的左右边缘在差分图里各成一个亮带，供车道边界估计使用。
pub fn column_delta(grid: &GrayImage) -> GrayImage {
    let width = grid.width() as usize;
    let mut out = GrayImage::new(grid.width(), grid.height());
    if width == 0 {
        return out;
    }

    let src_rows = grid.as_raw().par_chunks(width);
    let dst: &mut [u8] = &mut out;
    dst.par_chunks_mut(width)
        .zip(src_rows)
        .for_each(|(dst_row, src_row)| {
            for (d, pair) in dst_row.iter_mut().zip(src_row.windows(2)) {
                *d = pair[0].abs_diff(pair[1]);
            }
        });

    out
}
