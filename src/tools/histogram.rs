use crate::error::{Result, ThumbnailError};
use image::RgbImage;

const CHANNELS: usize = 3;

/// 計算正規化的 RGB 直方圖
///
/// 輸出長度為 `3 * bins`，排列為 R 的所有區間、G 的所有區間、B 的所有區間。
/// 每個值為該區間像素數除以總像素數。空影像回傳全零向量。
#[must_use]
pub fn compute_histogram(image: &RgbImage, bins: usize) -> Vec<f64> {
    let mut histogram = vec![0.0; CHANNELS * bins];
    let pixel_count = u64::from(image.width()) * u64::from(image.height());
    if bins == 0 || pixel_count == 0 {
        return histogram;
    }

    let mut counts = vec![0u64; CHANNELS * bins];
    for pixel in image.pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            let bin = (usize::from(value) * bins / 256).min(bins - 1);
            counts[channel * bins + bin] += 1;
        }
    }

    let total = pixel_count as f64;
    for (slot, count) in histogram.iter_mut().zip(counts) {
        *slot = count as f64 / total;
    }
    histogram
}

/// 兩個直方圖的 L1 距離
pub fn histogram_distance(left: &[f64], right: &[f64]) -> Result<f64> {
    if left.len() != right.len() {
        return Err(ThumbnailError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    Ok(left.iter().zip(right).map(|(a, b)| (a - b).abs()).sum())
}
