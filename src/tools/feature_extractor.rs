//! 影像品質特徵
//!
//! 全部為純函式，輸入為 8-bit RGB 影像，輸出正規化到 [0, 1]。

use image::RgbImage;
use image::imageops::{self, FilterType};

const MAX_CHANNEL_VALUE: f64 = 255.0;

/// 邊緣能量：每個像素（略過第 0 列與第 0 欄）與左方、上方鄰點的
/// 逐通道絕對差平均
#[must_use]
pub fn sharpness(image: &RgbImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 2 || height < 2 {
        return 0.0;
    }

    let mut total = 0u64;
    for y in 1..height {
        for x in 1..width {
            let current = image.get_pixel(x, y).0;
            let left = image.get_pixel(x - 1, y).0;
            let top = image.get_pixel(x, y - 1).0;
            for c in 0..3 {
                total += u64::from(current[c].abs_diff(left[c]));
                total += u64::from(current[c].abs_diff(top[c]));
            }
        }
    }

    let samples = u64::from(width - 1) * u64::from(height - 1) * 3 * 2;
    total as f64 / samples as f64 / MAX_CHANNEL_VALUE
}

/// 每個像素三通道平均後的整體平均亮度
#[must_use]
pub fn brightness(image: &RgbImage) -> f64 {
    let pixel_count = pixel_count(image);
    if pixel_count == 0 {
        return 0.0;
    }

    let sum: f64 = image.pixels().map(|p| pixel_brightness(p.0)).sum();
    sum / pixel_count as f64
}

/// 像素亮度相對於平均亮度的標準差
#[must_use]
pub fn contrast(image: &RgbImage) -> f64 {
    let pixel_count = pixel_count(image);
    if pixel_count == 0 {
        return 0.0;
    }

    let mean = brightness(image);
    let variance: f64 = image
        .pixels()
        .map(|p| {
            let diff = pixel_brightness(p.0) - mean;
            diff * diff
        })
        .sum::<f64>()
        / pixel_count as f64;

    variance.sqrt()
}

/// 同位置像素的逐通道平均絕對差；尺寸不同時回傳 0
#[must_use]
pub fn motion(current: &RgbImage, previous: &RgbImage) -> f64 {
    if current.dimensions() != previous.dimensions() {
        return 0.0;
    }
    let pixel_count = pixel_count(current);
    if pixel_count == 0 {
        return 0.0;
    }

    let total: u64 = current
        .pixels()
        .zip(previous.pixels())
        .map(|(a, b)| {
            a.0.iter()
                .zip(b.0.iter())
                .map(|(x, y)| u64::from(x.abs_diff(*y)))
                .sum::<u64>()
        })
        .sum();

    total as f64 / (pixel_count * 3) as f64 / MAX_CHANNEL_VALUE
}

/// 等比例縮小到指定寬度；原圖不比目標寬時直接複製
#[must_use]
pub fn downscale(image: &RgbImage, analysis_width: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if analysis_width == 0 || width <= analysis_width || height == 0 {
        return image.clone();
    }

    let scaled_height = ((u64::from(height) * u64::from(analysis_width)) / u64::from(width)).max(1);
    let scaled_height = u32::try_from(scaled_height).unwrap_or(u32::MAX);
    imageops::resize(image, analysis_width, scaled_height, FilterType::Triangle)
}

fn pixel_brightness(rgb: [u8; 3]) -> f64 {
    let sum = u32::from(rgb[0]) + u32::from(rgb[1]) + u32::from(rgb[2]);
    f64::from(sum) / 3.0 / MAX_CHANNEL_VALUE
}

fn pixel_count(image: &RgbImage) -> u64 {
    u64::from(image.width()) * u64::from(image.height())
}
