//! 影格來源
//!
//! 任何產生 `SourceItem` 的迭代器都可以當作影格來源。這裡提供兩種實作：
//! 讀取已拆好的影像資料夾，以及用 ffmpeg 依時間點擷取。
//! 無法解碼的時間點以 `ThumbnailError::SourceFrame` 回報，成功影格的索引保持連續。

use crate::error::ThumbnailError;
use crate::tools::VideoMetadata;
use anyhow::{Context, Result};
use image::RgbImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::vec;
use tempfile::TempDir;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "ppm", "tif", "tiff", "webp"];

/// 兩段式 seek 的前置緩衝時間（毫秒）
const SEEK_MARGIN_MS: u64 = 2_000;

/// 來源產生的原始影格（尚未計算直方圖）
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub index: usize,
    pub timestamp_ms: u64,
    pub image: RgbImage,
}

/// 影格來源的單一輸出：成功的影格或被略過的時間點
pub type SourceItem = crate::error::Result<SourceFrame>;

/// 讀取資料夾內依檔名排序的影像
pub struct ImageSequenceSource {
    paths: vec::IntoIter<PathBuf>,
    interval_ms: u64,
    position: u64,
    next_index: usize,
}

impl ImageSequenceSource {
    pub fn scan(directory: &Path, interval_ms: u64) -> Result<Self> {
        if !directory.is_dir() {
            anyhow::bail!("資料夾不存在: {}", directory.display());
        }

        let mut paths: Vec<PathBuf> = WalkDir::new(directory)
            .follow_links(false)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_image_file(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();
        paths.sort();

        debug!("找到 {} 張影像: {}", paths.len(), directory.display());

        Ok(Self {
            paths: paths.into_iter(),
            interval_ms,
            position: 0,
            next_index: 0,
        })
    }
}

impl Iterator for ImageSequenceSource {
    type Item = SourceItem;

    fn next(&mut self) -> Option<SourceItem> {
        let path = self.paths.next()?;
        let timestamp_ms = self.position * self.interval_ms;
        self.position += 1;

        match image::open(&path) {
            Ok(image) => {
                let frame = SourceFrame {
                    index: self.next_index,
                    timestamp_ms,
                    image: image.to_rgb8(),
                };
                self.next_index += 1;
                Some(Ok(frame))
            }
            Err(e) => {
                warn!("無法解碼影像，略過 {}: {e}", path.display());
                Some(Err(ThumbnailError::SourceFrame {
                    timestamp_ms,
                    reason: format!("{}: {e}", path.display()),
                }))
            }
        }
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// 使用 ffmpeg 依固定間隔擷取影格
pub struct FfmpegFrameSource {
    video_path: PathBuf,
    timestamps: vec::IntoIter<u64>,
    temp_dir: TempDir,
    max_width: u32,
    next_index: usize,
    shutdown_signal: Arc<AtomicBool>,
}

impl FfmpegFrameSource {
    pub fn new(
        video_path: &Path,
        metadata: &VideoMetadata,
        interval_ms: u64,
        max_width: u32,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix(".tmp_frames_")
            .tempdir()
            .context("無法建立暫存目錄")?;
        let timestamps = sample_timestamps(metadata.duration_ms, interval_ms);

        debug!(
            "準備擷取 {} 個影格: {} (間隔 {interval_ms}ms)",
            timestamps.len(),
            video_path.display()
        );

        Ok(Self {
            video_path: video_path.to_path_buf(),
            timestamps: timestamps.into_iter(),
            temp_dir,
            max_width,
            next_index: 0,
            shutdown_signal,
        })
    }

    fn extract(&self, timestamp_ms: u64, output_path: &Path) -> Result<RgbImage> {
        // 兩段式 seek：-i 前快速跳到關鍵幀，-i 後精準解碼
        let t0 = timestamp_ms.saturating_sub(SEEK_MARGIN_MS);
        let delta = timestamp_ms - t0;

        let mut command = Command::new("ffmpeg");
        command.args(["-hide_banner", "-loglevel", "error"]);
        if t0 > 0 {
            command.args(["-ss", &format_seconds(t0)]);
        }
        command.arg("-i").arg(&self.video_path);
        if delta > 0 {
            command.args(["-ss", &format_seconds(delta)]);
        }
        command
            .args(["-vf", &scale_filter(self.max_width)])
            .args(["-frames:v", "1", "-an", "-sn", "-dn", "-threads", "1", "-y"])
            .arg(output_path);

        let output = command
            .output()
            .with_context(|| format!("無法執行 ffmpeg 擷取影格: {}", self.video_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg 擷取影格失敗: {}", stderr.trim());
        }

        let image = image::open(output_path)
            .with_context(|| format!("無法解碼影格: {}", output_path.display()))?
            .to_rgb8();

        if let Err(e) = std::fs::remove_file(output_path) {
            debug!("無法刪除暫存影格 {}: {e}", output_path.display());
        }

        Ok(image)
    }
}

impl Iterator for FfmpegFrameSource {
    type Item = SourceItem;

    fn next(&mut self) -> Option<SourceItem> {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            warn!("收到中斷信號，停止擷取影格");
            return None;
        }

        let timestamp_ms = self.timestamps.next()?;
        let output_path = self
            .temp_dir
            .path()
            .join(format!("frame_{timestamp_ms:09}.png"));

        match self.extract(timestamp_ms, &output_path) {
            Ok(image) => {
                let frame = SourceFrame {
                    index: self.next_index,
                    timestamp_ms,
                    image,
                };
                self.next_index += 1;
                Some(Ok(frame))
            }
            Err(e) => {
                warn!("略過時間點 {}: {e:#}", format_seconds(timestamp_ms));
                Some(Err(ThumbnailError::SourceFrame {
                    timestamp_ms,
                    reason: format!("{e:#}"),
                }))
            }
        }
    }
}

/// 只縮小不放大，高度維持比例並取偶數
fn scale_filter(max_width: u32) -> String {
    format!("scale='min({max_width},iw)':-2")
}

/// 0, interval, 2*interval, ... 且小於影片長度
fn sample_timestamps(duration_ms: u64, interval_ms: u64) -> Vec<u64> {
    if interval_ms == 0 {
        return Vec::new();
    }
    (0..duration_ms).step_by(usize::try_from(interval_ms).unwrap_or(usize::MAX)).collect()
}

fn format_seconds(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}
