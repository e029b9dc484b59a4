use crate::error::{Result, ThumbnailError};
use crate::tools::compute_histogram;
use image::RgbImage;
use std::sync::Arc;

/// 取樣後的影格，建立後不再修改，以 `Arc` 在各階段間共享
#[derive(Debug)]
pub struct Frame {
    pub index: usize,
    pub timestamp_ms: u64,
    pub image: RgbImage,
    pub histogram: Vec<f64>,
}

impl Frame {
    #[must_use]
    pub fn new(index: usize, timestamp_ms: u64, image: RgbImage, bins: usize) -> Self {
        let histogram = compute_histogram(&image, bins);
        Self::with_histogram(index, timestamp_ms, image, histogram)
    }

    #[must_use]
    pub const fn with_histogram(
        index: usize,
        timestamp_ms: u64,
        image: RgbImage,
        histogram: Vec<f64>,
    ) -> Self {
        Self {
            index,
            timestamp_ms,
            image,
            histogram,
        }
    }
}

/// 連續且非空的影格片段
#[derive(Debug, Clone)]
pub struct Scene {
    scene_index: usize,
    frames: Vec<Arc<Frame>>,
}

impl Scene {
    pub fn new(scene_index: usize, frames: Vec<Arc<Frame>>) -> Result<Self> {
        if frames.is_empty() {
            return Err(ThumbnailError::EmptyScene { scene_index });
        }
        Ok(Self {
            scene_index,
            frames,
        })
    }

    #[must_use]
    pub const fn scene_index(&self) -> usize {
        self.scene_index
    }

    #[must_use]
    pub fn frames(&self) -> &[Arc<Frame>] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// 縮放後計算出的原始特徵
#[derive(Debug, Clone)]
pub struct FrameFeatures {
    pub frame: Arc<Frame>,
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
}

/// 工作池對單一影格的輸出，尚未評分
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub features: FrameFeatures,
    /// 相對於同場景前一張影格，場景第一張固定為 0
    pub motion: f64,
    pub face_score: f64,
}

#[derive(Debug, Clone)]
pub struct FrameScore {
    pub frame: Arc<Frame>,
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub motion: f64,
    pub face_score: f64,
    pub total_score: f64,
}

impl FrameScore {
    #[must_use]
    pub fn frame_index(&self) -> usize {
        self.frame.index
    }

    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.frame.timestamp_ms
    }
}

/// 單一影格的失敗紀錄
#[derive(Debug)]
pub struct FrameFailure {
    pub scene_index: usize,
    pub frame_index: usize,
    pub error: ThumbnailError,
}
