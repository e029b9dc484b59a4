//! 場景內的並行特徵擷取
//!
//! 三個步驟：
//! 1. 縮放並計算銳利度、亮度、對比（最多 `pool_size` 個同時執行）
//! 2. 對保留下來的影格呼叫人臉偵測（另一個獨立大小的執行緒池）
//! 3. 依影格順序計算與前一張的動態差異
//!
//! 步驟 1 的完成順序不固定，結束後立即依 `frame.index` 重新排序，
//! 之後的動態與場景基準計算都依賴這個順序。

use super::face_detector::FaceDetector;
use super::frame::{Frame, FrameAnalysis, FrameFailure, FrameFeatures, Scene};
use crate::error::{Result, ThumbnailError};
use crate::tools::{
    TaskOutcome, brightness, contrast, downscale, motion, run_bounded, sharpness,
};
use image::RgbImage;
use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 單一場景的處理結果，`frames` 依原始影格順序排列
#[derive(Debug)]
pub struct SceneAnalysis {
    pub scene_index: usize,
    pub frames: Vec<FrameAnalysis>,
    pub failures: Vec<FrameFailure>,
}

struct ExtractedFrame {
    features: FrameFeatures,
    analysis_image: RgbImage,
}

pub struct WorkerPool {
    pool_size: usize,
    face_pool: ThreadPool,
    analysis_width: u32,
    shutdown_signal: Arc<AtomicBool>,
}

impl WorkerPool {
    pub fn new(
        pool_size: usize,
        face_pool_size: usize,
        analysis_width: u32,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self> {
        if pool_size == 0 || face_pool_size == 0 {
            return Err(ThumbnailError::config("工作池大小必須大於 0"));
        }

        let face_pool = ThreadPoolBuilder::new()
            .num_threads(face_pool_size)
            .thread_name(|i| format!("face-detect-{i}"))
            .build()
            .map_err(|e| ThumbnailError::config(format!("無法建立人臉偵測執行緒池: {e}")))?;

        Ok(Self {
            pool_size,
            face_pool,
            analysis_width,
            shutdown_signal,
        })
    }

    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn process_scene(
        &self,
        scene: &Scene,
        detector: &dyn FaceDetector,
    ) -> Result<SceneAnalysis> {
        let scene_index = scene.scene_index();
        let analysis_width = self.analysis_width;

        let completed = run_bounded(
            scene.frames().to_vec(),
            self.pool_size,
            &self.shutdown_signal,
            |frame| extract_frame(frame, analysis_width),
        )?;
        let ordered = restore_frame_order(scene.frames(), completed);

        let mut failures = Vec::new();
        let mut extracted = Vec::with_capacity(ordered.len());
        for (frame_index, result) in ordered {
            match result {
                Ok(frame) => extracted.push(frame),
                Err(error) => {
                    warn!("場景 {scene_index} 略過影格 {frame_index}: {error}");
                    failures.push(FrameFailure {
                        scene_index,
                        frame_index,
                        error,
                    });
                }
            }
        }

        let face_scores = self.detect_faces(&extracted, detector);
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(ThumbnailError::Cancelled);
        }

        let mut frames = Vec::with_capacity(extracted.len());
        let mut previous: Option<&RgbImage> = None;
        for (current, face_result) in extracted.iter().zip(face_scores) {
            let frame_index = current.features.frame.index;
            let face_score = match face_result {
                Ok(score) => score,
                Err(error) => {
                    warn!("影格 {frame_index} 人臉偵測失敗，分數以 0 計: {error}");
                    failures.push(FrameFailure {
                        scene_index,
                        frame_index,
                        error,
                    });
                    0.0
                }
            };

            let frame_motion =
                previous.map_or(0.0, |prev| motion(&current.analysis_image, prev));
            previous = Some(&current.analysis_image);

            frames.push(FrameAnalysis {
                features: current.features.clone(),
                motion: frame_motion,
                face_score,
            });
        }

        debug!(
            "場景 {scene_index} 完成: {} 張成功, {} 個失敗",
            frames.len(),
            failures.len()
        );

        Ok(SceneAnalysis {
            scene_index,
            frames,
            failures,
        })
    }

    /// 結果順序與 `frames` 相同
    fn detect_faces(
        &self,
        frames: &[ExtractedFrame],
        detector: &dyn FaceDetector,
    ) -> Vec<Result<f64>> {
        let shutdown_signal = &self.shutdown_signal;
        self.face_pool.install(|| {
            frames
                .par_iter()
                .map(|extracted| {
                    if shutdown_signal.load(Ordering::SeqCst) {
                        return Err(ThumbnailError::Cancelled);
                    }
                    let frame = &extracted.features.frame;
                    match detector.detect(&frame.image) {
                        Ok(score) if score.is_finite() => Ok(score.clamp(0.0, 1.0)),
                        Ok(score) => Err(ThumbnailError::Collaborator {
                            frame_index: frame.index,
                            reason: format!("人臉分數不是有限值: {score}"),
                        }),
                        Err(e) => Err(ThumbnailError::Collaborator {
                            frame_index: frame.index,
                            reason: format!("{e:#}"),
                        }),
                    }
                })
                .collect()
        })
    }
}

/// 將完成順序的結果依影格索引排回原始順序
///
/// 中止的任務轉為該影格的擷取失敗。
fn restore_frame_order(
    frames: &[Arc<Frame>],
    completed: Vec<(usize, TaskOutcome<Result<ExtractedFrame>>)>,
) -> Vec<(usize, Result<ExtractedFrame>)> {
    let mut ordered: Vec<(usize, Result<ExtractedFrame>)> = completed
        .into_iter()
        .map(|(position, outcome)| {
            let frame_index = frames[position].index;
            let result = outcome.unwrap_or_else(|message| {
                Err(ThumbnailError::Extraction {
                    frame_index,
                    reason: format!("擷取工作中止: {message}"),
                })
            });
            (frame_index, result)
        })
        .collect();
    ordered.sort_by_key(|(frame_index, _)| *frame_index);
    ordered
}

/// 縮放後計算三項特徵；沒有像素的影格視為擷取失敗
fn extract_frame(frame: Arc<Frame>, analysis_width: u32) -> Result<ExtractedFrame> {
    let (width, height) = frame.image.dimensions();
    if width == 0 || height == 0 {
        return Err(ThumbnailError::Extraction {
            frame_index: frame.index,
            reason: format!("影像尺寸為 {width}x{height}"),
        });
    }

    let analysis_image = downscale(&frame.image, analysis_width);
    let features = FrameFeatures {
        sharpness: sharpness(&analysis_image),
        brightness: brightness(&analysis_image),
        contrast: contrast(&analysis_image),
        frame,
    };

    Ok(ExtractedFrame {
        features,
        analysis_image,
    })
}
