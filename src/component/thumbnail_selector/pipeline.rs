use super::face_detector::{FaceDetector, ScopedFaceDetector};
use super::frame::{Frame, FrameFailure, FrameScore};
use super::scene_segmenter::segment_scenes;
use super::scoring::{ScoringEngine, get_top_n};
use super::worker_pool::WorkerPool;
use crate::config::ThumbnailSettings;
use crate::error::{Result, ThumbnailError};
use crate::tools::{SourceFrame, SourceItem, downscale, resolve_pool_size};
use image::RgbImage;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 每批平行計算直方圖的影格數
const SAMPLE_BATCH_SIZE: usize = 64;

/// 一次流程的結果
#[derive(Debug)]
pub struct PipelineReport {
    /// 依總分由高到低
    pub thumbnails: Vec<FrameScore>,
    pub scene_count: usize,
    pub scenes_completed: usize,
    pub scored_frames: usize,
    pub failures: Vec<FrameFailure>,
    /// 影格來源略過的時間點
    pub source_failures: Vec<ThumbnailError>,
    /// 中途收到中斷信號，結果只包含已完成的場景
    pub cancelled: bool,
}

/// 縮圖候選挑選流程
///
/// 場景切割 → 逐場景並行擷取特徵 → 場景基準 → 評分 → 全域前 N 名。
/// 人臉偵測器在流程物件存在期間持有，物件釋放時關閉。
pub struct ThumbnailPipeline<D: FaceDetector> {
    face_detector: ScopedFaceDetector<D>,
    histogram_bins: usize,
    sample_width: u32,
    engine: ScoringEngine,
    worker_pool: WorkerPool,
    shutdown_signal: Arc<AtomicBool>,
    progress: Option<ProgressBar>,
}

impl<D: FaceDetector> ThumbnailPipeline<D> {
    /// 設定錯誤會在任何工作開始前回傳
    pub fn new(
        settings: &ThumbnailSettings,
        face_detector: D,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Result<Self> {
        let face_detector = ScopedFaceDetector::new(face_detector);
        settings.validate()?;

        let pool_size = resolve_pool_size(settings.pool_size);
        let face_pool_size = settings.face_pool_size.unwrap_or(pool_size);
        let worker_pool = WorkerPool::new(
            pool_size,
            face_pool_size,
            settings.analysis_width,
            Arc::clone(&shutdown_signal),
        )?;

        debug!(
            "流程設定: pool_size={pool_size}, face_pool_size={face_pool_size}, bins={}, \
             sample_width={}, analysis_width={}",
            settings.histogram_bins, settings.sample_width, settings.analysis_width
        );

        Ok(Self {
            face_detector,
            histogram_bins: settings.histogram_bins,
            sample_width: settings.sample_width,
            engine: ScoringEngine::new(settings.weights, settings.ideals),
            worker_pool,
            shutdown_signal,
            progress: None,
        })
    }

    /// 每完成一個場景前進一格
    #[must_use]
    pub fn with_progress(mut self, progress_bar: ProgressBar) -> Self {
        self.progress = Some(progress_bar);
        self
    }

    /// 讀取來源並平行計算直方圖，保留來源順序
    ///
    /// 逐批讀取並縮放到 `sample_width`，記憶體中只保留縮放後的影像。
    /// 來源回報的失敗原樣收集。
    pub fn sample_frames<I>(&self, source: I) -> (Vec<Arc<Frame>>, Vec<ThumbnailError>)
    where
        I: IntoIterator<Item = SourceItem>,
    {
        let mut frames = Vec::new();
        let mut failures = Vec::new();
        let mut batch = Vec::with_capacity(SAMPLE_BATCH_SIZE);

        for item in source {
            match item {
                Ok(source_frame) => batch.push(source_frame),
                Err(e) => failures.push(e),
            }
            if batch.len() == SAMPLE_BATCH_SIZE {
                frames.extend(self.build_frames(mem::take(&mut batch)));
            }
        }
        frames.extend(self.build_frames(batch));

        (frames, failures)
    }

    fn build_frames(&self, batch: Vec<SourceFrame>) -> Vec<Arc<Frame>> {
        let bins = self.histogram_bins;
        let width = self.sample_width;

        batch
            .into_par_iter()
            .map(|f| {
                let image = fit_width(f.image, width);
                Arc::new(Frame::new(f.index, f.timestamp_ms, image, bins))
            })
            .collect()
    }

    /// 從影格來源產生前 N 名縮圖候選
    pub fn generate_thumbnails<I>(&self, source: I, top_n: usize) -> Result<Vec<FrameScore>>
    where
        I: IntoIterator<Item = SourceItem>,
    {
        self.process_source(source, top_n).map(|report| report.thumbnails)
    }

    pub fn process_source<I>(&self, source: I, top_n: usize) -> Result<PipelineReport>
    where
        I: IntoIterator<Item = SourceItem>,
    {
        let (frames, source_failures) = self.sample_frames(source);
        info!(
            "取樣完成: {} 張影格, 略過 {} 個時間點",
            frames.len(),
            source_failures.len()
        );

        let mut report = self.run(&frames, top_n)?;
        report.source_failures = source_failures;
        Ok(report)
    }

    /// 對已計算直方圖的影格執行完整流程
    pub fn run(&self, frames: &[Arc<Frame>], top_n: usize) -> Result<PipelineReport> {
        if frames.is_empty() {
            return Err(ThumbnailError::EmptyFrameSequence);
        }

        let scenes = segment_scenes(frames)?;
        info!("{} 張影格切割為 {} 個場景", frames.len(), scenes.len());

        if let Some(progress_bar) = &self.progress {
            progress_bar.set_length(scenes.len() as u64);
            progress_bar.set_position(0);
        }

        let mut all_scores = Vec::with_capacity(frames.len());
        let mut failures = Vec::new();
        let mut scenes_completed = 0;
        let mut cancelled = false;

        for scene in &scenes {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                cancelled = true;
                break;
            }

            let analysis = match self.worker_pool.process_scene(scene, &*self.face_detector) {
                Ok(analysis) => analysis,
                Err(ThumbnailError::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(e) => return Err(e),
            };

            if analysis.frames.is_empty() {
                warn!("場景 {} 的所有影格都失敗", analysis.scene_index);
            }

            let scores = self.engine.score_scene(&analysis.frames);
            debug!(
                "場景 {} 評分完成: {} 張影格",
                analysis.scene_index,
                scores.len()
            );

            all_scores.extend(scores);
            failures.extend(analysis.failures);
            scenes_completed += 1;

            if let Some(progress_bar) = &self.progress {
                progress_bar.inc(1);
            }
        }

        if cancelled {
            warn!(
                "收到中斷信號，只使用已完成的 {scenes_completed}/{} 個場景",
                scenes.len()
            );
            if let Some(progress_bar) = &self.progress {
                progress_bar.abandon_with_message("操作已中斷");
            }
        } else if let Some(progress_bar) = &self.progress {
            progress_bar.finish_with_message("完成");
        }

        let scored_frames = all_scores.len();
        let thumbnails = get_top_n(all_scores, top_n);

        info!(
            "評分完成 - 場景: {scenes_completed}/{}, 影格: {scored_frames}, 失敗: {}, 選出: {}",
            scenes.len(),
            failures.len(),
            thumbnails.len()
        );

        Ok(PipelineReport {
            thumbnails,
            scene_count: scenes.len(),
            scenes_completed,
            scored_frames,
            failures,
            source_failures: Vec::new(),
            cancelled,
        })
    }
}

/// 比 `width` 寬時縮小，否則原樣保留
fn fit_width(image: RgbImage, width: u32) -> RgbImage {
    if image.width() > width {
        downscale(&image, width)
    } else {
        image
    }
}
