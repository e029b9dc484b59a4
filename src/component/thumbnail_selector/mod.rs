//! 縮圖候選挑選元件
//!
//! 流程：
//! A. 取樣影格並計算色彩直方圖
//! B. 以自適應閾值切割場景
//! C. 逐場景並行擷取特徵、人臉偵測、動態差異
//! D. 以場景平均為基準評分
//! E. 全域挑選前 N 名

mod face_detector;
mod frame;
mod ideal_metrics;
mod main;
mod pipeline;
mod scene_segmenter;
mod scoring;
mod worker_pool;

pub use face_detector::{FaceDetector, NoFaceDetector, ScopedFaceDetector};
pub use frame::{Frame, FrameAnalysis, FrameFailure, FrameFeatures, FrameScore, Scene};
pub use ideal_metrics::SceneIdealMetrics;
pub use main::ThumbnailSelector;
pub use pipeline::{PipelineReport, ThumbnailPipeline};
pub use scene_segmenter::segment_scenes;
pub use scoring::{ScoringEngine, get_top_n, score_optimal};
pub use worker_pool::{SceneAnalysis, WorkerPool};
