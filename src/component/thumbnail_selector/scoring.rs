use super::frame::{FrameAnalysis, FrameScore};
use super::ideal_metrics::SceneIdealMetrics;
use crate::config::{IdealDefaults, ScoringWeights};
use std::sync::Arc;

/// 與理想值的距離轉為 [0, 1] 分數，距離為 0 時得 1
#[must_use]
pub fn score_optimal(value: f64, ideal: f64, max_distance: f64) -> f64 {
    (1.0 - (value - ideal).abs() / max_distance).clamp(0.0, 1.0)
}

/// 依權重計算總分
///
/// 有場景基準時以場景平均取代預設理想值，最大距離一律使用設定值。
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
    defaults: IdealDefaults,
}

impl ScoringEngine {
    #[must_use]
    pub const fn new(weights: ScoringWeights, defaults: IdealDefaults) -> Self {
        Self { weights, defaults }
    }

    #[must_use]
    pub fn score(
        &self,
        analysis: &FrameAnalysis,
        ideals: Option<&SceneIdealMetrics>,
    ) -> FrameScore {
        let d = &self.defaults;
        let (brightness_ideal, contrast_ideal, sharpness_ideal) = ideals.map_or(
            (d.brightness_ideal, d.contrast_ideal, d.sharpness_ideal),
            |m| (m.brightness_ideal, m.contrast_ideal, m.sharpness_ideal),
        );

        let f = &analysis.features;
        let sharpness_score = score_optimal(f.sharpness, sharpness_ideal, d.max_sharpness_distance);
        let brightness_score =
            score_optimal(f.brightness, brightness_ideal, d.max_brightness_distance);
        let contrast_score = score_optimal(f.contrast, contrast_ideal, d.max_contrast_distance);

        let w = &self.weights;
        let total_score = sharpness_score * w.sharpness
            + brightness_score * w.brightness
            + contrast_score * w.contrast
            + (1.0 - analysis.motion) * w.motion
            + analysis.face_score * w.face;

        FrameScore {
            frame: Arc::clone(&f.frame),
            sharpness: f.sharpness,
            brightness: f.brightness,
            contrast: f.contrast,
            motion: analysis.motion,
            face_score: analysis.face_score,
            total_score,
        }
    }

    /// 先彙總場景基準，再對每張影格評分
    #[must_use]
    pub fn score_scene(&self, analyses: &[FrameAnalysis]) -> Vec<FrameScore> {
        let ideals = SceneIdealMetrics::aggregate(analyses.iter().map(|a| &a.features));
        analyses
            .iter()
            .map(|analysis| self.score(analysis, ideals.as_ref()))
            .collect()
    }
}

/// 依總分由高到低取前 n 名，同分時保留原本的先後順序
#[must_use]
pub fn get_top_n(mut scores: Vec<FrameScore>, n: usize) -> Vec<FrameScore> {
    scores.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    scores.truncate(n);
    scores
}
