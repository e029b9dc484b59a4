//! 整合測試 - 以合成影格驗證完整挑選流程

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::bail;
use image::{Rgb, RgbImage};
use scene_thumbnailer::component::thumbnail_selector::{
    FaceDetector, Frame, FrameScore, NoFaceDetector, ThumbnailPipeline, segment_scenes,
};
use scene_thumbnailer::config::{ScoringWeights, ThumbnailSettings};
use scene_thumbnailer::error::{ErrorKind, ThumbnailError};
use scene_thumbnailer::tools::{SourceFrame, SourceItem};

/// 以一維直方圖控制場景切割位置
fn frame_at(index: usize, position: f64, value: u8) -> Arc<Frame> {
    Arc::new(Frame::with_histogram(
        index,
        index as u64 * 500,
        RgbImage::from_pixel(16, 16, Rgb([value; 3])),
        vec![position],
    ))
}

fn settings(pool_size: usize) -> ThumbnailSettings {
    ThumbnailSettings {
        pool_size: Some(pool_size),
        face_pool_size: Some(2),
        ..ThumbnailSettings::default()
    }
}

fn no_signal() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn by_index(scores: &[FrameScore]) -> HashMap<usize, &FrameScore> {
    scores.iter().map(|s| (s.frame_index(), s)).collect()
}

/// 依影像亮度回傳固定分數
struct BrightnessFaceDetector;

impl FaceDetector for BrightnessFaceDetector {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<f64> {
        Ok(f64::from(image.get_pixel(0, 0).0[0]) / 255.0)
    }
}

/// 亮度超過 200 的影像偵測失敗
struct FlakyFaceDetector;

impl FaceDetector for FlakyFaceDetector {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<f64> {
        if image.get_pixel(0, 0).0[0] > 200 {
            bail!("model timeout");
        }
        Ok(1.0)
    }
}

struct ClosingFaceDetector {
    closed: Arc<AtomicUsize>,
}

impl FaceDetector for ClosingFaceDetector {
    fn detect(&self, _image: &RgbImage) -> anyhow::Result<f64> {
        Ok(0.0)
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// 測試 1: 兩個場景且每張影格都被評分
#[test]
fn test_pipeline_scores_every_frame() {
    // diffs = [1, 1, 9, 1]，平均 3，只在第 2、3 張之間切割
    let frames: Vec<Arc<Frame>> = [0.0, 1.0, 2.0, 11.0, 12.0]
        .iter()
        .enumerate()
        .map(|(i, &p)| frame_at(i, p, (i * 40) as u8))
        .collect();

    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, no_signal()).unwrap();
    let report = pipeline.run(&frames, usize::MAX).unwrap();

    assert_eq!(report.scene_count, 2);
    assert_eq!(report.scenes_completed, 2);
    assert_eq!(report.scored_frames, 5);
    assert_eq!(report.thumbnails.len(), 5);
    assert!(report.failures.is_empty());
    assert!(!report.cancelled);

    for pair in report.thumbnails.windows(2) {
        assert!(pair[0].total_score >= pair[1].total_score, "結果應依總分遞減");
    }
}

/// 測試 2: 每個場景的第一張影格動態為 0，其餘與同場景前一張比較
#[test]
fn test_motion_within_scene() {
    let positions = [0.0, 0.1, 0.2, 9.0, 9.1, 9.2, 9.3, 20.0, 20.1];
    let values: Vec<u8> = (0..positions.len()).map(|i| (i * 25) as u8).collect();
    let frames: Vec<Arc<Frame>> = positions
        .iter()
        .enumerate()
        .map(|(i, &p)| frame_at(i, p, values[i]))
        .collect();

    let scenes = segment_scenes(&frames).unwrap();
    let first_indices: Vec<usize> = scenes.iter().map(|s| s.frames()[0].index).collect();
    assert_eq!(first_indices, vec![0, 3, 7]);

    let pipeline = ThumbnailPipeline::new(&settings(4), NoFaceDetector, no_signal()).unwrap();
    let report = pipeline.run(&frames, usize::MAX).unwrap();
    let scores = by_index(&report.thumbnails);

    for i in 0..frames.len() {
        let expected = if first_indices.contains(&i) {
            0.0
        } else {
            f64::from(values[i] - values[i - 1]) / 255.0
        };
        assert!(
            (scores[&i].motion - expected).abs() < 1e-12,
            "影格 {i} 動態應為 {expected}，實際 {}",
            scores[&i].motion
        );
    }
}

/// 測試 3: 要求 3 張但只有 2 張影格
#[test]
fn test_top_n_larger_than_input() {
    let frames = vec![frame_at(0, 0.0, 10), frame_at(1, 0.0, 20)];
    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, no_signal()).unwrap();

    let report = pipeline.run(&frames, 3).unwrap();
    assert_eq!(report.thumbnails.len(), 2);
}

/// 測試 4: 只看銳利度且等於理想值時總分為 1
#[test]
fn test_sharpness_only_weights() {
    let mut config = settings(1);
    config.weights = ScoringWeights::from_slice(&[1.0, 0.0, 0.0, 0.0, 0.0]).unwrap();

    // 單張影格的場景基準就是自己的特徵
    let frames = vec![frame_at(0, 0.0, 90)];
    let pipeline = ThumbnailPipeline::new(&config, NoFaceDetector, no_signal()).unwrap();
    let report = pipeline.run(&frames, 1).unwrap();

    assert_eq!(report.thumbnails.len(), 1);
    assert!((report.thumbnails[0].total_score - 1.0).abs() < 1e-12);
}

/// 測試 5: 人臉分數影響排名，並跨場景全域挑選
#[test]
fn test_face_score_drives_global_ranking() {
    let frames: Vec<Arc<Frame>> = vec![
        frame_at(0, 0.0, 30),
        frame_at(1, 0.0, 250),
        frame_at(2, 50.0, 120),
        frame_at(3, 50.0, 60),
    ];

    // 只看人臉分數，總分等於偵測結果
    let mut config = settings(2);
    config.weights = ScoringWeights::from_slice(&[0.0, 0.0, 0.0, 0.0, 1.0]).unwrap();

    let pipeline = ThumbnailPipeline::new(&config, BrightnessFaceDetector, no_signal()).unwrap();
    let report = pipeline.run(&frames, 2).unwrap();
    assert_eq!(report.scene_count, 2);

    let order: Vec<usize> = report.thumbnails.iter().map(FrameScore::frame_index).collect();
    assert_eq!(order, vec![1, 2]);
    assert!((report.thumbnails[0].face_score - 250.0 / 255.0).abs() < 1e-12);
}

/// 測試 6: 人臉偵測失敗時分數為 0，影格保留並記錄
#[test]
fn test_face_detector_failure_is_isolated() {
    let frames = vec![
        frame_at(0, 0.0, 100),
        frame_at(1, 0.0, 250),
        frame_at(2, 0.0, 100),
    ];
    let pipeline = ThumbnailPipeline::new(&settings(2), FlakyFaceDetector, no_signal()).unwrap();
    let report = pipeline.run(&frames, usize::MAX).unwrap();

    assert_eq!(report.scored_frames, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].frame_index, 1);
    assert_eq!(report.failures[0].error.kind(), ErrorKind::Collaborator);

    let scores = by_index(&report.thumbnails);
    assert_eq!(scores[&1].face_score, 0.0);
    assert_eq!(scores[&0].face_score, 1.0);
}

/// 測試 7: 整個場景擷取失敗不影響其他場景
#[test]
fn test_scene_losing_all_frames() {
    let empty = |index: usize, position: f64| {
        Arc::new(Frame::with_histogram(index, 0, RgbImage::new(0, 0), vec![position]))
    };
    let frames = vec![
        frame_at(0, 0.0, 50),
        frame_at(1, 0.0, 60),
        empty(2, 30.0),
        empty(3, 30.0),
    ];

    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, no_signal()).unwrap();
    let report = pipeline.run(&frames, 5).unwrap();

    assert_eq!(report.scene_count, 2);
    assert_eq!(report.scenes_completed, 2);
    assert_eq!(report.scored_frames, 2);
    assert_eq!(report.failures.len(), 2);
    assert!(
        report
            .failures
            .iter()
            .all(|f| f.error.kind() == ErrorKind::Extraction && f.scene_index == 1)
    );
}

/// 測試 8: 重複執行結果完全相同
#[test]
fn test_pipeline_is_idempotent() {
    let frames: Vec<Arc<Frame>> = (0..24)
        .map(|i| {
            let image = RgbImage::from_fn(32, 24, |x, y| {
                Rgb([((x * 8 + i) % 256) as u8, ((y * 10) % 256) as u8, ((x * y + i) % 256) as u8])
            });
            Arc::new(Frame::new(i as usize, u64::from(i) * 500, image, 8))
        })
        .collect();

    let pipeline =
        ThumbnailPipeline::new(&settings(4), BrightnessFaceDetector, no_signal()).unwrap();
    let first = pipeline.run(&frames, 10).unwrap();
    let second = pipeline.run(&frames, 10).unwrap();

    assert_eq!(first.scene_count, second.scene_count);
    let summarize = |scores: &[FrameScore]| -> Vec<(usize, u64)> {
        scores
            .iter()
            .map(|s| (s.frame_index(), s.total_score.to_bits()))
            .collect()
    };
    assert_eq!(summarize(&first.thumbnails), summarize(&second.thumbnails));
}

/// 測試 9: 空輸入與設定錯誤
#[test]
fn test_input_and_config_errors() {
    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, no_signal()).unwrap();
    let err = pipeline.run(&[], 3).unwrap_err();
    assert!(matches!(err, ThumbnailError::EmptyFrameSequence));

    let closed = Arc::new(AtomicUsize::new(0));
    let mut invalid = settings(2);
    invalid.histogram_bins = 0;
    let result = ThumbnailPipeline::new(
        &invalid,
        ClosingFaceDetector {
            closed: Arc::clone(&closed),
        },
        no_signal(),
    );
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::FatalConfig));
    assert_eq!(closed.load(Ordering::SeqCst), 1, "設定錯誤時也要釋放偵測器");
}

/// 測試 10: 人臉偵測器在流程結束後釋放一次
#[test]
fn test_face_detector_released_after_run() {
    let closed = Arc::new(AtomicUsize::new(0));
    {
        let pipeline = ThumbnailPipeline::new(
            &settings(2),
            ClosingFaceDetector {
                closed: Arc::clone(&closed),
            },
            no_signal(),
        )
        .unwrap();
        pipeline.run(&[frame_at(0, 0.0, 1)], 1).unwrap();
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

/// 測試 11: 開始前已收到中斷信號
#[test]
fn test_cancelled_pipeline_keeps_no_partial_scene() {
    let shutdown_signal = Arc::new(AtomicBool::new(true));
    let frames = vec![frame_at(0, 0.0, 10), frame_at(1, 0.0, 20)];

    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, shutdown_signal).unwrap();
    let report = pipeline.run(&frames, 2).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.scenes_completed, 0);
    assert!(report.thumbnails.is_empty());
}

/// 測試 12: 從影格來源取樣並計算直方圖
#[test]
fn test_generate_thumbnails_from_source() {
    let source: Vec<SourceFrame> = (0..6u8)
        .map(|i| SourceFrame {
            index: usize::from(i),
            timestamp_ms: u64::from(i) * 1_000,
            image: RgbImage::from_pixel(8, 8, Rgb([if i < 3 { 20 } else { 230 }; 3])),
        })
        .collect();

    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, no_signal()).unwrap();

    let items = || source.iter().cloned().map(Ok).collect::<Vec<SourceItem>>();
    let (frames, source_failures) = pipeline.sample_frames(items());
    assert!(source_failures.is_empty());
    assert_eq!(frames.len(), 6);
    assert!(frames.iter().enumerate().all(|(i, f)| f.index == i));
    assert_eq!(frames[0].histogram.len(), 24);
    assert_eq!(segment_scenes(&frames).unwrap().len(), 2);

    let thumbnails = pipeline.generate_thumbnails(items(), 4).unwrap();
    assert_eq!(thumbnails.len(), 4);
}

/// 測試 13: 取樣時縮小到 sample_width，窄影像保持原尺寸
#[test]
fn test_sampled_frames_are_bounded_in_width() {
    let config = ThumbnailSettings {
        sample_width: 100,
        ..settings(2)
    };
    let pipeline = ThumbnailPipeline::new(&config, NoFaceDetector, no_signal()).unwrap();

    // 超過一個批次，確認跨批次仍保留順序
    let source: Vec<SourceItem> = (0..150usize)
        .map(|i| {
            let width = if i % 2 == 0 { 1000 } else { 60 };
            Ok(SourceFrame {
                index: i,
                timestamp_ms: i as u64 * 500,
                image: RgbImage::from_pixel(width, 500, Rgb([(i % 256) as u8; 3])),
            })
        })
        .collect();

    let (frames, _) = pipeline.sample_frames(source);
    assert_eq!(frames.len(), 150);
    assert!(frames.iter().enumerate().all(|(i, f)| f.index == i));
    assert_eq!(frames[0].image.dimensions(), (100, 50));
    assert_eq!(frames[1].image.dimensions(), (60, 500));
}

/// 測試 14: 影格來源略過的時間點出現在結果中
#[test]
fn test_source_failures_reach_report() {
    let frame = |index: usize, value: u8| -> SourceItem {
        Ok(SourceFrame {
            index,
            timestamp_ms: index as u64 * 1_000,
            image: RgbImage::from_pixel(8, 8, Rgb([value; 3])),
        })
    };
    let source: Vec<SourceItem> = vec![
        frame(0, 10),
        Err(ThumbnailError::SourceFrame {
            timestamp_ms: 1_000,
            reason: "decode failed".to_string(),
        }),
        frame(1, 20),
    ];

    let pipeline = ThumbnailPipeline::new(&settings(2), NoFaceDetector, no_signal()).unwrap();
    let report = pipeline.process_source(source, 5).unwrap();

    assert_eq!(report.scored_frames, 2);
    assert_eq!(report.source_failures.len(), 1);
    assert_eq!(report.source_failures[0].kind(), ErrorKind::Collaborator);
    assert!(report.failures.is_empty());
}
