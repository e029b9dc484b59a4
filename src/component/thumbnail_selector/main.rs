use super::face_detector::NoFaceDetector;
use super::frame::FrameScore;
use super::pipeline::{PipelineReport, ThumbnailPipeline};
use crate::config::{ThumbnailSettings, validate_top_n};
use crate::tools::{
    FfmpegFrameSource, FfprobeMetadataProvider, ImageSequenceSource, MetadataProvider,
    SourceItem, sampling_interval_ms,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 資料夾模式沒有影片資訊時的預設間隔
const DEFAULT_SEQUENCE_INTERVAL_MS: u64 = 500;

type FrameStream = Box<dyn Iterator<Item = SourceItem>>;

/// 縮圖候選挑選
///
/// 輸入可以是影片檔（ffprobe + ffmpeg 取樣）或已拆好的影像資料夾。
pub struct ThumbnailSelector {
    settings: ThumbnailSettings,
    shutdown_signal: Arc<AtomicBool>,
}

impl ThumbnailSelector {
    pub const fn new(settings: ThumbnailSettings, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            settings,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 縮圖候選挑選 ===").cyan().bold());

        let input_path = prompt_input_path()?;
        let top_n = self.prompt_top_n()?;

        let source = self
            .open_source(Path::new(&input_path), &FfprobeMetadataProvider)
            .with_context(|| format!("無法開啟輸入: {input_path}"))?;

        let pipeline = ThumbnailPipeline::new(
            &self.settings,
            NoFaceDetector,
            Arc::clone(&self.shutdown_signal),
        )?
        .with_progress(scene_progress_bar());

        println!("{}", style("分析影格中...").dim());
        let report = pipeline.process_source(source, top_n)?;

        print_summary(&report);
        Ok(())
    }

    fn prompt_top_n(&self) -> Result<usize> {
        let value: i64 = Input::new()
            .with_prompt("要選出幾張縮圖")
            .default(i64::try_from(self.settings.top_n).unwrap_or(i64::MAX))
            .interact_text()?;
        Ok(validate_top_n(value)?)
    }

    fn open_source(&self, path: &Path, provider: &dyn MetadataProvider) -> Result<FrameStream> {
        if path.is_dir() {
            let interval = self
                .settings
                .sampling_interval_ms
                .unwrap_or(DEFAULT_SEQUENCE_INTERVAL_MS);
            let source = ImageSequenceSource::scan(path, interval)?;
            return Ok(Box::new(source));
        }

        let metadata = provider.metadata(path)?;
        let interval = self
            .settings
            .sampling_interval_ms
            .unwrap_or_else(|| sampling_interval_ms(&metadata));

        println!(
            "  {:.1}s, {}x{}, 每 {}ms 取樣一次",
            metadata.duration_ms as f64 / 1000.0,
            metadata.width,
            metadata.height,
            interval
        );

        let source = FfmpegFrameSource::new(
            path,
            &metadata,
            interval,
            self.settings.sample_width,
            Arc::clone(&self.shutdown_signal),
        )?;
        Ok(Box::new(source))
    }
}

fn prompt_input_path() -> Result<String> {
    let path: String = Input::new()
        .with_prompt("請輸入影片檔或影格資料夾路徑")
        .interact_text()?;
    Ok(path.trim().to_string())
}

fn print_summary(report: &PipelineReport) {
    println!();
    println!("{}", style("=== 縮圖候選摘要 ===").cyan().bold());
    println!("  場景: {}/{}", report.scenes_completed, report.scene_count);
    println!("  評分影格: {}", report.scored_frames);

    if !report.failures.is_empty() {
        println!("  失敗: {}", style(report.failures.len()).red());
    }
    if !report.source_failures.is_empty() {
        println!("  無法取樣: {}", style(report.source_failures.len()).yellow());
    }
    if report.cancelled {
        println!("  {}", style("流程已中斷，結果只包含已完成的場景").yellow());
    }

    println!();
    for (rank, score) in report.thumbnails.iter().enumerate() {
        println!("  {}. {}", rank + 1, format_score(score));
    }

    info!(
        "縮圖挑選完成 - 選出: {}, 失敗: {}, 無法取樣: {}",
        report.thumbnails.len(),
        report.failures.len(),
        report.source_failures.len()
    );
}

fn scene_progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(0);
    if let Ok(progress_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} 場景 {msg}")
    {
        progress_bar.set_style(progress_style.progress_chars("#>-"));
    }
    progress_bar
}

fn format_score(score: &FrameScore) -> String {
    format!(
        "影格 #{} @ {:.2}s  總分 {:.3} (銳利 {:.4}, 亮度 {:.3}, 對比 {:.3}, 動態 {:.3}, 人臉 {:.2})",
        score.frame_index(),
        score.timestamp_ms() as f64 / 1000.0,
        score.total_score,
        score.sharpness,
        score.brightness,
        score.contrast,
        score.motion,
        score.face_score
    )
}
