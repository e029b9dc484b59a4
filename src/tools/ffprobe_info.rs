use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub duration_ms: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
}

/// 影片資訊來源，只用來決定取樣間隔
pub trait MetadataProvider {
    fn metadata(&self, path: &Path) -> Result<VideoMetadata>;
}

/// 使用 ffprobe 取得影片資訊
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeMetadataProvider;

impl MetadataProvider for FfprobeMetadataProvider {
    fn metadata(&self, path: &Path) -> Result<VideoMetadata> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffprobe 執行失敗: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ffprobe_output(&stdout)
            .with_context(|| format!("無法解析影片資訊: {}", path.display()))
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

fn parse_ffprobe_output(json: &str) -> Result<VideoMetadata> {
    let probe: FfprobeOutput = serde_json::from_str(json).context("無法解析 ffprobe 輸出")?;

    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| anyhow::anyhow!("找不到視訊串流"))?;

    let width = video_stream
        .width
        .ok_or_else(|| anyhow::anyhow!("無法取得影片寬度"))?;
    let height = video_stream
        .height
        .ok_or_else(|| anyhow::anyhow!("無法取得影片高度"))?;

    // 優先從 format 取長度，其次從 stream
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| anyhow::anyhow!("無法取得影片長度"))?;

    let frame_rate = video_stream
        .r_frame_rate
        .as_ref()
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    Ok(VideoMetadata {
        duration_ms: (duration_seconds * 1000.0).round() as u64,
        width,
        height,
        frame_rate,
    })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}

/// 根據影片長度決定取樣間隔（毫秒）
///
/// 超過 2 小時每 2 秒一張，超過 1 小時每秒一張，其餘每 0.5 秒一張，
/// 且不短於一個影格的時間。
#[must_use]
pub fn sampling_interval_ms(metadata: &VideoMetadata) -> u64 {
    let interval = if metadata.duration_ms > 7_200_000 {
        2_000
    } else if metadata.duration_ms > 3_600_000 {
        1_000
    } else {
        500
    };

    let frame_period = if metadata.frame_rate > 0.0 {
        (1000.0 / metadata.frame_rate).ceil() as u64
    } else {
        1
    };

    interval.max(frame_period).max(1)
}
