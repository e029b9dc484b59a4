use super::frame::{Frame, Scene};
use crate::error::Result;
use crate::tools::histogram_distance;
use log::debug;
use std::sync::Arc;

/// 以自適應閾值將影格序列切成連續場景
///
/// 閾值為相鄰影格直方圖距離的平均值，距離嚴格大於閾值時切割。
/// 所有場景依序串接後等於原始輸入；空輸入回傳空列表。
pub fn segment_scenes(frames: &[Arc<Frame>]) -> Result<Vec<Scene>> {
    let Some(first) = frames.first() else {
        return Ok(Vec::new());
    };

    if frames.len() == 1 {
        return Ok(vec![Scene::new(0, vec![Arc::clone(first)])?]);
    }

    let diffs = frames
        .windows(2)
        .map(|pair| histogram_distance(&pair[0].histogram, &pair[1].histogram))
        .collect::<Result<Vec<f64>>>()?;
    let threshold = diffs.iter().sum::<f64>() / diffs.len() as f64;

    debug!("場景切割閾值: {threshold:.4} ({} 個相鄰距離)", diffs.len());

    let mut scenes = Vec::new();
    let mut current = vec![Arc::clone(first)];

    for (frame, &diff) in frames[1..].iter().zip(&diffs) {
        if diff > threshold {
            let closed = std::mem::take(&mut current);
            scenes.push(Scene::new(scenes.len(), closed)?);
        }
        current.push(Arc::clone(frame));
    }
    scenes.push(Scene::new(scenes.len(), current)?);

    debug!("切割出 {} 個場景", scenes.len());

    Ok(scenes)
}
