use super::frame::FrameFeatures;

/// 場景內各項原始特徵的平均值，作為評分基準
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneIdealMetrics {
    pub brightness_ideal: f64,
    pub contrast_ideal: f64,
    pub sharpness_ideal: f64,
}

impl SceneIdealMetrics {
    /// 場景所有影格特徵到齊後計算一次；沒有任何影格時回傳 None
    #[must_use]
    pub fn aggregate<'a>(features: impl IntoIterator<Item = &'a FrameFeatures>) -> Option<Self> {
        let mut count = 0usize;
        let (mut brightness, mut contrast, mut sharpness) = (0.0, 0.0, 0.0);

        for f in features {
            count += 1;
            brightness += f.brightness;
            contrast += f.contrast;
            sharpness += f.sharpness;
        }

        if count == 0 {
            return None;
        }

        let n = count as f64;
        Some(Self {
            brightness_ideal: brightness / n,
            contrast_ideal: contrast / n,
            sharpness_ideal: sharpness / n,
        })
    }
}
