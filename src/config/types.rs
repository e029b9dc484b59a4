use crate::error::{Result, ThumbnailError};
use serde::{Deserialize, Serialize};

/// 設定檔名稱（位於目前工作目錄）
pub const SETTINGS_FILE_NAME: &str = "thumbnail_settings.json";

pub const DEFAULT_HISTOGRAM_BINS: usize = 8;
pub const DEFAULT_ANALYSIS_WIDTH: u32 = 320;
/// 取樣後保留的最大寬度，限制整段影片常駐記憶體的大小
pub const DEFAULT_SAMPLE_WIDTH: u32 = 640;
pub const DEFAULT_TOP_N: usize = 5;

/// 權重數量：銳利度、亮度、對比、動態、人臉
pub const WEIGHT_COUNT: usize = 5;

/// 總分的各項權重
///
/// 預設值加總為 1.10，不做正規化
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub sharpness: f64,
    pub brightness: f64,
    pub contrast: f64,
    pub motion: f64,
    pub face: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sharpness: 0.30,
            brightness: 0.20,
            contrast: 0.10,
            motion: 0.10,
            face: 0.40,
        }
    }
}

impl ScoringWeights {
    /// 依序為 sharpness, brightness, contrast, motion, face
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        let [sharpness, brightness, contrast, motion, face] = values else {
            return Err(ThumbnailError::config(format!(
                "權重數量錯誤: 需要 {WEIGHT_COUNT} 個，收到 {} 個",
                values.len()
            )));
        };

        Ok(Self {
            sharpness: *sharpness,
            brightness: *brightness,
            contrast: *contrast,
            motion: *motion,
            face: *face,
        })
    }

    #[must_use]
    pub const fn as_array(&self) -> [f64; WEIGHT_COUNT] {
        [
            self.sharpness,
            self.brightness,
            self.contrast,
            self.motion,
            self.face,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(w) = self.as_array().iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(ThumbnailError::config(format!("權重必須為非負有限值: {w}")));
        }
        Ok(())
    }
}

/// 沒有場景基準時使用的理想值，以及各項最大距離
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdealDefaults {
    pub brightness_ideal: f64,
    pub contrast_ideal: f64,
    pub sharpness_ideal: f64,
    pub max_brightness_distance: f64,
    pub max_contrast_distance: f64,
    pub max_sharpness_distance: f64,
}

impl Default for IdealDefaults {
    fn default() -> Self {
        Self {
            brightness_ideal: 0.5,
            contrast_ideal: 0.38,
            sharpness_ideal: 0.008,
            max_brightness_distance: 0.5,
            max_contrast_distance: 0.5,
            max_sharpness_distance: 0.01,
        }
    }
}

impl IdealDefaults {
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("max_brightness_distance", self.max_brightness_distance),
            ("max_contrast_distance", self.max_contrast_distance),
            ("max_sharpness_distance", self.max_sharpness_distance),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(ThumbnailError::config(format!("{name} 必須大於 0: {value}")));
            }
        }
        Ok(())
    }
}

/// 縮圖挑選設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    pub weights: ScoringWeights,
    pub ideals: IdealDefaults,
    /// 每個色彩通道的直方圖區間數
    pub histogram_bins: usize,
    /// 特徵擷取的並行數，None 表示使用硬體並行數
    pub pool_size: Option<usize>,
    /// 人臉偵測的並行數，None 表示與 `pool_size` 相同
    pub face_pool_size: Option<usize>,
    /// 取樣時縮放到的最大寬度，人臉偵測使用這個尺寸
    pub sample_width: u32,
    /// 分析前縮放到的寬度
    pub analysis_width: u32,
    pub top_n: usize,
    /// 取樣間隔（毫秒），None 表示依影片長度自動決定
    pub sampling_interval_ms: Option<u64>,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            ideals: IdealDefaults::default(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            pool_size: None,
            face_pool_size: None,
            sample_width: DEFAULT_SAMPLE_WIDTH,
            analysis_width: DEFAULT_ANALYSIS_WIDTH,
            top_n: DEFAULT_TOP_N,
            sampling_interval_ms: None,
        }
    }
}

impl ThumbnailSettings {
    /// 在任何工作開始前檢查設定
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        self.ideals.validate()?;

        if self.histogram_bins == 0 {
            return Err(ThumbnailError::config("histogram_bins 必須大於 0"));
        }
        if self.pool_size == Some(0) {
            return Err(ThumbnailError::config("pool_size 必須大於 0"));
        }
        if self.face_pool_size == Some(0) {
            return Err(ThumbnailError::config("face_pool_size 必須大於 0"));
        }
        if self.sample_width == 0 {
            return Err(ThumbnailError::config("sample_width 必須大於 0"));
        }
        if self.analysis_width == 0 {
            return Err(ThumbnailError::config("analysis_width 必須大於 0"));
        }
        if self.sampling_interval_ms == Some(0) {
            return Err(ThumbnailError::config("sampling_interval_ms 必須大於 0"));
        }
        Ok(())
    }
}

/// 將使用者輸入的數量轉為 top-N，負值視為設定錯誤
pub fn validate_top_n(value: i64) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| ThumbnailError::config(format!("top_n 不可為負數: {value}")))
}
