use thiserror::Error;

/// 錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 輸入資料不合法（空序列、直方圖維度不一致、空場景）
    Input,
    /// 單一影格特徵擷取失敗，僅排除該影格
    Extraction,
    /// 外部元件（人臉偵測、影格來源）對單一影格失敗
    Collaborator,
    /// 設定錯誤，在任何工作開始前拒絕
    FatalConfig,
    /// 收到中斷信號
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("影格序列為空")]
    EmptyFrameSequence,

    #[error("直方圖維度不一致: {left} != {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("場景 {scene_index} 沒有任何影格")]
    EmptyScene { scene_index: usize },

    #[error("影格 {frame_index} 特徵擷取失敗: {reason}")]
    Extraction { frame_index: usize, reason: String },

    #[error("外部元件處理影格 {frame_index} 失敗: {reason}")]
    Collaborator { frame_index: usize, reason: String },

    #[error("影格來源在 {timestamp_ms}ms 無法提供影格: {reason}")]
    SourceFrame { timestamp_ms: u64, reason: String },

    #[error("設定錯誤: {0}")]
    Config(String),

    #[error("操作已取消")]
    Cancelled,
}

impl ThumbnailError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyFrameSequence | Self::DimensionMismatch { .. } | Self::EmptyScene { .. } => {
                ErrorKind::Input
            }
            Self::Extraction { .. } => ErrorKind::Extraction,
            Self::Collaborator { .. } | Self::SourceFrame { .. } => ErrorKind::Collaborator,
            Self::Config(_) => ErrorKind::FatalConfig,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;
