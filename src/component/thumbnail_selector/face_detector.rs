use anyhow::Result;
use image::RgbImage;
use log::debug;
use std::ops::Deref;

/// 人臉偵測：輸入影像，輸出出現人臉的機率
///
/// 實作必須可被多個執行緒同時呼叫。
pub trait FaceDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<f64>;

    /// 釋放模型等資源，每次流程結束時呼叫一次
    fn close(&self) {}
}

/// 不做偵測，一律回傳 0
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFaceDetector;

impl FaceDetector for NoFaceDetector {
    fn detect(&self, _image: &RgbImage) -> Result<f64> {
        Ok(0.0)
    }
}

/// 在一次流程期間持有偵測器，離開時（成功、錯誤或中斷）呼叫 `close`
pub struct ScopedFaceDetector<D: FaceDetector> {
    detector: D,
}

impl<D: FaceDetector> ScopedFaceDetector<D> {
    pub const fn new(detector: D) -> Self {
        Self { detector }
    }
}

impl<D: FaceDetector> Deref for ScopedFaceDetector<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.detector
    }
}

impl<D: FaceDetector> Drop for ScopedFaceDetector<D> {
    fn drop(&mut self) {
        debug!("釋放人臉偵測器");
        self.detector.close();
    }
}
