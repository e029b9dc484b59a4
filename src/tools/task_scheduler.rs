use crate::error::{Result, ThumbnailError};
use log::{debug, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc};
use std::thread;

/// 單一任務的結果；任務 panic 時為 panic 訊息
pub type TaskOutcome<R> = std::result::Result<R, String>;

/// 以固定數量的工作執行緒處理任務
///
/// 派送端使用容量為 0 的同步通道，只有在某個工作執行緒空閒並等待時
/// 才會交出下一個項目，因此同時執行中的任務永遠不超過 `workers` 個。
///
/// 回傳 `(輸入位置, 結果)`，順序為完成順序，呼叫端需自行重新排序。
/// 任務 panic 只影響該項目，工作執行緒會繼續處理後續項目。
/// 收到中斷信號後停止派送，等待執行中的任務結束並回傳 `Cancelled`。
pub fn run_bounded<T, R, F>(
    items: Vec<T>,
    workers: usize,
    shutdown_signal: &AtomicBool,
    task: F,
) -> Result<Vec<(usize, TaskOutcome<R>)>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let total = items.len();
    let workers = workers.clamp(1, total);
    let (job_tx, job_rx) = mpsc::sync_channel::<(usize, T)>(0);
    let job_rx = Mutex::new(job_rx);
    let (result_tx, result_rx) = mpsc::channel::<(usize, TaskOutcome<R>)>();
    let mut cancelled = false;

    debug!("啟動 {workers} 個工作執行緒處理 {total} 個任務");

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = &job_rx;
            let task = &task;
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                loop {
                    let job = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    let Ok((position, item)) = job else {
                        break;
                    };
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(item)))
                        .map_err(|payload| panic_message(payload.as_ref()));
                    if let Err(message) = &outcome {
                        warn!("任務 {position} 中止: {message}");
                    }
                    if result_tx.send((position, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for (position, item) in items.into_iter().enumerate() {
            if shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，停止派送任務 ({position}/{total})");
                cancelled = true;
                break;
            }
            if job_tx.send((position, item)).is_err() {
                break;
            }
        }
        drop(job_tx);
    });

    if cancelled {
        return Err(ThumbnailError::Cancelled);
    }

    Ok(result_rx.into_iter().collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "未知的 panic".to_string()
    }
}
