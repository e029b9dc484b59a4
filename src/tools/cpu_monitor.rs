use log::debug;
use std::num::NonZeroUsize;
use std::thread;
use sysinfo::System;

/// 邏輯 CPU 數量，作為預設的工作執行緒上限
#[must_use]
pub fn hardware_parallelism() -> usize {
    let mut system = System::new();
    system.refresh_cpu_all();
    let cpus = system.cpus().len();

    if cpus > 0 {
        debug!("偵測到 {cpus} 個邏輯 CPU");
        return cpus;
    }

    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// 未指定時使用硬體並行數
#[must_use]
pub fn resolve_pool_size(configured: Option<usize>) -> usize {
    configured.unwrap_or_else(hardware_parallelism).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardware_parallelism_is_positive() {
        assert!(hardware_parallelism() >= 1);
    }

    #[test]
    fn test_resolve_pool_size() {
        assert_eq!(resolve_pool_size(Some(3)), 3);
        assert!(resolve_pool_size(None) >= 1);
    }
}
