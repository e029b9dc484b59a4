mod cpu_monitor;
mod feature_extractor;
mod ffprobe_info;
mod frame_source;
mod histogram;
mod task_scheduler;

pub use cpu_monitor::{hardware_parallelism, resolve_pool_size};
pub use feature_extractor::{brightness, contrast, downscale, motion, sharpness};
pub use ffprobe_info::{
    FfprobeMetadataProvider, MetadataProvider, VideoMetadata, sampling_interval_ms,
};
pub use frame_source::{FfmpegFrameSource, ImageSequenceSource, SourceFrame, SourceItem};
pub use histogram::{compute_histogram, histogram_distance};
pub use task_scheduler::{TaskOutcome, run_bounded};
