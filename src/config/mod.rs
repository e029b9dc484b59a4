pub mod load;
pub mod save;
pub mod types;

pub use save::save_settings;
pub use types::{
    DEFAULT_ANALYSIS_WIDTH, DEFAULT_HISTOGRAM_BINS, DEFAULT_SAMPLE_WIDTH, DEFAULT_TOP_N,
    IdealDefaults, SETTINGS_FILE_NAME, ScoringWeights, ThumbnailSettings, WEIGHT_COUNT,
    validate_top_n,
};
