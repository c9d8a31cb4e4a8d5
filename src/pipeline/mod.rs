//! Streaming classification: thresholded ensemble decisions, a bounded
//! classifier worker and rolling trend statistics.

pub mod buffer;
pub mod driver;
pub mod trend;
pub mod worker;

pub use buffer::RecentBuffer;
pub use driver::{
    Classification, ClassifiedText, SentimentPipeline, Verdict, check_threshold,
};
pub use trend::{SentimentTrend, Throttle, TrendSnapshot, is_stop_word};
pub use worker::{WorkerOptions, WorkerStats, is_reshare, run_classifier};
