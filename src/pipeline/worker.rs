//! Classifier worker between an inbound and an outbound channel.

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use log::{debug, warn};
use serde::Serialize;

use crate::config::SentivoteConfig;
use crate::pipeline::buffer::RecentBuffer;
use crate::pipeline::driver::{ClassifiedText, SentimentPipeline};

/// Prefix of reshared texts.
pub const RESHARE_PREFIX: &str = "RT @";

/// Worker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Inbound items held while the worker is busy; older ones are dropped.
    pub buffer_capacity: usize,
    /// Skip texts starting with [`RESHARE_PREFIX`].
    pub skip_reshares: bool,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        WorkerOptions {
            buffer_capacity: 20,
            skip_reshares: true,
        }
    }
}

impl From<&SentivoteConfig> for WorkerOptions {
    fn from(config: &SentivoteConfig) -> Self {
        WorkerOptions {
            buffer_capacity: config.buffer_capacity,
            skip_reshares: config.skip_reshares,
        }
    }
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Items read from the inbound channel.
    pub received: usize,
    /// Reshares skipped.
    pub skipped: usize,
    /// Items evicted from the buffer before classification.
    pub dropped_backlog: usize,
    pub classified: usize,
    /// Classified below the confidence threshold.
    pub unsure: usize,
    pub forwarded: usize,
    /// Confident items lost because the outbound channel was full.
    pub dropped_full: usize,
    /// Items whose classification failed.
    pub errors: usize,
}

/// Whether `text` is a reshare of someone else's text.
pub fn is_reshare(text: &str) -> bool {
    text.trim_start().starts_with(RESHARE_PREFIX)
}

/// Classify items from `input` and forward the confident ones to `output`.
///
/// Everything waiting in `input` is drained into a [`RecentBuffer`] before
/// classifying, so when classification falls behind only the newest
/// `buffer_capacity` items are kept. Forwarding never blocks: when `output`
/// is full the item is dropped and counted. Returns once `input` is
/// disconnected and drained, or as soon as `output` is disconnected.
pub fn run_classifier(
    pipeline: &SentimentPipeline,
    input: Receiver<String>,
    output: Sender<ClassifiedText>,
    options: WorkerOptions,
) -> WorkerStats {
    let mut stats = WorkerStats::default();
    let mut buffer = RecentBuffer::new(options.buffer_capacity);

    // Blocks for the first item of every batch.
    while let Ok(first) = input.recv() {
        let mut disconnected = false;
        let mut next = Some(first);
        while let Some(text) = next.take() {
            stats.received += 1;
            if options.skip_reshares && is_reshare(&text) {
                stats.skipped += 1;
            } else if buffer.push(text).is_some() {
                stats.dropped_backlog += 1;
            }
            match input.try_recv() {
                Ok(text) => next = Some(text),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => disconnected = true,
            }
        }

        for text in buffer.drain() {
            match pipeline.classify_confident(text) {
                Ok(Some(classified)) => {
                    stats.classified += 1;
                    match output.try_send(classified) {
                        Ok(()) => stats.forwarded += 1,
                        Err(TrySendError::Full(_)) => stats.dropped_full += 1,
                        Err(TrySendError::Disconnected(_)) => {
                            debug!("Output disconnected; stopping classifier");
                            return stats;
                        }
                    }
                }
                Ok(None) => {
                    stats.classified += 1;
                    stats.unsure += 1;
                }
                Err(e) => {
                    warn!("Failed to classify item: {e}");
                    stats.errors += 1;
                }
            }
        }

        if disconnected {
            break;
        }
    }

    debug!("Classifier finished: {:?}", stats);
    stats
}
