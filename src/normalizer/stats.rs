//! Running conversion counters for one normalizer instance.

use serde::{Deserialize, Serialize};

/// Snapshot of conversion counters with derived averages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Records seen.
    pub total_processed: u64,
    /// Records accepted.
    pub successful: u64,
    /// Records rejected.
    pub failed: u64,
    /// Accepted records whose status was `warning`.
    pub warnings: u64,
    /// Mean completeness over every processed record.
    pub average_completeness: f64,
    /// Mean processing time in milliseconds over every processed record.
    pub average_processing_time_ms: f64,
}

/// Accumulator behind [`ConversionStats`].
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsAccumulator {
    total_processed: u64,
    successful: u64,
    failed: u64,
    warnings: u64,
    completeness_sum: f64,
    processing_time_ms_sum: f64,
}

impl StatsAccumulator {
    /// Record one processed record.
    pub(crate) fn record(&mut self, outcome: Outcome, completeness: f64, elapsed_ms: f64) {
        self.total_processed += 1;
        match outcome {
            Outcome::Accepted { warning } => {
                self.successful += 1;
                if warning {
                    self.warnings += 1;
                }
            }
            Outcome::Rejected => self.failed += 1,
        }
        self.completeness_sum += completeness;
        self.processing_time_ms_sum += elapsed_ms;
    }

    pub(crate) fn snapshot(&self) -> ConversionStats {
        let n = self.total_processed as f64;
        let avg = |sum: f64| if n > 0.0 { sum / n } else { 0.0 };
        ConversionStats {
            total_processed: self.total_processed,
            successful: self.successful,
            failed: self.failed,
            warnings: self.warnings,
            average_completeness: avg(self.completeness_sum),
            average_processing_time_ms: avg(self.processing_time_ms_sum),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// How a record ended up.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    Accepted { warning: bool },
    Rejected,
}
