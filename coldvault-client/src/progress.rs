//! Upload progress notifications

use std::time::Instant;

use tracing::info;

/// Snapshot emitted after each acknowledged part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartProgress {
    /// Parts acknowledged so far (1-based)
    pub current: u64,
    pub total: u64,
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl PartProgress {
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        self.bytes_sent as f64 / self.total_bytes as f64
    }
}

/// Sink for per-part progress; must not block
pub trait ProgressObserver: Send + Sync {
    fn part_uploaded(&self, progress: &PartProgress);
}

/// Discards every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn part_uploaded(&self, _progress: &PartProgress) {}
}

/// Logs one line per part with the average throughput so far
#[derive(Debug)]
pub struct LogProgress {
    started: Instant,
}

impl LogProgress {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for LogProgress {
    fn part_uploaded(&self, progress: &PartProgress) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let mib_per_sec = if elapsed > 0.0 {
            progress.bytes_sent as f64 / (1024.0 * 1024.0) / elapsed
        } else {
            0.0
        };

        info!(
            part = progress.current,
            parts = progress.total,
            bytes_sent = progress.bytes_sent,
            "Upload ({}/{}) {:.1}% at {:.2} MiB/s",
            progress.current,
            progress.total,
            progress.fraction() * 100.0,
            mib_per_sec
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let p = PartProgress {
            current: 1,
            total: 4,
            bytes_sent: 256,
            total_bytes: 1024,
        };
        assert!((p.fraction() - 0.25).abs() < f64::EPSILON);

        let empty = PartProgress {
            current: 0,
            total: 0,
            bytes_sent: 0,
            total_bytes: 0,
        };
        assert!((empty.fraction() - 1.0).abs() < f64::EPSILON);
    }
}
