//! Synthetic Workloads
//!
//! Stand-in operations for the runners: sleep, busy-wait or return at once,
//! with optional jitter and randomly injected failures.

use crate::config::{LaneConfig, WorkloadConfig, WorkloadKind};
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors produced by synthetic operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkloadError {
    /// Failure injected according to `failure_rate`
    #[error("Injected failure at lane {lane} iteration {iteration}")]
    Injected {
        /// Lane of the failing iteration
        lane: usize,
        /// Iteration index within the lane
        iteration: usize,
    },
}

/// A configured synthetic operation
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    kind: WorkloadKind,
    latency: Duration,
    jitter: Duration,
    failure_rate: f64,
}

impl Workload {
    /// Build a workload
    pub fn new(
        kind: WorkloadKind,
        latency: Duration,
        jitter: Duration,
        failure_rate: f64,
    ) -> anyhow::Result<Self> {
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(anyhow::anyhow!(
                "failure_rate must be within [0, 1], got {}",
                failure_rate
            ));
        }
        Ok(Self {
            kind,
            latency,
            jitter,
            failure_rate,
        })
    }

    /// Build a workload from the `[workload]` section
    pub fn from_config(config: &WorkloadConfig) -> anyhow::Result<Self> {
        Self::new(
            config.kind,
            LaneConfig::parse_duration(&config.latency)?,
            LaneConfig::parse_duration(&config.jitter)?,
            config.failure_rate,
        )
    }

    /// Operation kind
    pub fn kind(&self) -> WorkloadKind {
        self.kind
    }

    /// Short description, e.g. `sleep 1ms ±200us, 5% failures`
    pub fn describe(&self) -> String {
        let mut text = self.kind.to_string();
        if self.kind != WorkloadKind::Noop {
            text.push_str(&format!(" {:?}", self.latency));
            if !self.jitter.is_zero() {
                text.push_str(&format!(" ±{:?}", self.jitter));
            }
        }
        if self.failure_rate > 0.0 {
            text.push_str(&format!(", {}% failures", self.failure_rate * 100.0));
        }
        text
    }

    /// Draw this iteration's latency and whether it fails
    fn draw(&self) -> (Duration, bool) {
        let mut rng = rand::thread_rng();

        let latency = if self.jitter.is_zero() {
            self.latency
        } else {
            let jitter = self.jitter.as_nanos() as u64;
            let base = self.latency.as_nanos() as u64;
            let offset = rng.gen_range(0..=jitter.saturating_mul(2));
            Duration::from_nanos(base.saturating_add(offset).saturating_sub(jitter))
        };

        let fails = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
        (latency, fails)
    }

    /// Blocking operation: occupies the calling thread for the drawn latency
    pub fn execute(&self, lane: usize, iteration: usize) -> Result<(), WorkloadError> {
        let (latency, fails) = self.draw();

        match self.kind {
            WorkloadKind::Noop => {}
            WorkloadKind::Sleep => std::thread::sleep(latency),
            WorkloadKind::Spin => spin_for(latency),
        }

        if fails {
            Err(WorkloadError::Injected { lane, iteration })
        } else {
            Ok(())
        }
    }

    /// Non-blocking operation: resolves after the drawn latency
    ///
    /// `spin` still busy-waits on the runtime thread that polls it.
    pub fn execute_async(
        &self,
        lane: usize,
        iteration: usize,
    ) -> impl Future<Output = Result<(), WorkloadError>> + Send + use<> {
        let (latency, fails) = self.draw();
        let kind = self.kind;

        async move {
            match kind {
                WorkloadKind::Noop => {}
                WorkloadKind::Sleep => tokio::time::sleep(latency).await,
                WorkloadKind::Spin => spin_for(latency),
            }

            if fails {
                Err(WorkloadError::Injected { lane, iteration })
            } else {
                Ok(())
            }
        }
    }
}

fn spin_for(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(kind: WorkloadKind, latency_ms: u64, failure_rate: f64) -> Workload {
        Workload::new(
            kind,
            Duration::from_millis(latency_ms),
            Duration::ZERO,
            failure_rate,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_failure_rate() {
        assert!(Workload::new(WorkloadKind::Noop, Duration::ZERO, Duration::ZERO, 1.5).is_err());
        assert!(Workload::new(WorkloadKind::Noop, Duration::ZERO, Duration::ZERO, -0.1).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = WorkloadConfig {
            kind: WorkloadKind::Spin,
            latency: "2ms".to_string(),
            jitter: "100us".to_string(),
            failure_rate: 0.5,
        };
        let workload = Workload::from_config(&config).unwrap();
        assert_eq!(workload.kind(), WorkloadKind::Spin);
        assert_eq!(workload.describe(), "spin 2ms ±100µs, 50% failures");
    }

    #[test]
    fn test_sleep_takes_latency() {
        let w = workload(WorkloadKind::Sleep, 5, 0.0);
        let start = Instant::now();
        assert!(w.execute(0, 0).is_ok());
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn test_spin_takes_latency() {
        let w = workload(WorkloadKind::Spin, 2, 0.0);
        let start = Instant::now();
        assert!(w.execute(0, 0).is_ok());
        assert!(start.elapsed() >= Duration::from_millis(2));
    }

    #[test]
    fn test_always_fails() {
        let w = workload(WorkloadKind::Noop, 0, 1.0);
        assert_eq!(
            w.execute(3, 9),
            Err(WorkloadError::Injected {
                lane: 3,
                iteration: 9
            })
        );
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let w = Workload::new(
            WorkloadKind::Noop,
            Duration::from_millis(10),
            Duration::from_millis(2),
            0.0,
        )
        .unwrap();
        for _ in 0..1000 {
            let (latency, fails) = w.draw();
            assert!(!fails);
            assert!(latency >= Duration::from_millis(8));
            assert!(latency <= Duration::from_millis(12));
        }
    }

    #[test]
    fn test_huge_jitter_does_not_overflow() {
        let w = Workload::new(
            WorkloadKind::Noop,
            Duration::from_secs(u64::MAX / 1_000_000_000),
            Duration::from_nanos(u64::MAX),
            0.0,
        )
        .unwrap();
        for _ in 0..100 {
            let (latency, _) = w.draw();
            assert!(latency <= Duration::from_nanos(u64::MAX));
        }
    }

    #[tokio::test]
    async fn test_async_sleep() {
        let w = workload(WorkloadKind::Sleep, 5, 0.0);
        let start = Instant::now();
        assert!(w.execute_async(0, 0).await.is_ok());
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_async_failure() {
        let w = workload(WorkloadKind::Noop, 0, 1.0);
        assert!(w.execute_async(1, 2).await.is_err());
    }
}
