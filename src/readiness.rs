//! Startup readiness gate.
//!
//! Probes the backend until it answers, sleeping a linearly growing delay
//! between attempts. Serving must not begin before this succeeds.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::GatewayError;
use crate::metrics;

/// Retry budget and backoff curve for the readiness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Probes made before giving up.
    pub max_attempts: u32,
    /// Delay step; the wait after failed attempt `n` is `n * base_delay`.
    pub base_delay: Duration,
    /// Upper bound on a single wait.
    pub max_delay: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReadinessPolicy {
    /// Create from config values.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.readiness_max_attempts,
            base_delay: Duration::from_millis(config.readiness_base_delay_ms),
            ..Default::default()
        }
    }

    /// Wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.max(1))
            .min(self.max_delay)
    }
}

/// Run `probe` until it returns true or the budget is spent.
///
/// Returns the number of attempts it took.
pub async fn wait_until_ready<F, Fut>(
    policy: &ReadinessPolicy,
    mut probe: F,
) -> Result<u32, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.max_attempts {
        let ready = probe().await;
        metrics::inc_readiness_probe(ready);

        if ready {
            info!(attempt, "Backend is ready");
            return Ok(attempt);
        }

        if attempt == policy.max_attempts {
            break;
        }

        let delay = policy.delay_after(attempt);
        warn!(
            attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Backend not ready, retrying"
        );
        tokio::time::sleep(delay).await;
    }

    Err(GatewayError::BackendUnavailable {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[test]
    fn backoff_is_non_decreasing_and_capped() {
        let policy = ReadinessPolicy::default();
        let delays: Vec<Duration> = (1..=policy.max_attempts)
            .map(|n| policy.delay_after(n))
            .collect();

        assert_eq!(delays[0], Duration::from_secs(2));
        assert_eq!(delays[1], Duration::from_secs(4));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= policy.max_delay));
        assert_eq!(policy.delay_after(100), Duration::from_secs(30));
    }

    #[test]
    fn policy_reads_config() {
        let mut config = Config::with_backend("http://localhost:9200");
        config.readiness_max_attempts = 3;
        config.readiness_base_delay_ms = 50;

        let policy = ReadinessPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_healthy_probe() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let attempts = wait_until_ready(&ReadinessPolicy::default(), || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { n == 3 }
        })
        .await
        .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_budget_with_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let policy = ReadinessPolicy::default();
        let start = Instant::now();

        let result = wait_until_ready(&policy, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { false }
        })
        .await;

        assert!(matches!(
            result,
            Err(GatewayError::BackendUnavailable { attempts: 10 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 10);

        // No sleep after the final attempt.
        let expected: Duration = (1..policy.max_attempts).map(|n| policy.delay_after(n)).sum();
        assert!(start.elapsed() >= expected);
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_is_immediate() {
        let start = Instant::now();
        let attempts = wait_until_ready(&ReadinessPolicy::default(), || async { true })
            .await
            .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
