use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::config::RateConfig;
use crate::types::CallError;

/// Process-wide throttle for outbound RPC/REST calls.
///
/// One gate is constructed in `main` and passed by reference to every call
/// site, so independent callers cannot collectively race past the endpoint
/// quota. All state transitions happen on one sequential flow; every delay is
/// a tokio suspension point, never a blocking sleep.
///
/// `backoff` only grows by doubling after a rate-limit rejection (saturating
/// at `max_backoff`) and is restored to `initial_backoff` after any
/// successful call.
pub struct RateGate {
    last_request: Option<Instant>,
    min_interval: Duration,
    backoff: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RateGate {
    pub fn new(min_interval: Duration, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
            backoff: initial_backoff,
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_config(config: &RateConfig) -> Self {
        Self::new(
            config.min_interval(),
            config.initial_backoff(),
            config.max_backoff(),
        )
    }

    /// Current backoff duration.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Wait until at least `min_interval` has elapsed since the previous
    /// `acquire` returned. Never fails.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                debug!("rate gate: waiting {:.2}s", delay.as_secs_f64());
                sleep(delay).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Absorb a rate-limit rejection: sleep for the current backoff, then
    /// double it, saturating at the ceiling.
    pub async fn on_rate_limited(&mut self) {
        warn!(
            "rate limit hit, backing off for {}s",
            self.backoff.as_secs()
        );
        sleep(self.backoff).await;
        self.backoff = (self.backoff * 2).min(self.max_backoff);
    }

    /// Restore backoff to its initial value. Called after every successful
    /// call so a burst of rejections does not permanently inflate latency.
    pub fn reset_backoff(&mut self) {
        self.backoff = self.initial_backoff;
    }

    /// Run `thunk` under the gate with a bounded retry loop.
    ///
    /// This is the only place retry/backoff policy is decided; call sites
    /// never implement their own. Each attempt goes through `acquire`.
    /// Success resets the backoff. A rate-limit rejection backs off and
    /// retries while attempts remain, then returns `RateLimited`. Any other
    /// error is returned immediately without consuming a retry.
    pub async fn call<T, F, Fut>(&mut self, max_attempts: u32, mut thunk: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        for attempt in 1..=max_attempts {
            self.acquire().await;
            match thunk().await {
                Ok(payload) => {
                    self.reset_backoff();
                    return Ok(payload);
                }
                Err(CallError::RateLimited) => {
                    debug!("attempt {attempt}/{max_attempts} rate limited");
                    self.on_rate_limited().await;
                }
                Err(other) => return Err(other),
            }
        }
        Err(CallError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn gate(min_interval: u64, initial: u64, max: u64) -> RateGate {
        RateGate::new(
            Duration::from_secs(min_interval),
            Duration::from_secs(initial),
            Duration::from_secs(max),
        )
    }

    // ── acquire ────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let mut g = gate(5, 5, 60);
        let start = Instant::now();
        g.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_enforces_min_interval() {
        let mut g = gate(5, 5, 60);
        g.acquire().await;
        let start = Instant::now();
        g.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_only_remaining_interval() {
        let mut g = gate(10, 5, 60);
        g.acquire().await;
        tokio::time::advance(Duration::from_secs(4)).await;
        let start = Instant::now();
        g.acquire().await;
        // 4s already elapsed, so only 6s of waiting remain.
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_after_long_idle_is_immediate() {
        let mut g = gate(5, 5, 60);
        g.acquire().await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let start = Instant::now();
        g.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    // ── backoff ────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_and_saturates() {
        let mut g = gate(5, 5, 60);
        let expected = [10, 20, 40, 60, 60];
        for secs in expected {
            g.on_rate_limited().await;
            assert_eq!(g.backoff(), Duration::from_secs(secs));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_current_value_before_doubling() {
        let mut g = gate(5, 5, 60);
        let start = Instant::now();
        g.on_rate_limited().await;
        // Sleeps the pre-doubling value (5s), not the doubled one.
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_initial_backoff() {
        let mut g = gate(5, 5, 60);
        for _ in 0..4 {
            g.on_rate_limited().await;
        }
        assert_eq!(g.backoff(), Duration::from_secs(60));
        g.reset_backoff();
        assert_eq!(g.backoff(), Duration::from_secs(5));
    }

    // ── call wrapper ───────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn call_success_resets_backoff() {
        let mut g = gate(5, 5, 60);
        g.on_rate_limited().await;
        assert_eq!(g.backoff(), Duration::from_secs(10));

        let result: Result<u32, CallError> = g.call(3, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(g.backoff(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn call_retries_rate_limited_until_exhausted() {
        let mut g = gate(5, 5, 60);
        let calls = Cell::new(0u32);
        let result: Result<(), CallError> = g
            .call(3, || {
                calls.set(calls.get() + 1);
                async { Err(CallError::RateLimited) }
            })
            .await;
        assert!(matches!(result, Err(CallError::RateLimited)));
        assert_eq!(calls.get(), 3);
        // Three rejections: 5 → 10 → 20 → 40.
        assert_eq!(g.backoff(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn call_recovers_after_single_rejection() {
        let mut g = gate(5, 5, 60);
        let calls = Cell::new(0u32);
        let result = g
            .call(3, || {
                let n = calls.get() + 1;
                calls.set(n);
                async move {
                    if n == 1 {
                        Err(CallError::RateLimited)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
        assert_eq!(g.backoff(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn call_transient_error_does_not_retry() {
        let mut g = gate(5, 5, 60);
        let calls = Cell::new(0u32);
        let result: Result<(), CallError> = g
            .call(3, || {
                calls.set(calls.get() + 1);
                async { Err(CallError::Transient("connection reset".into())) }
            })
            .await;
        assert!(matches!(result, Err(CallError::Transient(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn call_attempts_are_spaced_by_min_interval() {
        let mut g = gate(10, 5, 60);
        let start = Instant::now();
        let _: Result<(), CallError> = g
            .call(2, || async { Err(CallError::RateLimited) })
            .await;
        // attempt 1 (t=0), backoff 5s, gate wait 5s more, attempt 2 (t=10),
        // backoff 10s → 20s total.
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }
}
