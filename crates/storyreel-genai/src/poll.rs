//! Bounded fixed-interval poll loop for video operations.
//!
//! The loop drives `generating -> {video-ready, error}`: one status call per
//! interval, a hard attempt budget of ten minutes, and progress estimated
//! from attempts used, capped at 95% until the operation reports done.
//! Transient status-call failures (transport errors, 5xx, 429) are retried a
//! small number of consecutive times without consuming the attempt budget;
//! anything else ends the loop immediately.

use std::time::Duration;

use tracing::{info, warn};

use storyreel_models::VideoOperationStatus;

use crate::error::{GenAiError, GenAiResult};

/// Seam over the operation-status capability so the loop can be driven
/// against stubs in tests.
pub trait VideoStatusSource {
    fn check(
        &self,
        operation_name: &str,
    ) -> impl std::future::Future<Output = GenAiResult<VideoOperationStatus>> + Send;
}

impl VideoStatusSource for crate::client::GenAiClient {
    async fn check(&self, operation_name: &str) -> GenAiResult<VideoOperationStatus> {
        self.get_videos_operation(operation_name).await
    }
}

/// Poll loop parameters.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Wall-clock delay between status calls
    pub interval: Duration,
    /// Hard budget of not-done polls before timing out
    pub max_attempts: u32,
    /// Consecutive transient failures tolerated before giving up
    pub transient_failure_budget: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 60,
            transient_failure_budget: 3,
        }
    }
}

/// Terminal result of a poll loop.
#[derive(Debug)]
pub enum PollOutcome {
    /// The operation completed; the asset URL may be absent
    VideoReady {
        video_url: Option<String>,
        attempts: u32,
    },
    /// The attempt budget ran out before completion
    TimedOut { attempts: u32 },
    /// A status call failed fatally (or transient failures exceeded budget)
    Failed { error: GenAiError, attempts: u32 },
}

/// Progress estimate for a given number of used attempts, in percent.
///
/// `min(attempts/max, 0.95) * 100` — strictly non-decreasing and capped at
/// 95 until the operation reports done.
pub fn progress_percent(attempts: u32, max_attempts: u32) -> f64 {
    let ratio = f64::from(attempts) / f64::from(max_attempts.max(1));
    ratio.min(0.95) * 100.0
}

/// Fixed-interval poller over a [`VideoStatusSource`].
pub struct VideoPoller<S: VideoStatusSource> {
    source: S,
    config: PollConfig,
}

impl<S: VideoStatusSource> VideoPoller<S> {
    /// Create a poller with the given parameters.
    pub fn new(source: S, config: PollConfig) -> Self {
        Self { source, config }
    }

    /// Create a poller with the default 10s/60-attempt parameters.
    pub fn with_defaults(source: S) -> Self {
        Self::new(source, PollConfig::default())
    }

    /// Poll until the operation is terminal, reporting progress after each
    /// not-done response.
    pub async fn poll_with_progress(
        &self,
        operation_name: &str,
        mut on_progress: impl FnMut(f64),
    ) -> PollOutcome {
        let mut attempts: u32 = 0;
        let mut consecutive_failures: u32 = 0;

        loop {
            match self.source.check(operation_name).await {
                Ok(status) if status.done => {
                    info!(operation = %operation_name, attempts, "Video ready");
                    on_progress(100.0);
                    return PollOutcome::VideoReady {
                        video_url: status.video_url,
                        attempts,
                    };
                }
                Ok(_) => {
                    consecutive_failures = 0;
                    attempts += 1;
                    on_progress(progress_percent(attempts, self.config.max_attempts));

                    if attempts >= self.config.max_attempts {
                        warn!(operation = %operation_name, attempts, "Video poll budget exhausted");
                        return PollOutcome::TimedOut { attempts };
                    }
                }
                Err(e) if e.is_transient() && consecutive_failures < self.config.transient_failure_budget => {
                    consecutive_failures += 1;
                    warn!(
                        operation = %operation_name,
                        consecutive_failures,
                        error = %e,
                        "Transient poll failure, retrying"
                    );
                }
                Err(e) => {
                    warn!(operation = %operation_name, attempts, error = %e, "Video poll failed");
                    return PollOutcome::Failed { error: e, attempts };
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Poll until terminal, discarding progress reports.
    pub async fn poll_until_done(&self, operation_name: &str) -> PollOutcome {
        self.poll_with_progress(operation_name, |_| {}).await
    }
}
