//! Periodic extraction runs
//!
//! The pipeline itself is blocking. Each run is moved onto tokio's blocking
//! pool and awaited before the next tick is taken, so two runs never overlap
//! and a slow run simply delays (or skips) the following ticks.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;

use crate::config::ExtractorConfig;

/// One blocking unit of scheduled work
pub type Job = dyn Fn() -> anyhow::Result<()> + Send + Sync;

pub struct RunScheduler {
    period: Duration,
    job: Arc<Job>,
}

impl RunScheduler {
    pub fn new(period: Duration, job: Arc<Job>) -> Self {
        Self { period, job }
    }

    /// Scheduler running the full extract, export and publish pipeline.
    pub fn for_config(config: ExtractorConfig) -> Self {
        let period = config.period;
        Self::new(period, Arc::new(move || crate::run_pipeline(&config)))
    }

    /// Run immediately, then once per period, forever.
    pub async fn run(self) {
        tracing::info!(
            "Scheduling extraction every {:.1} h",
            self.period.as_secs_f64() / 3600.0
        );

        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            self.run_once().await;
            tracing::info!("Waiting for next iteration");
        }
    }

    async fn run_once(&self) {
        let job = self.job.clone();
        let started = Instant::now();

        match tokio::task::spawn_blocking(move || job()).await {
            Ok(Ok(())) => {
                tracing::info!("Scraping done in {:.1?}", started.elapsed());
            }
            Ok(Err(e)) => {
                tracing::error!("Scraping failed after {:.1?}: {:#}", started.elapsed(), e);
            }
            Err(e) => {
                tracing::error!("Scraping task aborted: {}", e);
            }
        }
    }
}
