//! Sample Generator Implementation

use rand::Rng;
use std::time::Duration;
use storage::{InsertOutcome, Repository, StorageError};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Configuration for the sample generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Time between samples (default: 10s)
    pub interval: Duration,
    /// Water height range (m)
    pub height_range: (f64, f64),
    /// Flow rate range (m³/s)
    pub flow_range: (f64, f64),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            height_range: (1.0, 10.0),
            flow_range: (5.0, 15.0),
        }
    }
}

/// Periodically inserts random readings stamped with the current time
pub struct SampleGenerator {
    config: GeneratorConfig,
    repository: Repository,
}

impl SampleGenerator {
    /// Create a new sample generator
    pub fn new(config: GeneratorConfig, repository: Repository) -> Self {
        info!("Sample generator created, interval {:?}", config.interval);
        Self { config, repository }
    }

    /// Draw one (height, flow) pair, rounded to centimetre precision
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let (h_min, h_max) = self.config.height_range;
        let (f_min, f_max) = self.config.flow_range;
        let height = round2(rng.gen_range(h_min..=h_max));
        let flow = round2(rng.gen_range(f_min..=f_max));
        (height, flow)
    }

    /// Insert one sample at the current time
    pub async fn tick(&self) -> Result<InsertOutcome, StorageError> {
        let (height, flow) = self.sample(&mut rand::thread_rng());
        let outcome = self.repository.insert(height, flow, None).await?;

        match outcome {
            InsertOutcome::Inserted { id } => {
                debug!(id, height, flow, "Sample generated");
                metrics::counter!("readings_inserted_total", "source" => "generator").increment(1);
            }
            InsertOutcome::Duplicate => {
                debug!("Sample for this second already exists");
                metrics::counter!("readings_duplicate_total", "source" => "generator").increment(1);
            }
        }
        Ok(outcome)
    }

    /// Run until `shutdown` flips to `true`.
    ///
    /// A failed insert is logged and the loop continues; the next tick is the
    /// only retry.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting sample generator");

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "Sample insert failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sample generator stopped");
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
