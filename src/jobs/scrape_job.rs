use crate::database::connection::{run_blocking, DatabaseError};
use crate::database::models::{JobStatus, NewScrapeSettings, ScrapeSettings, SCRAPE_SETTINGS_KEY};
use crate::database::repositories::SettingsRepository;
use crate::jobs::registry::JobRegistry;
use crate::market_data::{transform, FetchOutcome, MarketDataService, QuoteRequest, QuoteSource};
use crate::metrics::{ScrapeStats, ScrapeStatsSnapshot};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Name of the single scrape job in the registry
pub const SCRAPER_JOB_NAME: &str = "scraper";

/// Scrape job control errors
#[derive(Debug, Error)]
pub enum ScrapeJobError {
    #[error("Invalid interval: {0} (expected a positive number of milliseconds)")]
    InvalidInterval(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

/// Result of one fetch → transform → insert run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Stored { symbols: usize, ticks: usize },
    Empty,
    FetchFailed(String),
    /// Malformed upstream values, nothing was written
    TransformFailed(String),
    StorageFailed(String),
}

/// One scrape cycle: fetch quotes, normalize them, replace-by-range insert
pub struct ScrapePipeline {
    source: Arc<dyn QuoteSource>,
    request: QuoteRequest,
    market_data: MarketDataService,
    stats: Arc<ScrapeStats>,
}

impl ScrapePipeline {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        request: QuoteRequest,
        market_data: MarketDataService,
        stats: Arc<ScrapeStats>,
    ) -> Self {
        Self {
            source,
            request,
            market_data,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<ScrapeStats> {
        &self.stats
    }

    /// Run a single cycle, every outcome is reported to the stats collector
    pub async fn run_cycle(&self) -> CycleOutcome {
        let start = std::time::Instant::now();

        let raw = match self.source.fetch_quotes(&self.request).await {
            FetchOutcome::Fetched(raw) => raw,
            FetchOutcome::Empty => {
                tracing::info!("Quote provider returned no samples");
                self.stats.record_empty();
                return CycleOutcome::Empty;
            }
            FetchOutcome::Failed(e) => {
                tracing::error!("❌ Failed to fetch quotes: {}", e);
                self.stats.record_fetch_failure(&e.to_string());
                return CycleOutcome::FetchFailed(e.to_string());
            }
        };

        let ticks = match transform(&raw) {
            Ok(ticks) => ticks,
            Err(e) => {
                tracing::error!("❌ Failed to transform quotes: {}", e);
                self.stats.record_transform_failure(&e.to_string());
                return CycleOutcome::TransformFailed(e.to_string());
            }
        };

        match self.market_data.insert(ticks).await {
            Ok(reports) => {
                let inserted: usize = reports.iter().map(|r| r.inserted).sum();
                tracing::info!(
                    "📥 Stored {} tick(s) for {} symbol(s) in {:.2}ms",
                    inserted,
                    reports.len(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                self.stats.record_stored(inserted);
                CycleOutcome::Stored {
                    symbols: reports.len(),
                    ticks: inserted,
                }
            }
            Err(e) => {
                tracing::error!("❌ Failed to store quotes: {}", e);
                self.stats.record_storage_failure(&e.to_string());
                CycleOutcome::StorageFailed(e.to_string())
            }
        }
    }
}

/// Result of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Liveness plus persisted settings of the scrape job
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScrapeJobStatus {
    /// Liveness from the in-process registry
    pub status: JobStatus,
    /// Persisted settings, may still say running after a restart
    pub settings: Option<ScrapeSettings>,
    pub stats: ScrapeStatsSnapshot,
}

/// Start/stop/status control of the single scrape job
pub struct ScrapeJobController {
    registry: Arc<JobRegistry>,
    settings: Arc<dyn SettingsRepository>,
    pipeline: Arc<ScrapePipeline>,
}

impl ScrapeJobController {
    pub fn new(
        registry: Arc<JobRegistry>,
        settings: Arc<dyn SettingsRepository>,
        pipeline: Arc<ScrapePipeline>,
    ) -> Self {
        Self {
            registry,
            settings,
            pipeline,
        }
    }

    /// (Re)start the scrape job every `interval_ms`
    ///
    /// An existing settings record, running or not, resets the job: the
    /// in-process job is cancelled and the record replaced.
    pub async fn start(&self, interval_ms: i64) -> Result<ScrapeSettings, ScrapeJobError> {
        if interval_ms <= 0 {
            return Err(ScrapeJobError::InvalidInterval(interval_ms));
        }

        let settings = Arc::clone(&self.settings);
        let existing = run_blocking(move || settings.find(SCRAPE_SETTINGS_KEY)).await?;

        if existing.is_some() {
            self.registry.cancel(SCRAPER_JOB_NAME);
            let settings = Arc::clone(&self.settings);
            run_blocking(move || settings.delete(SCRAPE_SETTINGS_KEY)).await?;
        }

        let pipeline = Arc::clone(&self.pipeline);
        self.registry.register(
            SCRAPER_JOB_NAME,
            Duration::from_millis(interval_ms as u64),
            move || {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    tracing::debug!("🕐 Scrape job triggered");
                    pipeline.run_cycle().await;
                }
            },
        );

        let settings = Arc::clone(&self.settings);
        let record = run_blocking(move || {
            settings.insert(NewScrapeSettings::running(interval_ms, Utc::now()))
        })
        .await?;

        tracing::info!("✅ Automated scrape started at {}ms interval", interval_ms);

        Ok(record)
    }

    /// Stop the scrape job if this process is running it
    ///
    /// Only the registry decides liveness; a record left "running" by a
    /// previous process is not touched.
    pub async fn stop(&self) -> Result<StopOutcome, ScrapeJobError> {
        if self.registry.cancel(SCRAPER_JOB_NAME).is_none() {
            tracing::info!("Automated scrape is not running");
            return Ok(StopOutcome::NotRunning);
        }

        let settings = Arc::clone(&self.settings);
        run_blocking(move || settings.mark_stopped(SCRAPE_SETTINGS_KEY, Utc::now())).await?;

        tracing::info!("Automated scrape stopped");

        Ok(StopOutcome::Stopped)
    }

    pub async fn status(&self) -> Result<ScrapeJobStatus, ScrapeJobError> {
        let settings = Arc::clone(&self.settings);
        let record = run_blocking(move || settings.find(SCRAPE_SETTINGS_KEY)).await?;

        let status = if self.registry.is_registered(SCRAPER_JOB_NAME) {
            JobStatus::Running
        } else {
            JobStatus::Stopped
        };

        Ok(ScrapeJobStatus {
            status,
            settings: record,
            stats: self.pipeline.stats().snapshot(),
        })
    }

    /// Best-effort cleanup on process shutdown
    ///
    /// Cancels every registered job and marks running settings stopped.
    /// Bounded by `timeout`; failures are logged and swallowed.
    pub async fn shutdown(&self, timeout: Duration) {
        let cleanup = async {
            let cancelled = self.registry.cancel_all();
            tracing::info!("Cancelled {} job(s) on shutdown", cancelled.len());

            let settings = Arc::clone(&self.settings);
            if let Err(e) = run_blocking(move || settings.stop_all_running(Utc::now())).await {
                tracing::error!("Failed to reconcile scrape settings on shutdown: {}", e);
            }
        };

        if tokio::time::timeout(timeout, cleanup).await.is_err() {
            tracing::warn!("⚠️  Scrape job cleanup timed out after {:?}", timeout);
        }
    }
}
