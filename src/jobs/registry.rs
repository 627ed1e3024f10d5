use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

/// A job currently registered in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJob {
    pub job_id: Uuid,
    pub interval: Duration,
    pub registered_at: DateTime<Utc>,
}

struct RegisteredJob {
    info: ActiveJob,
    // Timer loop; aborting it stops future runs, in-flight runs finish
    handle: JoinHandle<()>,
}

/// Process-local registry of repeating jobs, keyed by job name
///
/// Each job is a spawned timer loop firing every `interval` with millisecond
/// precision, first run one interval after registration. At most one job per
/// name. Nothing here is persisted.
#[derive(Default)]
pub struct JobRegistry {
    jobs: DashMap<String, RegisteredJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` to run every `interval` under `name`
    ///
    /// A job already registered under the same name is cancelled first.
    /// Runs are spawned, so a slow run may overlap the next one.
    /// Must be called from within a tokio runtime.
    pub fn register<F, Fut>(&self, name: &str, interval: Duration, task: F) -> ActiveJob
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if let Some(previous) = self.cancel(name) {
            tracing::debug!("Replacing job '{}' ({})", name, previous.job_id);
        }

        let period = interval.max(Duration::from_millis(1));
        let task = Arc::new(task);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                tokio::spawn(task());
            }
        });

        let info = ActiveJob {
            job_id: Uuid::new_v4(),
            interval,
            registered_at: Utc::now(),
        };
        self.jobs.insert(
            name.to_string(),
            RegisteredJob {
                info: info.clone(),
                handle,
            },
        );

        tracing::info!("Job '{}' registered every {:?} ({})", name, interval, info.job_id);

        info
    }

    /// Cancel and forget the job registered under `name`
    pub fn cancel(&self, name: &str) -> Option<ActiveJob> {
        let (_, job) = self.jobs.remove(name)?;
        job.handle.abort();
        tracing::info!("Job '{}' cancelled ({})", name, job.info.job_id);

        Some(job.info)
    }

    /// Cancel every registered job, returning the names that were cancelled
    pub fn cancel_all(&self) -> Vec<String> {
        let names: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();

        names
            .into_iter()
            .filter(|name| self.cancel(name).is_some())
            .collect()
    }

    pub fn lookup(&self, name: &str) -> Option<ActiveJob> {
        self.jobs.get(name).map(|entry| entry.info.clone())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Drop for JobRegistry {
    fn drop(&mut self) {
        for entry in self.jobs.iter() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(registry: &JobRegistry, name: &str, interval: Duration) -> Arc<AtomicUsize> {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        registry.register(name, interval, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        runs
    }

    #[tokio::test]
    async fn test_register_replaces_same_name() {
        let registry = JobRegistry::new();

        let first = registry.register("scraper", Duration::from_secs(5), || async {});
        let second = registry.register("scraper", Duration::from_secs(3), || async {});

        assert_ne!(first.job_id, second.job_id);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("scraper").unwrap().interval, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_cancel_and_cancel_all() {
        let registry = JobRegistry::new();
        registry.register("a", Duration::from_secs(60), || async {});
        registry.register("b", Duration::from_secs(60), || async {});

        assert!(registry.cancel("a").is_some());
        assert!(registry.cancel("a").is_none());
        assert!(!registry.is_registered("a"));

        assert_eq!(registry.cancel_all(), vec!["b".to_string()]);
        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sub_second_interval_keeps_firing() {
        let registry = JobRegistry::new();
        let runs = counting_job(&registry, "fast", Duration::from_millis(200));

        // Fires at 200, 400, 600, 800 and 1000ms
        tokio::time::sleep(Duration::from_millis(1100)).await;
        registry.cancel_all();

        let runs = runs.load(Ordering::SeqCst);
        assert!((4..=6).contains(&runs), "got {} runs", runs);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fractional_second_interval_is_not_truncated() {
        let registry = JobRegistry::new();
        let runs = counting_job(&registry, "slow", Duration::from_millis(1500));

        // Fires at 1.5s and 3.0s; a one second period would give four runs
        tokio::time::sleep(Duration::from_millis(4000)).await;
        registry.cancel_all();

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancelled_job_stops_firing() {
        let registry = JobRegistry::new();
        let runs = counting_job(&registry, "tick", Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;
        registry.cancel("tick");
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_cancel = runs.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runs.load(Ordering::SeqCst), after_cancel);
    }
}
