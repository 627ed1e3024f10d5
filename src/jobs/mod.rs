/// Background jobs module
///
/// - Job registry of named repeating tokio tasks
/// - Scrape job: quote fetch → transform → replace-by-range insert

pub mod registry;
pub mod scrape_job;

pub use registry::{ActiveJob, JobRegistry};
pub use scrape_job::{
    CycleOutcome, ScrapeJobController, ScrapeJobError, ScrapeJobStatus, ScrapePipeline,
    StopOutcome, SCRAPER_JOB_NAME,
};
