pub mod scrape;

pub use scrape::{ScrapeStats, ScrapeStatsSnapshot};
