// Library Crate Root
// lib.rs

// main.rs imports through lib.rs like an external crate
pub mod api;
pub mod config;
pub mod database;
pub mod jobs;
pub mod market_data;
pub mod metrics;

// pub use = re-export at crate root
pub use api::{create_router, AppState};
pub use config::AppConfig;
pub use jobs::{JobRegistry, ScrapeJobController, ScrapePipeline};
pub use market_data::{MarketDataService, QuoteSource, TwelveDataClient};
