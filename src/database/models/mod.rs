pub mod market_tick;
pub mod scrape_settings;

pub use market_tick::{MarketTick, NewMarketTick, SymbolMetadata};
pub use scrape_settings::{JobStatus, NewScrapeSettings, ScrapeSettings, SCRAPE_SETTINGS_KEY};
