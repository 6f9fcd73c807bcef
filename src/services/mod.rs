pub mod directory_scraper;
pub mod fetcher;
pub mod link_collector;
pub mod profile_extractor;

pub use directory_scraper::*;
pub use fetcher::*;
pub use link_collector::*;
pub use profile_extractor::*;
