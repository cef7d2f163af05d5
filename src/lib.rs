pub mod cli;
pub mod config;
pub mod fetch;
pub mod format;
pub mod naming;
pub mod scraper;
