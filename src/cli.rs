use clap::Parser;

/// Scrape car logos from car-logos.org
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Download logos to the local folder
    #[arg(long, default_value_t = false)]
    pub download: bool,

    /// Force download even if files already exist
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
