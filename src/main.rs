use car_logos::cli::Cli;
use car_logos::config::Config;
use car_logos::scraper::CatalogScraper;
use clap::Parser;
use color_eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let scraper = CatalogScraper::new(config)?;
    scraper.run(cli.download, cli.force)?;
    Ok(())
}
