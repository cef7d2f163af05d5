use std::path::PathBuf;
use std::time::Duration;

use color_eyre::{Result, eyre::Context};
use serde::Deserialize;
use url::Url;

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(skip, default = "default_base_url")]
    pub base_url: Url,
    #[serde(skip, default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(skip, default = "default_logo_dir")]
    pub logo_dir: PathBuf,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
}

fn default_base_url() -> Url {
    Url::parse("https://car-logos.org/").expect("default base url is valid")
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("car_brands.json")
}

fn default_logo_dir() -> PathBuf {
    PathBuf::from("logos")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            base_url: default_base_url(),
            catalog_path: default_catalog_path(),
            logo_dir: default_logo_dir(),
        }
    }
}

impl Config {
    /// Only the user agent can be overridden (`CAR_LOGOS_USER_AGENT`); the site
    /// and output paths are fixed.
    pub fn from_env() -> Result<Self> {
        envy::prefixed("CAR_LOGOS_")
            .from_env::<Config>()
            .wrap_err("failed to load config")
    }
}
