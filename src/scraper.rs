use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context, eyre::eyre};
use log::{info, warn};
use reqwest::blocking::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{Config, PAGE_TIMEOUT};
use crate::fetch::fetch_image;
use crate::naming::{slug_from_href, slug_to_display_name, slug_to_safe_filename};

const BRAND_LINK_SELECTOR: &str = "a.elementor-post__thumbnail__link";

pub type Catalog = Vec<BrandEntry>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BrandEntry {
    pub name: String,
    pub logo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// One brand anchor as found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandLink {
    pub name: String,
    pub filename: String,
    pub logo: String,
}

/// Client settings shared by the listing fetch and every image fetch.
pub fn client_builder(config: &Config) -> ClientBuilder {
    Client::builder().user_agent(&config.user_agent)
}

pub fn build_client(config: &Config) -> Result<Client> {
    client_builder(config)
        .build()
        .wrap_err("failed to build scraping client")
}

pub struct CatalogScraper {
    client: Client,
    config: Config,
}

impl CatalogScraper {
    pub fn new(config: Config) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Scrapes the listing page and rewrites the catalog file.
    ///
    /// When a catalog already exists and neither `save_images` nor
    /// `force_download` is set, it is returned as-is and nothing is fetched.
    pub fn run(&self, save_images: bool, force_download: bool) -> Result<Catalog> {
        let prior = if force_download {
            None
        } else {
            load_catalog(&self.config.catalog_path)
        };

        if let Some(prior) = &prior {
            info!(
                "Existing {} file found with {} brands.",
                self.config.catalog_path.display(),
                prior.len()
            );
            if !save_images {
                info!("Use --force to update the data.");
                return Ok(prior.clone());
            }
        }

        let html = self.fetch_listing()?;
        let links = parse_listing(&html, &self.config.base_url)?;
        let known_paths = existing_paths(prior.as_deref().unwrap_or_default());

        let catalog = self.build_catalog(links, &known_paths, save_images, force_download);

        write_catalog(&self.config.catalog_path, &catalog)?;

        info!("Success! {} brands processed.", catalog.len());
        if save_images {
            let available = catalog.iter().filter(|b| b.local_path.is_some()).count();
            info!("JSON file generated: {}", self.config.catalog_path.display());
            info!(
                "Logos available: {available}/{} in '{}' folder",
                catalog.len(),
                self.config.logo_dir.display()
            );
        }

        Ok(catalog)
    }

    fn fetch_listing(&self) -> Result<String> {
        let url = &self.config.base_url;
        let html = self
            .client
            .get(url.clone())
            .timeout(PAGE_TIMEOUT)
            .send()
            .wrap_err_with(|| format!("failed to fetch {url}"))?
            .error_for_status()?
            .text()?;
        Ok(html)
    }

    fn build_catalog(
        &self,
        links: Vec<Result<BrandLink>>,
        known_paths: &HashMap<String, PathBuf>,
        save_images: bool,
        force_download: bool,
    ) -> Catalog {
        let mut catalog = Catalog::new();
        for link in links {
            match link {
                Ok(link) => {
                    catalog.push(self.build_entry(link, known_paths, save_images, force_download))
                }
                Err(err) => warn!("Skipping brand: {err:#}"),
            }
        }
        catalog
    }

    fn build_entry(
        &self,
        link: BrandLink,
        known_paths: &HashMap<String, PathBuf>,
        save_images: bool,
        force_download: bool,
    ) -> BrandEntry {
        let mut entry = BrandEntry {
            name: link.name,
            logo: link.logo,
            local_path: None,
        };

        if let Some(path) = known_paths.get(&entry.name).filter(|_| !force_download) {
            info!("Keeping existing file: {}", path.display());
            entry.local_path = Some(path.clone());
        } else if save_images {
            entry.local_path = fetch_image(
                &self.client,
                &entry.logo,
                &link.filename,
                &self.config.logo_dir,
                force_download,
            );
            if entry.local_path.is_none() {
                warn!("Failed to download: {}", entry.name);
            }
        }

        entry
    }
}

/// Reads a previously written catalog. A missing or unreadable file yields `None`.
pub fn load_catalog(path: &Path) -> Option<Catalog> {
    if !path.exists() {
        return None;
    }
    let parsed = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))
        .and_then(|text| serde_json::from_str::<Catalog>(&text).map_err(Into::into));
    match parsed {
        Ok(catalog) => Some(catalog),
        Err(err) => {
            warn!("Error reading existing JSON file: {err:#}");
            None
        }
    }
}

pub fn write_catalog(path: &Path, catalog: &Catalog) -> Result<()> {
    let json = serde_json::to_string_pretty(catalog)?;
    fs::write(path, json).wrap_err_with(|| format!("failed to write {}", path.display()))
}

/// `name -> local_path` for every prior entry that has a file on record.
pub fn existing_paths(prior: &[BrandEntry]) -> HashMap<String, PathBuf> {
    prior
        .iter()
        .filter_map(|b| b.local_path.clone().map(|p| (b.name.clone(), p)))
        .collect()
}

/// Extracts brand anchors in page order. Anchors without an `href` are ignored;
/// any other defect turns into an `Err` for that anchor alone.
pub fn parse_listing(html: &str, base_url: &Url) -> Result<Vec<Result<BrandLink>>> {
    let document = Html::parse_document(html);
    let selector = selector(BRAND_LINK_SELECTOR)?;

    Ok(document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.attr("href")?;
            Some(parse_brand_link(&anchor, href, base_url))
        })
        .collect())
}

fn parse_brand_link(anchor: &ElementRef, href: &str, base_url: &Url) -> Result<BrandLink> {
    let slug = slug_from_href(href).ok_or_else(|| eyre!("no brand slug in link {href:?}"))?;
    let src = select_one(anchor, "img")
        .wrap_err_with(|| format!("brand {slug}"))?
        .attr("src")
        .ok_or_else(|| eyre!("brand {slug}: missing image src"))?;

    Ok(BrandLink {
        name: slug_to_display_name(&slug),
        filename: slug_to_safe_filename(&slug),
        logo: absolute_logo_url(src, base_url)?,
    })
}

/// Protocol-relative sources become `https:`; relative ones resolve against the site.
pub fn absolute_logo_url(src: &str, base_url: &Url) -> Result<String> {
    if src.starts_with("//") {
        Ok(format!("https:{src}"))
    } else if src.starts_with("http") {
        Ok(src.to_string())
    } else {
        Ok(base_url
            .join(src)
            .wrap_err_with(|| format!("bad image url {src:?}"))?
            .to_string())
    }
}

fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| eyre!("invalid selector {selector}: {e}"))
}

fn select_one<'a>(element: &ElementRef<'a>, selector_str: &str) -> Result<ElementRef<'a>> {
    element
        .select(&selector(selector_str)?)
        .next()
        .ok_or_else(|| eyre!("missing element: {}", selector_str))
}
