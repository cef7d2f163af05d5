use std::fs::{self, File};
use std::path::{Path, PathBuf};

use color_eyre::{Result, eyre::Context};
use log::{error, info, warn};
use reqwest::blocking::{Client, Response};

use crate::config::IMAGE_TIMEOUT;
use crate::format::{self, ImageFormat};
use crate::naming::slug_to_safe_filename;

/// Looks for `{stem}.{ext}` in `folder` for each known extension, first match wins.
pub fn find_existing(folder: &Path, stem: &str) -> Option<(PathBuf, ImageFormat)> {
    ImageFormat::KNOWN.iter().find_map(|format| {
        let path = folder.join(format!("{stem}.{}", format.extension()));
        path.is_file().then_some((path, *format))
    })
}

/// Downloads the logo at `url` into `folder`, or reuses a copy already there.
///
/// The stem is sanitised before the lookup. Without `force`, an existing
/// `{stem}.{ext}` is returned without touching the network. With `force` the
/// image is fetched again, and an old file with a different extension is
/// removed once the new one is written.
///
/// Errors never escape: they are logged, and the previously existing file (if
/// any) is returned instead.
pub fn fetch_image(
    client: &Client,
    url: &str,
    stem: &str,
    folder: &Path,
    force: bool,
) -> Option<PathBuf> {
    if let Err(err) = fs::create_dir_all(folder) {
        error!("Error creating {}: {err}", folder.display());
        return None;
    }

    let stem = slug_to_safe_filename(stem);
    let existing = find_existing(folder, &stem);
    if let Some((path, _)) = &existing {
        if !force {
            info!(
                "File already exists: {} (use --force to download again)",
                path.display()
            );
            return Some(path.clone());
        }
    }

    match download(client, url, &stem, folder, existing.as_ref().map(|(p, _)| p.as_path())) {
        Ok(path) => Some(path),
        Err(err) => {
            error!("Error downloading {url}: {err:#}");
            existing.map(|(path, _)| path)
        }
    }
}

fn download(
    client: &Client,
    url: &str,
    stem: &str,
    folder: &Path,
    existing: Option<&Path>,
) -> Result<PathBuf> {
    // The probe response may be partly drained by sniffing, so the file body
    // always comes from a second request.
    let probe = get(client, url)?;
    let headers = probe.headers().clone();
    let format = format::classify(&headers, url, probe)
        .wrap_err_with(|| format!("failed to sniff {url}"))?;

    let path = folder.join(format!(
        "{}.{}",
        slug_to_safe_filename(stem),
        format.extension()
    ));

    let mut response = get(client, url)?;
    let mut file =
        File::create(&path).wrap_err_with(|| format!("failed to create {}", path.display()))?;
    response
        .copy_to(&mut file)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;

    match existing {
        Some(old) if old != path.as_path() => {
            match fs::remove_file(old) {
                Ok(()) => info!("Removed old file: {}", old.display()),
                Err(err) => warn!("Could not remove old file {}: {err}", old.display()),
            }
            info!("Replaced: {}", path.display());
        }
        Some(_) => info!("Replaced: {}", path.display()),
        None => info!("Downloaded: {}", path.display()),
    }

    Ok(path)
}

fn get(client: &Client, url: &str) -> Result<Response> {
    Ok(client
        .get(url)
        .timeout(IMAGE_TIMEOUT)
        .send()
        .wrap_err_with(|| format!("request to {url} failed"))?
        .error_for_status()?)
}
