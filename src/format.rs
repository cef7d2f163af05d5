use std::io::Read;

use color_eyre::Result;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use strum_macros::{AsRefStr, Display, EnumString};
use url::Url;

pub const SNIFF_LEN: u64 = 32;

#[derive(Display, AsRefStr, EnumString, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ImageFormat {
    Png,
    Jpg,
    Jpeg,
    Svg,
    Webp,
    Bin,
}

impl ImageFormat {
    /// The extensions a saved logo may carry, in lookup order.
    pub const KNOWN: [ImageFormat; 5] = [Self::Png, Self::Jpg, Self::Jpeg, Self::Svg, Self::Webp];

    pub fn from_known_extension(ext: &str) -> Option<Self> {
        ext.parse::<Self>().ok().filter(|f| *f != Self::Bin)
    }

    pub fn extension(&self) -> &str {
        self.as_ref()
    }
}

/// First hit wins: Content-Disposition, Content-Type, body signature, URL suffix, then `bin`.
pub fn classify(headers: &HeaderMap, url: &str, body: impl Read) -> Result<ImageFormat> {
    if let Some(format) = from_content_disposition(headers).or_else(|| from_content_type(headers)) {
        return Ok(format);
    }

    let prefix = read_prefix(body)?;
    Ok(from_signature(&prefix)
        .or_else(|| from_url(url))
        .unwrap_or(ImageFormat::Bin))
}

fn read_prefix(body: impl Read) -> Result<Vec<u8>> {
    let mut prefix = Vec::with_capacity(SNIFF_LEN as usize);
    body.take(SNIFF_LEN).read_to_end(&mut prefix)?;
    Ok(prefix)
}

pub fn from_content_disposition(headers: &HeaderMap) -> Option<ImageFormat> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    let filename = split_params(value).into_iter().find_map(|param| {
        let (name, v) = param.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("filename")
            .then(|| v.trim().trim_matches(|c: char| c == '"' || c == '\''))
    })?;
    let (_, ext) = filename.rsplit_once('.')?;
    ImageFormat::from_known_extension(ext)
}

// Splits on `;` outside quoted strings, so `filename="a;b.png"` stays whole.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut quote = None;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (';', None) => {
                params.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

pub fn from_content_type(headers: &HeaderMap) -> Option<ImageFormat> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?.to_ascii_lowercase();
    if content_type.contains("png") {
        Some(ImageFormat::Png)
    } else if content_type.contains("jpeg") || content_type.contains("jpg") {
        Some(ImageFormat::Jpg)
    } else if content_type.contains("svg") {
        Some(ImageFormat::Svg)
    } else if content_type.contains("webp") {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

pub fn from_signature(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(b"\x89PNG") {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(&[0xFF, 0xD8]) {
        Some(ImageFormat::Jpg)
    } else if contains(bytes, b"<svg") {
        Some(ImageFormat::Svg)
    } else if bytes.starts_with(b"RIFF") && contains(bytes, b"WEBP") {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

pub fn from_url(url: &str) -> Option<ImageFormat> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    ImageFormat::from_known_extension(ext)
}
