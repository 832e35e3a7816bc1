// Bing image search scraper — pages the async results endpoint and downloads
// the full-size images it references.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::traits::ImageSource;
use crate::config::{FETCH_TIMEOUT_SECS, IMAGE_EXTENSIONS, SEARCH_PAGE_SIZE};
use crate::error::{Error, Result};

/// Full-size image URLs are embedded in the results markup as
/// `murl&quot;:&quot;<url>&quot;`.
static MURL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"murl&quot;:&quot;(.*?)&quot;"#).expect("murl regex"));

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub struct BingSource {
    client: Client,
    base_url: String,
}

impl BingSource {
    pub fn new() -> Self {
        Self::with_base_url("https://www.bing.com")
    }

    /// Point the scraper at a different host. Used by tests to substitute a
    /// local fake provider.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch one page of search results and return the image URLs it lists.
    async fn search_page(&self, query: &str, offset: usize) -> Result<Vec<String>> {
        let url = format!("{}/images/async", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("first", &offset.to_string()),
                ("count", &SEARCH_PAGE_SIZE.to_string()),
                ("adlt", "off"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("search page failed status={} offset={}", status.as_u16(), offset);
            return Err(Error::upstream(format!(
                "image search failed: HTTP {}",
                status.as_u16()
            )));
        }

        let body = resp.text().await?;
        let urls: Vec<String> = MURL_RE
            .captures_iter(&body)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect();
        debug!("search page offset={} yielded {} urls", offset, urls.len());
        Ok(urls)
    }

    /// Download one image URL into `dest`. Returns the written filename, or
    /// `None` when the download fails (caller moves on to the next URL).
    async fn download_image(&self, url: &str, index: usize, dest: &Path) -> Option<String> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("image fetch failed url={}: {}", url, e);
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!("image fetch failed url={} status={}", url, resp.status().as_u16());
            return None;
        }

        let ext = extension_for(url, resp.headers().get("content-type"));
        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("image body read failed url={}: {}", url, e);
                return None;
            }
        };
        if bytes.is_empty() {
            warn!("image body empty url={}", url);
            return None;
        }

        let filename = format!("Image_{}.{}", index, ext);
        if let Err(e) = tokio::fs::write(dest.join(&filename), &bytes).await {
            warn!("image write failed file={}: {}", filename, e);
            return None;
        }
        debug!("downloaded {} ({} bytes)", filename, bytes.len());
        Some(filename)
    }
}

impl Default for BingSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSource for BingSource {
    async fn fetch_into(&self, query: &str, limit: usize, dest: &Path) -> Result<usize> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut written = 0usize;
        let mut offset = 0usize;

        while written < limit {
            let urls = self.search_page(query, offset).await?;
            offset += SEARCH_PAGE_SIZE;

            let fresh: Vec<String> = urls.into_iter().filter(|u| seen.insert(u.clone())).collect();
            if fresh.is_empty() {
                // Provider has no further results for this query.
                break;
            }

            for url in fresh {
                if written >= limit {
                    break;
                }
                if self.download_image(&url, written + 1, dest).await.is_some() {
                    written += 1;
                }
            }
        }

        info!("fetched {} image(s) for query \"{}\"", written, query);
        Ok(written)
    }
}

/// Pick a file extension: from the URL path when allow-listed, else from the
/// Content-Type, else default to jpg.
fn extension_for(url: &str, content_type: Option<&reqwest::header::HeaderValue>) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if let Some(ext) = path.rsplit('.').next() {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return ext;
        }
    }

    if let Some(ct) = content_type.and_then(|v| v.to_str().ok()) {
        match ct.split(';').next().unwrap_or("").trim() {
            "image/png" => return "png".to_string(),
            "image/jpeg" => return "jpg".to_string(),
            "image/gif" => return "gif".to_string(),
            "image/bmp" => return "bmp".to_string(),
            "image/webp" => return "webp".to_string(),
            _ => {}
        }
    }

    "jpg".to_string()
}
