//! Chromium-backed scrape engine
//!
//! Drives Google's video search tab in a headless Chromium and keeps every
//! YouTube link it finds. Extraction is one generic anchor scan rather than
//! layout-specific selectors.

use std::collections::HashSet;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use url::Url;

use super::ScrapeEngine;
use crate::{Error, Result, ScrapeErrorKind, config::BrowserSettings, types::VideoResult};

/// Collects `{title, url, description, meta}` for every anchor pointing at YouTube
const ANCHOR_SCAN_SCRIPT: &str = r#"
(() => {
  const out = [];
  for (const a of document.querySelectorAll('a[href]')) {
    const href = a.href || '';
    if (!/youtube\.com\/watch|youtu\.be\//.test(href)) continue;
    const heading = a.querySelector('h3') || a.querySelector('[role="heading"]');
    const title = ((heading && heading.innerText) || a.getAttribute('aria-label') || a.innerText || '').trim();
    const block = a.closest('div[data-hveid]') || a.parentElement;
    const meta = block ? (block.innerText || '').slice(0, 600) : '';
    const description = meta.replace(title, '').trim().slice(0, 300);
    out.push({ title, url: href, description, meta });
  }
  return out;
})()
"#;

/// Results requested when only the best video is wanted
const BEST_VIDEO_CANDIDATES: usize = 5;

#[derive(Debug, Deserialize)]
struct RawAnchor {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
    /// Full text of the result block
    #[serde(default)]
    meta: String,
}

/// Labels read off a result block
#[derive(Debug, Default, PartialEq)]
struct ResultMeta {
    duration: Option<String>,
    channel: Option<String>,
    views: Option<String>,
}

struct OpenBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

/// Scrape engine backed by a single Chromium process
pub struct ChromeEngine {
    settings: BrowserSettings,
    browser: RwLock<Option<OpenBrowser>>,
}

impl std::fmt::Debug for ChromeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromeEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ChromeEngine {
    /// Create an engine; Chromium is launched by `initialize`
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: RwLock::new(None),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer");

        if !self.settings.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = self.settings.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(|e| {
            Error::scrape(
                ScrapeErrorKind::Browser,
                format!("Failed to build browser config: {}", e),
            )
        })
    }

    async fn shutdown(open: OpenBrowser) {
        let OpenBrowser {
            mut browser,
            handler,
        } = open;
        if let Err(e) = browser.close().await {
            tracing::debug!("Browser close returned an error: {}", e);
        }
        handler.abort();
    }

    /// Google video-search URL for `query`
    pub fn search_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.settings.search_url,
            &[("q", query), ("tbm", "vid"), ("hl", "en")],
        )
        .map_err(|e| Error::config(format!("Invalid search_url: {}", e)))
    }

    async fn scan_page(&self, url: &Url) -> Result<Vec<RawAnchor>> {
        let guard = self.browser.read().await;
        let open = guard.as_ref().ok_or_else(|| {
            Error::scrape(ScrapeErrorKind::NotInitialized, "Browser is not running")
        })?;

        let page = open.browser.new_page("about:blank").await.map_err(|e| {
            Error::scrape(ScrapeErrorKind::Browser, format!("Failed to create page: {}", e))
        })?;

        let result = async {
            if let Some(ref ua) = self.settings.user_agent {
                page.set_user_agent(ua).await.map_err(|e| {
                    Error::scrape(
                        ScrapeErrorKind::Browser,
                        format!("Failed to set user agent: {}", e),
                    )
                })?;
            }

            let navigation = async {
                page.goto(url.as_str()).await?;
                page.wait_for_navigation().await?;
                Ok::<_, chromiumoxide::error::CdpError>(())
            };
            match tokio::time::timeout(self.settings.navigation_timeout(), navigation).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(Error::scrape(
                        ScrapeErrorKind::Navigation,
                        format!("Navigation failed: {}", e),
                    ));
                }
                Err(_) => {
                    return Err(Error::scrape(
                        ScrapeErrorKind::Timeout,
                        format!(
                            "Navigation did not finish within {:?}",
                            self.settings.navigation_timeout()
                        ),
                    ));
                }
            }

            let landed = page.url().await.ok().flatten().unwrap_or_default();
            if is_block_page(&landed) {
                return Err(Error::scrape(
                    ScrapeErrorKind::Blocked,
                    format!("Search redirected to a bot check: {}", landed),
                ));
            }

            tokio::time::sleep(self.settings.settle()).await;

            page.evaluate(ANCHOR_SCAN_SCRIPT)
                .await
                .map_err(|e| {
                    Error::scrape(
                        ScrapeErrorKind::Extraction,
                        format!("Script execution failed: {}", e),
                    )
                })?
                .into_value::<Vec<RawAnchor>>()
                .map_err(|e| {
                    Error::scrape(
                        ScrapeErrorKind::Extraction,
                        format!("Failed to parse result: {:?}", e),
                    )
                })
        }
        .await;

        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close search page: {}", e);
        }

        result
    }
}

#[async_trait]
impl ScrapeEngine for ChromeEngine {
    async fn initialize(&self) -> Result<()> {
        let config = self.browser_config()?;
        let mut slot = self.browser.write().await;

        if let Some(previous) = slot.take() {
            tracing::debug!("Replacing previous browser instance");
            Self::shutdown(previous).await;
        }

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            Error::scrape(
                ScrapeErrorKind::Browser,
                format!(
                    "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                    e
                ),
            )
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        *slot = Some(OpenBrowser { browser, handler });
        tracing::info!("Chromium launched (headless: {})", self.settings.headless);
        Ok(())
    }

    async fn close(&self) {
        if let Some(open) = self.browser.write().await.take() {
            Self::shutdown(open).await;
            tracing::info!("Chromium closed");
        }
    }

    async fn search_videos(&self, query: &str, limit: usize) -> Result<Vec<VideoResult>> {
        let url = self.search_url(query)?;
        tracing::debug!("Searching videos: {}", url);
        let anchors = self.scan_page(&url).await?;
        let videos = collect_videos(anchors, limit);
        tracing::info!("Found {} videos for {:?}", videos.len(), query);
        Ok(videos)
    }

    async fn get_best_video(&self, query: &str) -> Result<VideoResult> {
        self.search_videos(query, BEST_VIDEO_CANDIDATES)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::scrape(
                    ScrapeErrorKind::NoResults,
                    format!("No video found for {:?}", query),
                )
            })
    }
}

fn is_block_page(url: &str) -> bool {
    url.contains("/sorry/")
}

/// Canonical watch URL for a YouTube link, unwrapping Google redirects
fn canonical_watch_url(href: &str) -> Option<String> {
    let parsed = Url::parse(href).ok()?;

    if parsed.path() == "/url"
        && let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "q" || k == "url")
    {
        return canonical_watch_url(&target);
    }

    let video = VideoResult::new("", parsed.as_str());
    video
        .video_id()
        .map(|id| format!("https://www.youtube.com/watch?v={}", id))
}

fn collect_videos(anchors: Vec<RawAnchor>, limit: usize) -> Vec<VideoResult> {
    let mut seen = HashSet::new();
    anchors
        .into_iter()
        .filter_map(|raw| {
            let url = canonical_watch_url(&raw.url)?;
            let title = raw.title.trim();
            if title.is_empty() || !seen.insert(url.clone()) {
                return None;
            }
            let mut video = VideoResult::new(title, url).with_description(raw.description.trim());
            let meta = result_metadata(&raw.meta);
            if let Some(duration) = meta.duration {
                video = video.with_duration(duration);
            }
            if let Some(channel) = meta.channel {
                video = video.with_channel(channel);
            }
            if let Some(views) = meta.views {
                video = video.with_views(views);
            }
            Some(video)
        })
        .take(limit)
        .collect()
}

/// Duration, channel and view count from a block such as
/// `"Title\nYouTube · Channel\n2.1M views · 3 years ago\n2:25"`
fn result_metadata(text: &str) -> ResultMeta {
    let duration = text
        .split_whitespace()
        .find(|token| is_duration(token))
        .map(str::to_string);

    let channel = text
        .split(['\n', '·'])
        .map(str::trim)
        .skip_while(|segment| !segment.eq_ignore_ascii_case("youtube"))
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string);

    let words: Vec<&str> = text.split_whitespace().collect();
    let views = words
        .windows(2)
        .find(|pair| {
            pair[0].starts_with(|c: char| c.is_ascii_digit())
                && pair[1]
                    .trim_end_matches(|c: char| !c.is_alphanumeric())
                    .eq_ignore_ascii_case("views")
        })
        .map(|pair| format!("{} views", pair[0]));

    ResultMeta {
        duration,
        channel,
        views,
    }
}

/// `m:ss`, `mm:ss` or `h:mm:ss`
fn is_duration(token: &str) -> bool {
    let parts: Vec<&str> = token.split(':').collect();
    (2..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|p| (1..=2).contains(&p.len()) && p.bytes().all(|b| b.is_ascii_digit()))
        && parts[1..].iter().all(|p| p.len() == 2)
}
