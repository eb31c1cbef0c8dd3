//! Headless-Chrome page capture via chromiumoxide (CDP).
//!
//! Each capture owns its own browser session: menu pages are cheap, sites are
//! few, and session isolation means a wedged page never poisons a sibling
//! capture running concurrently.

use std::path::{Path, PathBuf};
#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use anyhow::Context;
use anyhow::Result;
use serde::{Deserialize, Serialize};
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
#[cfg(feature = "browser")]
use chromiumoxide::page::ScreenshotParams;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;

use crate::models::{ImageFormat, Restaurant};

/// Capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Page load timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Settle wait after navigation, before looking for consent banners.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

fn default_headless() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_settle_ms() -> u64 {
    300
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            timeout: default_timeout(),
            settle_ms: default_settle_ms(),
            chrome_args: Vec::new(),
        }
    }
}

/// Consent-banner buttons are matched by visible label. Czech first: the
/// sites this runs against are Czech restaurant pages.
#[cfg(feature = "browser")]
const CONSENT_BUTTON_LABELS: &[&str] = &["Přijmout", "Consent", "Accept"];

/// Button-clicking script; returns the clicked label or null.
#[cfg(feature = "browser")]
fn consent_click_script() -> String {
    let labels = serde_json::to_string(CONSENT_BUTTON_LABELS).unwrap_or_default();
    format!(
        r#"
        (() => {{
            const labels = {labels};
            const candidates = document.querySelectorAll("button, [role='button']");
            for (const el of candidates) {{
                const text = (el.innerText || '').trim();
                if (labels.some((l) => text.includes(l))) {{
                    el.click();
                    return text;
                }}
            }}
            return null;
        }})()
        "#
    )
}

/// Common Chrome executable paths to check.
#[cfg(feature = "browser")]
const CHROME_PATHS: &[&str] = &[
    // Linux
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    // macOS
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    // Common install locations
    "/opt/google/chrome/google-chrome",
];

/// Find a Chrome executable on well-known paths or in PATH.
#[cfg(feature = "browser")]
fn find_chrome() -> Result<PathBuf> {
    for path in CHROME_PATHS {
        let p = Path::new(path);
        if p.exists() {
            debug!("Found Chrome at: {}", path);
            return Ok(p.to_path_buf());
        }
    }

    for cmd in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(cmd) {
            debug!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    Err(anyhow::anyhow!(
        "Chrome/Chromium not found. Please install it:\n\
         - Arch/Manjaro: sudo pacman -S chromium\n\
         - Ubuntu/Debian: sudo apt install chromium-browser\n\
         - Fedora: sudo dnf install chromium\n\
         - Or download from: https://www.google.com/chrome/"
    ))
}

/// Capture a full-page screenshot of one restaurant's menu page.
///
/// Writes `<out_dir>/<id>.<format>` and returns the written path.
#[cfg(feature = "browser")]
pub async fn capture_site(
    config: &CaptureConfig,
    site: &Restaurant,
    out_dir: &Path,
    format: ImageFormat,
    quality: Option<u8>,
) -> Result<PathBuf> {
    info!("{} - launching browser", site.id);

    let chrome_path = find_chrome()?;
    let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

    // with_head means NOT headless, confusingly
    if !config.headless {
        builder = builder.with_head();
    }

    builder = builder
        .arg("--disable-dev-shm-usage")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-background-networking")
        .arg("--disable-sync")
        .arg("--disable-translate")
        .arg("--no-sandbox") // Often needed for headless in containers/restricted environments
        .arg("--disable-gpu")
        .arg("--disable-software-rasterizer");

    for arg in &config.chrome_args {
        builder = builder.arg(arg);
    }

    let browser_config = builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

    let (mut browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    let result = capture_page(config, site, out_dir, format, quality, &browser).await;

    let _ = browser.close().await;
    let _ = browser.wait().await;
    handler_task.abort();

    result
}

#[cfg(feature = "browser")]
async fn capture_page(
    config: &CaptureConfig,
    site: &Restaurant,
    out_dir: &Path,
    format: ImageFormat,
    quality: Option<u8>,
    browser: &Browser,
) -> Result<PathBuf> {
    let page = browser.new_page("about:blank").await?;

    info!("{} - navigating to {}", site.id, site.url);
    let nav_timeout = Duration::from_secs(config.timeout);
    tokio::time::timeout(nav_timeout, async {
        page.goto(site.url.as_str()).await?;
        page.wait_for_navigation().await
    })
    .await
    .map_err(|_| anyhow::anyhow!("timed out loading {} after {:?}", site.url, nav_timeout))?
    .with_context(|| format!("failed to load {}", site.url))?;

    // Let late scripts and lazy content render before poking at the DOM.
    tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;

    match page.evaluate(consent_click_script()).await {
        Ok(result) => {
            if let Ok(Some(label)) = result.into_value::<Option<String>>() {
                info!("{} - dismissed consent banner via '{}'", site.id, label);
                // Give the banner time to animate away.
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }
        Err(e) => {
            // Non-HTML pages or mid-transition frames; the capture still works.
            debug!("{} - consent script skipped: {}", site.id, e);
        }
    }

    info!("{} - taking screenshot", site.id);
    let mut params = ScreenshotParams::builder().full_page(true);
    params = match format {
        ImageFormat::Jpeg => params
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(i64::from(quality.unwrap_or(80))),
        ImageFormat::Png => params.format(CaptureScreenshotFormat::Png),
    };
    if quality.is_some() && format == ImageFormat::Png {
        warn!("{} - quality is ignored for png captures", site.id);
    }

    let image = page.screenshot(params.build()).await?;
    let out_file = out_dir.join(format!("{}.{}", site.id, format));
    std::fs::write(&out_file, &image)
        .with_context(|| format!("failed to write {}", out_file.display()))?;

    let _ = page.close().await;
    Ok(out_file)
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub async fn capture_site(
    _config: &CaptureConfig,
    _site: &Restaurant,
    _out_dir: &Path,
    _format: ImageFormat,
    _quality: Option<u8>,
) -> Result<PathBuf> {
    Err(anyhow::anyhow!(
        "Browser support not compiled. Rebuild with: cargo build --features browser"
    ))
}
