//! Drives one browser tab through the full capture lifecycle (SPEC_FULL
//! §4.5): navigate, settle, reveal, scroll, re-reveal, finalize, read,
//! extract links, optionally snapshot, while a passive response sniffer
//! collects every non-HTML resource the tab loads.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::emulation::{SetDeviceMetricsOverrideParams, SetEmulatedMediaParams};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EventResponseReceived, GetResponseBodyParams, Headers, ResourceType,
    SetCookiesParams, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, PrintToPdfParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use url::Url;

use crate::config::{CrawlConfig, WaitStrategy};

use super::exclude::excluded_reason;
use super::links;
use super::reveal;
use super::schema::{Links, PageCaptureResult, Resource};

/// Status codes the sniffer keeps; everything else (redirects handled by the
/// browser, 4xx/5xx bodies) is dropped.
fn status_in_range(status: i64) -> bool {
    (200..400).contains(&status)
}

/// Spawns a task draining `page`'s response event stream into `resources`
/// for the tab's lifetime. Returns the task handle so the caller can abort
/// it once the page content has been read.
fn spawn_response_sniffer(
    page: &Page,
    resources: std::sync::Arc<tokio::sync::Mutex<HashMap<String, Resource>>>,
) -> Result<tokio::task::JoinHandle<()>> {
    let mut events = page
        .event_listener::<EventResponseReceived>()
        .map_err(|e| anyhow::anyhow!("failed to attach response listener: {e}"))?;
    let page = page.clone();

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if event.r#type == ResourceType::Document {
                continue;
            }
            let response = &event.response;
            let url = response.url.clone();
            let status = response.status;
            if !status_in_range(status) {
                continue;
            }
            let mime = response
                .mime_type
                .split(';')
                .next()
                .unwrap_or(&response.mime_type)
                .trim()
                .to_ascii_lowercase();
            if mime.contains("text/html") || url.starts_with("data:") {
                continue;
            }
            if excluded_reason(&url).is_some() {
                continue;
            }

            let Some(headers_obj) = response.headers.inner().as_object().cloned() else {
                continue;
            };
            let headers: HashMap<String, String> = headers_obj
                .into_iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.to_ascii_lowercase(), s.to_string())))
                .collect();

            let body = match page
                .execute(GetResponseBodyParams::new(event.request_id.clone()))
                .await
            {
                Ok(body) => body,
                Err(_) => continue,
            };
            let bytes = if body.result.base64_encoded {
                match base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &body.result.body) {
                    Ok(bytes) => bytes,
                    Err(_) => continue,
                }
            } else {
                body.result.body.clone().into_bytes()
            };

            let resource = Resource {
                url: url.clone(),
                http_status: u16::try_from(status).unwrap_or(0),
                mime_type: mime,
                size_bytes: bytes.len() as u64,
                bytes,
                headers,
            };
            resources.lock().await.insert(url, resource);
        }
    }))
}

async fn navigate(page: &Page, url: &str, wait: WaitStrategy, timeout_secs: u64) -> Result<()> {
    crate::crawl_engine::page_timeout::with_page_timeout(
        async {
            page.goto(url).await.context("navigation failed")?;
            match wait {
                WaitStrategy::Load | WaitStrategy::NetworkIdle => {
                    page.wait_for_navigation().await.context("wait_for_navigation failed")?;
                }
                WaitStrategy::DomContentLoaded => {}
            }
            Ok(())
        },
        timeout_secs,
        "page navigation",
    )
    .await
}

async fn wait_network_idle(page: &Page, timeout_secs: u64) -> Result<()> {
    let _ = tokio::time::timeout(Duration::from_secs(timeout_secs), page.wait_for_navigation()).await;
    Ok(())
}

/// A single cookie entry as read from `CrawlConfig::cookies_file`: a JSON
/// array of `{name, value, domain?, path?, url?}` objects, the shape
/// Puppeteer/Playwright's own cookie export uses.
#[derive(Deserialize)]
struct CookieFileEntry {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    url: Option<String>,
}

async fn load_cookies(path: &std::path::Path) -> Result<Vec<CookieParam>> {
    let bytes = tokio::fs::read(path).await.context("failed to read cookies file")?;
    let entries: Vec<CookieFileEntry> =
        serde_json::from_slice(&bytes).context("cookies file is not a JSON array of cookie objects")?;
    Ok(entries
        .into_iter()
        .map(|e| CookieParam {
            name: e.name,
            value: e.value,
            url: e.url,
            domain: e.domain,
            path: e.path,
            ..Default::default()
        })
        .collect())
}

/// A named device preset (SPEC_FULL §6 `device`): width, height, device
/// scale factor, mobile flag, and default user agent, in the shape of
/// Puppeteer/Playwright's built-in device descriptors. Only a handful of
/// the most common entries are carried; an unrecognized name falls back to
/// the plain `viewport`/`userAgent` settings.
struct DeviceDescriptor {
    width: u32,
    height: u32,
    device_scale_factor: f64,
    mobile: bool,
    user_agent: &'static str,
}

fn lookup_device(name: &str) -> Option<DeviceDescriptor> {
    match name {
        "iPhone 13" | "iPhone 12" => Some(DeviceDescriptor {
            width: 390,
            height: 844,
            device_scale_factor: 3.0,
            mobile: true,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 \
                (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1",
        }),
        "iPhone SE" => Some(DeviceDescriptor {
            width: 375,
            height: 667,
            device_scale_factor: 2.0,
            mobile: true,
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 \
                (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1",
        }),
        "iPad" | "iPad Pro" => Some(DeviceDescriptor {
            width: 1024,
            height: 1366,
            device_scale_factor: 2.0,
            mobile: true,
            user_agent: "Mozilla/5.0 (iPad; CPU OS 15_0 like Mac OS X) AppleWebKit/605.1.15 \
                (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1",
        }),
        "Pixel 5" | "Galaxy S20" => Some(DeviceDescriptor {
            width: 393,
            height: 851,
            device_scale_factor: 2.75,
            mobile: true,
            user_agent: "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36",
        }),
        _ => None,
    }
}

/// Applies the browser-facing config (SPEC_FULL §3 `CaptureJob`'s viewport,
/// device, userAgent, headers, cookies) to a freshly opened tab, before
/// navigation. Every step is best-effort: a misconfigured viewport or an
/// unreadable cookies file must not abort the capture.
async fn apply_page_config(page: &Page, config: &CrawlConfig) {
    let device = config.device.as_deref().and_then(lookup_device);

    let (width, height, scale_factor, mobile) = match &device {
        Some(d) => (d.width, d.height, d.device_scale_factor, d.mobile),
        None => (config.viewport.width, config.viewport.height, 1.0, false),
    };
    if let Ok(metrics) = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(width))
        .height(i64::from(height))
        .device_scale_factor(scale_factor)
        .mobile(mobile)
        .build()
    {
        let _ = page.execute(metrics).await;
    }

    let user_agent = device.as_ref().map(|d| d.user_agent.to_string()).or_else(|| config.user_agent.clone());
    if let Some(ua) = user_agent {
        let _ = page
            .execute(SetUserAgentOverrideParams {
                user_agent: ua,
                accept_language: None,
                platform: None,
                user_agent_metadata: None,
            })
            .await;
    }

    if !config.headers.is_empty() {
        if let Ok(value) = serde_json::to_value(&config.headers) {
            let _ = page.execute(SetExtraHttpHeadersParams { headers: Headers(value) }).await;
        }
    }

    if let Some(path) = &config.cookies_file {
        match load_cookies(path).await {
            Ok(cookies) if !cookies.is_empty() => {
                let _ = page.execute(SetCookiesParams { cookies }).await;
            }
            Ok(_) => {}
            Err(e) => log::warn!("failed to load cookies from {}: {e}", path.display()),
        }
    }
}

/// Captures one URL with a fresh tab, returning the referentially-resolved
/// page plus every non-HTML resource the tab loaded along the way.
pub async fn capture(page: Page, requested_url: &str, config: &CrawlConfig) -> Result<PageCaptureResult> {
    let started = Instant::now();
    let resources = std::sync::Arc::new(tokio::sync::Mutex::new(HashMap::new()));
    let sniffer = spawn_response_sniffer(&page, resources.clone())?;

    let reduced_motion = SetEmulatedMediaParams {
        media: None,
        features: Some(vec![chromiumoxide::cdp::browser_protocol::emulation::MediaFeature {
            name: "prefers-reduced-motion".to_string(),
            value: "reduce".to_string(),
        }]),
    };
    let _ = page.execute(reduced_motion).await;

    apply_page_config(&page, config).await;

    let nav_result = navigate(&page, requested_url, config.wait, config.timeout_secs).await;
    let final_url_str = page.url().await.ok().flatten().unwrap_or_else(|| requested_url.to_string());
    if let Err(e) = nav_result {
        if !final_url_str.starts_with("http") {
            sniffer.abort();
            let _ = page.close().await;
            return Err(e);
        }
    }

    tokio::time::sleep(Duration::from_millis(config.wait_time_ms)).await;

    reveal::reveal(&page).await.ok();
    reveal::scroll(&page, 300).await.ok();
    reveal::reveal(&page).await.ok();

    wait_network_idle(&page, 5).await.ok();
    reveal::final_reveal(&page).await.ok();

    let html = page.content().await.context("failed to read page content")?;
    let title = match page.evaluate("document.title").await {
        Ok(result) => match result.into_value::<serde_json::Value>() {
            Ok(serde_json::Value::String(title)) if !title.is_empty() => Some(title),
            _ => None,
        },
        Err(_) => None,
    };
    let final_url = Url::parse(&final_url_str).unwrap_or_else(|_| {
        Url::parse(requested_url).expect("requested_url was validated before capture")
    });

    let extracted = links::extract(&html, &final_url);
    let links_out: Links = extracted.into();

    let screenshot = if config.screenshot {
        let params = CaptureScreenshotParams {
            format: Some(CaptureScreenshotFormat::Png),
            capture_beyond_viewport: Some(true),
            ..Default::default()
        };
        page.screenshot(params).await.ok()
    } else {
        None
    };

    let pdf = if config.pdf {
        page.pdf(PrintToPdfParams::default()).await.ok()
    } else {
        None
    };

    sniffer.abort();
    let resources = resources.lock().await.clone();

    let _ = page.close().await;

    Ok(PageCaptureResult {
        requested_url: requested_url.to_string(),
        final_url: final_url.to_string(),
        html,
        title,
        links: links_out,
        resources,
        screenshot,
        pdf,
        duration: started.elapsed(),
    })
}
