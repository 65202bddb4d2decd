//! Browser-automation side of a capture.
//!
//! Drives one headless Chromium session per capture: launch, optional
//! request interception, navigation with the configured wait policy, clip
//! lookup for the target element, screenshot, teardown. Failures from the
//! engine propagate to the caller unmodified; a capture is never retried.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, ContinueRequestParams, EventRequestPaused, FailRequestParams, FulfillRequestParams,
    HeaderEntry,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, Viewport as CdpViewport,
};
use chromiumoxide::handler::viewport::Viewport as EngineViewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::error::{DomshotError, Result};
use crate::options::{Clip, ImageFormat, LaunchOptions, ResolvedOptions, ScreenshotOptions};
use crate::viewport::Viewport;

/// Metadata of a network request paused for interception.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    pub url: String,
    pub method: String,
}

/// What to do with an intercepted request.
#[derive(Debug, Clone)]
pub enum InterceptDecision {
    /// Let the request hit the network normally.
    Continue,
    /// Fail the request as aborted.
    Abort,
    /// Answer the request without touching the network.
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },
}

/// Per-request interception callback. Invoked on the event-handling task, so
/// it should decide quickly and must not block.
pub type InterceptFn = dyn Fn(&InterceptedRequest) -> InterceptDecision + Send + Sync;

/// Navigates a fresh browser session to `url` and returns the encoded
/// screenshot bytes.
///
/// The session is closed before returning on every path; close failures are
/// ignored since the buffer (or the error) is already decided by then.
pub async fn capture(url: &str, opts: &ResolvedOptions) -> Result<Vec<u8>> {
    let config = build_browser_config(&opts.launch)?;
    let (mut browser, mut handler) = Browser::launch(config).await?;
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = drive_page(&browser, url, opts).await;

    let _ = browser.close().await;
    let _ = browser.wait().await;
    handler_task.abort();

    result
}

async fn drive_page(browser: &Browser, url: &str, opts: &ResolvedOptions) -> Result<Vec<u8>> {
    let page = browser.new_page("about:blank").await?;

    let intercept_task = match opts.intercept.clone() {
        Some(callback) => Some(spawn_interceptor(&page, callback).await?),
        None => None,
    };

    log::debug!("navigating to {url}");
    page.goto(url).await?;
    if opts.wait_until_network_idle {
        page.wait_for_navigation().await?;
    }

    let clip = match &opts.target_selector {
        // A selector with no match is not an error; fall back to whatever
        // clip was configured, possibly none.
        Some(selector) => lookup_clip(&page, selector).await?.or(opts.screenshot.clip),
        None => opts.screenshot.clip,
    };

    let bytes = page
        .screenshot(screenshot_params(&opts.screenshot, clip))
        .await?;

    if let Some(task) = intercept_task {
        task.abort();
    }

    Ok(bytes)
}

fn build_browser_config(launch: &LaunchOptions) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder();

    if launch.headless == Some(false) {
        builder = builder.with_head();
    }
    if launch.sandbox == Some(false) {
        builder = builder.no_sandbox();
    }
    if let Some(executable) = &launch.executable {
        builder = builder.chrome_executable(executable.clone());
    }
    if !launch.args.is_empty() {
        builder = builder.args(launch.args.clone());
    }

    let viewport = launch.default_viewport.unwrap_or_default();
    builder = builder.viewport(engine_viewport(viewport));

    builder
        .build()
        .map_err(|e| DomshotError::capture(format!("invalid launch configuration: {e}")))
}

fn engine_viewport(viewport: Viewport) -> EngineViewport {
    EngineViewport {
        width: viewport.width,
        height: viewport.height,
        ..EngineViewport::default()
    }
}

/// Enables the Fetch domain and spawns the task that resolves every paused
/// request through the user callback. Must run before navigation so the
/// document request itself is routed through the callback too.
async fn spawn_interceptor(page: &Page, callback: Arc<InterceptFn>) -> Result<JoinHandle<()>> {
    page.execute(fetch::EnableParams::default()).await?;
    let mut events = page.event_listener::<EventRequestPaused>().await?;
    let page = page.clone();

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let request = InterceptedRequest {
                url: event.request.url.clone(),
                method: event.request.method.clone(),
            };
            let request_id = event.request_id.clone();

            let outcome = match callback(&request) {
                InterceptDecision::Continue => page
                    .execute(ContinueRequestParams::new(request_id))
                    .await
                    .map(drop),
                InterceptDecision::Abort => page
                    .execute(FailRequestParams::new(request_id, ErrorReason::Aborted))
                    .await
                    .map(drop),
                InterceptDecision::Respond {
                    status,
                    headers,
                    body,
                } => {
                    let headers: Vec<HeaderEntry> = headers
                        .into_iter()
                        .map(|(name, value)| HeaderEntry { name, value })
                        .collect();
                    match FulfillRequestParams::builder()
                        .request_id(request_id)
                        .response_code(i64::from(status))
                        .response_headers(headers)
                        .body(BASE64_STANDARD.encode(&body))
                        .build()
                    {
                        Ok(params) => page.execute(params).await.map(drop),
                        Err(err) => {
                            log::error!("invalid intercept response for {}: {err}", request.url);
                            continue;
                        }
                    }
                }
            };

            if let Err(err) = outcome {
                // Typically the page navigated away mid-flight; nothing to do
                // for this request anymore.
                log::debug!("intercept resolution for {} failed: {err}", request.url);
            }
        }
    }))
}

#[derive(Debug, Deserialize)]
struct ClipLookup {
    clip: Option<Clip>,
}

async fn lookup_clip(page: &Page, selector: &str) -> Result<Option<Clip>> {
    let lookup: ClipLookup = page
        .evaluate(clip_expression(selector)?)
        .await?
        .into_value()?;
    Ok(lookup.clip)
}

/// Builds the in-page lookup for the target element's layout box. The
/// selector is embedded as a JSON string literal so quoting cannot break out
/// of the expression.
fn clip_expression(selector: &str) -> Result<String> {
    let selector_literal = serde_json::to_string(selector)?;
    Ok(format!(
        r#"(() => {{
  const target = document.querySelector({selector_literal});
  if (!target) {{
    return {{ clip: null }};
  }}
  return {{
    clip: {{
      x: target.offsetLeft,
      y: target.offsetTop,
      width: target.offsetWidth,
      height: target.offsetHeight,
    }},
  }};
}})()"#
    ))
}

fn screenshot_params(opts: &ScreenshotOptions, clip: Option<Clip>) -> ScreenshotParams {
    let format = match opts.format.unwrap_or(ImageFormat::Png) {
        ImageFormat::Png => CaptureScreenshotFormat::Png,
        ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
    };

    let mut builder = ScreenshotParams::builder().format(format);
    if let Some(quality) = opts.quality {
        builder = builder.quality(quality);
    }
    if let Some(full_page) = opts.full_page {
        builder = builder.full_page(full_page);
    }
    if let Some(omit_background) = opts.omit_background {
        builder = builder.omit_background(omit_background);
    }
    if let Some(clip) = clip {
        builder = builder.clip(CdpViewport {
            x: clip.x,
            y: clip.y,
            width: clip.width,
            height: clip.height,
            scale: 1.0,
        });
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_expression_embeds_selector_as_string_literal() {
        let expr = clip_expression("#root").unwrap();
        assert!(expr.contains(r##"document.querySelector("#root")"##));
        assert!(expr.contains("offsetLeft"));
        assert!(expr.contains("offsetHeight"));
    }

    #[test]
    fn clip_expression_escapes_quotes_in_selector() {
        let expr = clip_expression(r#"[data-testid="root"]"#).unwrap();
        assert!(expr.contains(r#"querySelector("[data-testid=\"root\"]")"#));
    }

    #[test]
    fn engine_viewport_keeps_dimensions() {
        let vp = engine_viewport(Viewport {
            width: 1024,
            height: 768,
        });
        assert_eq!(vp.width, 1024);
        assert_eq!(vp.height, 768);
    }

    #[test]
    fn clip_lookup_deserializes_missing_element() {
        let lookup: ClipLookup = serde_json::from_str(r#"{ "clip": null }"#).unwrap();
        assert!(lookup.clip.is_none());
    }

    #[test]
    fn clip_lookup_deserializes_layout_box() {
        let lookup: ClipLookup =
            serde_json::from_str(r#"{ "clip": { "x": 0, "y": 0, "width": 50, "height": 50 } }"#)
                .unwrap();
        let clip = lookup.clip.unwrap();
        assert_eq!(clip.width, 50.0);
        assert_eq!(clip.height, 50.0);
    }
}
