//! Capture options: merging, defaulting, and the process-wide defaults store.
//!
//! Options are resolved in three layers: the built-in template, the
//! process-wide defaults (set via [`set_default_options`]), and the options
//! passed to a single capture call. Later layers win on conflict; list-like
//! fields merge by appending entries that are not already present instead of
//! being replaced wholesale.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::browser::InterceptFn;
use crate::error::{DomshotError, Result};
use crate::viewport::Viewport;

/// Chromium argument appended on every resolution. LCD text anti-aliasing
/// varies with the host's monitor configuration and makes captures
/// non-reproducible across machines.
pub const DISABLE_LCD_TEXT_ARG: &str = "--disable-lcd-text";

/// Recognized keys forwarded to the browser engine's launch call.
///
/// The set is deliberately non-exhaustive: any Chromium switch not covered by
/// a named field travels through `args` verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchOptions {
    /// Extra command-line switches for the browser process, deduplicated on
    /// merge.
    pub args: Vec<String>,
    /// Viewport applied to every new page. Wins over the top-level
    /// [`CaptureOptions::viewport`] shorthand.
    pub default_viewport: Option<Viewport>,
    /// Browser binary to launch instead of the one found on the system.
    pub executable: Option<PathBuf>,
    /// Headless mode; the engine default (headless) applies when unset.
    pub headless: Option<bool>,
    /// Chromium sandbox; set to `false` in containers that lack the needed
    /// kernel privileges.
    pub sandbox: Option<bool>,
}

/// Output encoding for the capture call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

/// A region of the rendered page to restrict the screenshot to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Recognized keys forwarded to the engine's screenshot call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScreenshotOptions {
    /// Image encoding; PNG when unset.
    pub format: Option<ImageFormat>,
    /// JPEG quality (0-100); ignored for PNG.
    pub quality: Option<i64>,
    /// Capture the full scrollable page instead of the viewport.
    pub full_page: Option<bool>,
    /// Hide the default white page background (transparent PNGs).
    pub omit_background: Option<bool>,
    /// Capture region. Overridden by a matched `target_selector`.
    pub clip: Option<Clip>,
}

/// User-supplied capture configuration.
///
/// Every field is optional; unset fields fall back to the process-wide
/// defaults and then to the built-in template. See [`resolve`] for the exact
/// precedence rules.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureOptions {
    /// Forwarded to the browser launch call.
    pub launch: LaunchOptions,
    /// Forwarded to the screenshot call.
    pub screenshot: ScreenshotOptions,
    /// Directories served as static content next to the markup, in order;
    /// the first directory containing a requested file wins.
    #[serde(deserialize_with = "deserialize_serve")]
    pub serve: Vec<PathBuf>,
    /// Dump the markup to stdout before capturing.
    pub debug: Option<bool>,
    /// Shorthand for `launch.default_viewport`; the explicit launch value
    /// wins when both are present.
    pub viewport: Option<Viewport>,
    /// CSS selector of the element whose layout box becomes the clip region.
    pub target_selector: Option<String>,
    /// Wait for the engine's network-idle lifecycle instead of returning at
    /// document load.
    #[serde(alias = "waitForResources")]
    pub wait_until_network_idle: Option<bool>,
    /// Per-request interception callback; enabling it routes every page
    /// request through the Fetch domain.
    #[serde(skip)]
    pub intercept: Option<Arc<InterceptFn>>,
}

impl std::fmt::Debug for CaptureOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOptions")
            .field("launch", &self.launch)
            .field("screenshot", &self.screenshot)
            .field("serve", &self.serve)
            .field("debug", &self.debug)
            .field("viewport", &self.viewport)
            .field("target_selector", &self.target_selector)
            .field("wait_until_network_idle", &self.wait_until_network_idle)
            .field("intercept", &self.intercept.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

fn deserialize_serve<'de, D>(deserializer: D) -> std::result::Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<PathBuf>::deserialize(deserializer)
        .map_err(|_| serde::de::Error::custom("options.serve must be an array of directories"))
}

impl CaptureOptions {
    /// Deserializes options from a JSON value, mapping shape mismatches to a
    /// configuration error before any resource is allocated.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| DomshotError::config(format!("invalid options: {e}")))
    }

    /// Deserializes options from a TOML document (the CLI's `--config` file).
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| DomshotError::config(format!("invalid options: {e}")))
    }

    /// Overlays `self` on top of `base`, with `self` winning on conflict.
    ///
    /// Scalar fields take the overlay value when set; `launch.args` and
    /// `serve` keep the base entries and append overlay entries that are not
    /// already present.
    pub fn merged_over(self, base: CaptureOptions) -> CaptureOptions {
        let mut serve = base.serve;
        for dir in self.serve {
            if !serve.contains(&dir) {
                serve.push(dir);
            }
        }

        CaptureOptions {
            launch: self.launch.merged_over(base.launch),
            screenshot: self.screenshot.merged_over(base.screenshot),
            serve,
            debug: self.debug.or(base.debug),
            viewport: self.viewport.or(base.viewport),
            target_selector: self.target_selector.or(base.target_selector),
            wait_until_network_idle: self.wait_until_network_idle.or(base.wait_until_network_idle),
            intercept: self.intercept.or(base.intercept),
        }
    }
}

impl LaunchOptions {
    fn merged_over(self, base: LaunchOptions) -> LaunchOptions {
        let mut args = base.args;
        for arg in self.args {
            push_unique_arg(&mut args, &arg);
        }

        LaunchOptions {
            args,
            default_viewport: self.default_viewport.or(base.default_viewport),
            executable: self.executable.or(base.executable),
            headless: self.headless.or(base.headless),
            sandbox: self.sandbox.or(base.sandbox),
        }
    }
}

impl ScreenshotOptions {
    fn merged_over(self, base: ScreenshotOptions) -> ScreenshotOptions {
        ScreenshotOptions {
            format: self.format.or(base.format),
            quality: self.quality.or(base.quality),
            full_page: self.full_page.or(base.full_page),
            omit_background: self.omit_background.or(base.omit_background),
            clip: self.clip.or(base.clip),
        }
    }
}

fn push_unique_arg(args: &mut Vec<String>, arg: &str) {
    if !args.iter().any(|existing| existing == arg) {
        args.push(arg.to_string());
    }
}

/// Fully resolved configuration consumed by the content server and the
/// capture orchestrator.
#[derive(Clone)]
pub struct ResolvedOptions {
    pub launch: LaunchOptions,
    pub screenshot: ScreenshotOptions,
    pub serve: Vec<PathBuf>,
    pub debug: bool,
    pub target_selector: Option<String>,
    pub wait_until_network_idle: bool,
    pub intercept: Option<Arc<InterceptFn>>,
}

impl std::fmt::Debug for ResolvedOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedOptions")
            .field("launch", &self.launch)
            .field("screenshot", &self.screenshot)
            .field("serve", &self.serve)
            .field("debug", &self.debug)
            .field("target_selector", &self.target_selector)
            .field("wait_until_network_idle", &self.wait_until_network_idle)
            .field("intercept", &self.intercept.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

static DEFAULT_OPTIONS: LazyLock<RwLock<CaptureOptions>> =
    LazyLock::new(|| RwLock::new(CaptureOptions::default()));

/// Replaces the process-wide default options. The given options are merged
/// over the built-in template, so a partial set only overrides what it names.
///
/// Intended for suite setup; pair with [`restore_default_options`] in suite
/// teardown. Callers must serialize these calls relative to concurrent
/// captures themselves.
pub fn set_default_options(options: CaptureOptions) {
    let merged = options.merged_over(CaptureOptions::default());
    *DEFAULT_OPTIONS
        .write()
        .unwrap_or_else(PoisonError::into_inner) = merged;
}

/// Resets the process-wide defaults to the built-in template.
pub fn restore_default_options() {
    *DEFAULT_OPTIONS
        .write()
        .unwrap_or_else(PoisonError::into_inner) = CaptureOptions::default();
}

/// Snapshot of the current process-wide defaults.
pub fn default_options() -> CaptureOptions {
    DEFAULT_OPTIONS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Resolves user options against the process-wide defaults.
///
/// The input is never mutated; resolution works on a merged copy. After the
/// merge, the anti-aliasing standardization switch is appended once and the
/// `viewport` shorthand is copied into `launch.default_viewport` unless an
/// explicit launch viewport already won.
pub fn resolve(user: &CaptureOptions) -> ResolvedOptions {
    resolve_with(default_options(), user)
}

fn resolve_with(defaults: CaptureOptions, user: &CaptureOptions) -> ResolvedOptions {
    let CaptureOptions {
        mut launch,
        screenshot,
        serve,
        debug,
        viewport,
        target_selector,
        wait_until_network_idle,
        intercept,
    } = user.clone().merged_over(defaults);

    push_unique_arg(&mut launch.args, DISABLE_LCD_TEXT_ARG);

    if launch.default_viewport.is_none() {
        launch.default_viewport = viewport;
    }

    ResolvedOptions {
        launch,
        screenshot,
        serve,
        debug: debug.unwrap_or(false),
        target_selector,
        wait_until_network_idle: wait_until_network_idle.unwrap_or(false),
        intercept,
    }
}
