//! domshot
//!
//! Screenshot testing for server-side DOM. Markup produced by a headless DOM
//! implementation (the kind unit tests render components into) is served over
//! a transient local HTTP endpoint and captured with headless Chromium, so
//! test suites can assert on the pixels of components that never touch a real
//! browser-rendered page.
//!
//! # Module Overview
//!
//! - [`capture`] - the `generate_image` pipeline (resolve, serve, screenshot)
//! - [`options`] - option merging, defaulting, and the process-wide defaults
//! - [`server`] - the per-capture content server on an ephemeral port
//! - [`browser`] - the Chromium session driving one capture
//! - [`debug`] - indented markup dump for troubleshooting
//! - [`error`] - error taxonomy distinguishing config from runtime failures
//!
//! # Example
//!
//! ```no_run
//! use domshot::{generate_image, CaptureOptions};
//!
//! # async fn example() -> domshot::Result<()> {
//! // Markup serialized from the test's DOM, e.g. documentElement.outerHTML.
//! let html = r#"<div id="x" style="width:50px;height:50px;background:blue"></div>"#;
//!
//! let image = generate_image(
//!     html,
//!     &CaptureOptions {
//!         target_selector: Some("#x".to_string()),
//!         ..CaptureOptions::default()
//!     },
//! )
//! .await?;
//!
//! assert!(!image.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod capture;
pub mod debug;
pub mod error;
pub mod options;
pub mod server;
pub mod viewport;

pub use browser::{InterceptDecision, InterceptFn, InterceptedRequest};
pub use capture::generate_image;
pub use debug::{dump_markup, format_markup};
pub use error::{DomshotError, ErrorCategory, ErrorPayload, Result};
pub use options::{
    default_options, resolve, restore_default_options, set_default_options, CaptureOptions, Clip,
    ImageFormat, LaunchOptions, ResolvedOptions, ScreenshotOptions, DISABLE_LCD_TEXT_ARG,
};
pub use server::ContentServer;
pub use viewport::Viewport;
