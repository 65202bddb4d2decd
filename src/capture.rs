//! The capture pipeline: resolve options, serve the markup, screenshot it.

use crate::browser;
use crate::debug::dump_markup;
use crate::error::Result;
use crate::options::{self, CaptureOptions};
use crate::server::ContentServer;

/// Renders `html` in headless Chromium and returns the encoded image bytes.
///
/// The markup is whatever the caller's DOM implementation serialized,
/// typically its document element's outer HTML. Options are resolved against
/// the process-wide defaults; see [`crate::options::resolve`].
///
/// The transient content server is closed before this function returns on
/// every path, success or failure, so repeated test runs never accumulate
/// leaked listeners.
pub async fn generate_image(html: &str, options: &CaptureOptions) -> Result<Vec<u8>> {
    let opts = options::resolve(options);

    if opts.debug {
        dump_markup(html);
    }

    // Serving over a real socket (instead of a data: URL or set-content) keeps
    // relative asset paths and request interception working, and costs only a
    // few milliseconds per capture.
    let mut server = ContentServer::start(html, &opts).await?;
    let url = server.url().clone();

    let result = browser::capture(url.as_str(), &opts).await;

    server.close().await;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::options::LaunchOptions;
    use std::path::PathBuf;

    #[tokio::test]
    async fn launch_failure_is_a_capture_error_and_does_not_hang() {
        let options = CaptureOptions {
            launch: LaunchOptions {
                executable: Some(PathBuf::from("/definitely/not/a/browser")),
                ..LaunchOptions::default()
            },
            ..CaptureOptions::default()
        };

        let err = generate_image("<p>hi</p>", &options)
            .await
            .expect_err("launching a missing binary should fail");

        assert_eq!(err.category(), ErrorCategory::Capture);
    }
}
