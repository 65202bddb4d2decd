//! End-to-end captures against a real Chromium install.
//!
//! These drive the full pipeline (resolve, content server, browser,
//! screenshot) and therefore need a launchable Chromium on the machine.
//! Run them explicitly with: cargo test -- --ignored

use std::fs;
use std::sync::Arc;

use domshot::{
    generate_image, CaptureOptions, Clip, InterceptDecision, InterceptedRequest, LaunchOptions,
    ScreenshotOptions, Viewport,
};
use tempfile::tempdir;

fn chrome_options() -> CaptureOptions {
    CaptureOptions {
        launch: LaunchOptions {
            // CI containers usually lack the privileges Chromium's sandbox
            // needs.
            sandbox: Some(false),
            ..LaunchOptions::default()
        },
        ..CaptureOptions::default()
    }
}

#[tokio::test]
#[ignore]
async fn capture_matches_the_default_viewport() {
    let image = generate_image("<p>hello</p>", &chrome_options())
        .await
        .expect("capture should succeed");
    assert!(!image.is_empty());

    let decoded = image::load_from_memory(&image).expect("capture should be a decodable image");
    assert_eq!(decoded.width(), 800);
    assert_eq!(decoded.height(), 600);
}

#[tokio::test]
#[ignore]
async fn viewport_shorthand_controls_capture_dimensions() {
    let options = CaptureOptions {
        viewport: Some(Viewport {
            width: 640,
            height: 480,
        }),
        ..chrome_options()
    };

    let image = generate_image("<p>sized</p>", &options).await.unwrap();
    let decoded = image::load_from_memory(&image).unwrap();
    assert_eq!(decoded.width(), 640);
    assert_eq!(decoded.height(), 480);
}

#[tokio::test]
#[ignore]
async fn target_selector_clips_to_the_element_box() {
    let html = r#"<html><body style="margin:0">
        <div id="x" style="width:50px;height:50px;background:blue"></div>
    </body></html>"#;
    let options = CaptureOptions {
        target_selector: Some("#x".to_string()),
        ..chrome_options()
    };

    let image = generate_image(html, &options).await.unwrap();
    let decoded = image::load_from_memory(&image).unwrap();
    assert_eq!(decoded.width(), 50);
    assert_eq!(decoded.height(), 50);
}

#[tokio::test]
#[ignore]
async fn missing_target_falls_back_to_the_configured_clip() {
    let options = CaptureOptions {
        target_selector: Some("#does-not-exist".to_string()),
        screenshot: ScreenshotOptions {
            clip: Some(Clip {
                x: 0.0,
                y: 0.0,
                width: 40.0,
                height: 30.0,
            }),
            ..ScreenshotOptions::default()
        },
        ..chrome_options()
    };

    let image = generate_image("<p>fallback</p>", &options).await.unwrap();
    let decoded = image::load_from_memory(&image).unwrap();
    assert_eq!(decoded.width(), 40);
    assert_eq!(decoded.height(), 30);
}

#[tokio::test]
#[ignore]
async fn concurrent_captures_do_not_interfere() {
    let opts_a = chrome_options();
    let opts_b = chrome_options();
    let (a, b) = tokio::join!(
        generate_image("<p>first</p>", &opts_a),
        generate_image("<p>second</p>", &opts_b),
    );

    let a = a.expect("first capture should succeed");
    let b = b.expect("second capture should succeed");
    assert!(!a.is_empty());
    assert!(!b.is_empty());
}

#[tokio::test]
#[ignore]
async fn static_assets_resolve_during_capture() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("style.css"),
        "body { background: rgb(255, 0, 0); margin: 0; }",
    )
    .unwrap();

    let html = r#"<html><head><link rel="stylesheet" href="/style.css"></head>
        <body><p>styled</p></body></html>"#;
    let options = CaptureOptions {
        serve: vec![dir.path().to_path_buf()],
        wait_until_network_idle: Some(true),
        ..chrome_options()
    };

    let image = generate_image(html, &options).await.unwrap();
    let decoded = image::load_from_memory(&image).unwrap().to_rgba8();
    let corner = decoded.get_pixel(1, 1);
    assert_eq!(corner.0[0], 255, "stylesheet background should have applied");
    assert_eq!(corner.0[1], 0);
}

#[tokio::test]
#[ignore]
async fn intercept_can_stub_an_asset_response() {
    let html = r#"<html><head><link rel="stylesheet" href="/app.css"></head>
        <body style="margin:0"><p>stubbed</p></body></html>"#;

    let intercept = Arc::new(|request: &InterceptedRequest| {
        if request.url.ends_with("/app.css") {
            InterceptDecision::Respond {
                status: 200,
                headers: vec![("content-type".to_string(), "text/css".to_string())],
                body: b"body { background: rgb(0, 255, 0); }".to_vec(),
            }
        } else {
            InterceptDecision::Continue
        }
    });

    let options = CaptureOptions {
        wait_until_network_idle: Some(true),
        intercept: Some(intercept),
        ..chrome_options()
    };

    let image = generate_image(html, &options).await.unwrap();
    let decoded = image::load_from_memory(&image).unwrap().to_rgba8();
    let corner = decoded.get_pixel(1, 1);
    assert_eq!(corner.0[1], 255, "stubbed stylesheet should have applied");
}

#[tokio::test]
#[ignore]
async fn intercept_abort_blocks_an_asset_without_failing_the_capture() {
    let html = r#"<html><body><img src="/missing.png"><p>still here</p></body></html>"#;

    let intercept = Arc::new(|request: &InterceptedRequest| {
        if request.url.ends_with(".png") {
            InterceptDecision::Abort
        } else {
            InterceptDecision::Continue
        }
    });

    let options = CaptureOptions {
        intercept: Some(intercept),
        ..chrome_options()
    };

    let image = generate_image(html, &options).await.unwrap();
    assert!(!image.is_empty());
}
