//! Live runs against headless Chrome

#![cfg(feature = "cdp")]

use pageshot::cdp::CdpSession;
use pageshot::{app, full_screenshot, ScreenshotConfig, Session};
use std::sync::Once;
use tiny_http::{Response, Server};
use tokio_util::sync::CancellationToken;

static INIT: Once = Once::new();

/// Start a simple test HTTP server
fn start_test_server() -> String {
    INIT.call_once(|| {
        std::thread::spawn(|| {
            let server = Server::http("127.0.0.1:18081").unwrap();
            for request in server.incoming_requests() {
                let path = request.url().to_string();
                let response = match path.as_str() {
                    "/" => Response::from_string(
                        r#"<!DOCTYPE html>
<html>
<head><title>Test Page</title></head>
<body style="margin:0">
<div style="width:900px;height:1500px;background:#c33">tall page</div>
</body>
</html>"#,
                    )
                    .with_header(
                        "Content-Type: text/html; charset=utf-8"
                            .parse::<tiny_http::Header>()
                            .unwrap(),
                    ),
                    _ => Response::from_string("Not Found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        // Give the server time to start
        std::thread::sleep(std::time::Duration::from_millis(100));
    });

    "http://127.0.0.1:18081/".to_string()
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Chrome to be installed
async fn test_full_content_jpeg() {
    let url = start_test_server();
    let config = ScreenshotConfig { url: url.clone(), ..Default::default() };
    let session = CdpSession::new(&config).expect("Failed to launch browser");

    let mut buf = Vec::new();
    full_screenshot(&url, 90)
        .run(&session, &CancellationToken::new(), &mut buf)
        .await
        .expect("screenshot failed");

    assert!(buf.len() > 100, "JPEG data seems too small");
    // JPEG files start with an SOI marker
    assert_eq!(&buf[0..2], &[0xff, 0xd8]);

    let content = session.layout_metrics().unwrap();
    assert!(content.height >= 1500.0);

    session.close().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Chrome to be installed
async fn test_run_writes_file() {
    let url = start_test_server();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("live.jpg");
    let config = ScreenshotConfig { url, filename: out.clone(), ..Default::default() };
    let session = CdpSession::new(&config).expect("Failed to launch browser");

    app::run(&config, &session, &CancellationToken::new()).await.expect("run failed");
    session.close().unwrap();

    let data = std::fs::read(&out).unwrap();
    assert_eq!(&data[0..2], &[0xff, 0xd8]);
}
