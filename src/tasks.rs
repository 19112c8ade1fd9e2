//! The ordered list of browser actions that produces a screenshot.

use crate::device::{Device, DeviceMetricsOverride, ViewportEmulation};
use crate::lifecycle;
use crate::{CaptureRequest, Result, ScreenshotConfig, Session};
use log::{debug, error, warn};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One step of a screenshot run
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Enable the page domain and lifecycle notifications
    EnableLifecycleEvents,
    /// Apply a device profile (user agent, metrics, touch)
    Emulate(Device),
    /// Apply a bare viewport
    EmulateViewport(ViewportEmulation),
    /// Navigate and block until the named lifecycle event fires
    NavigateAndWaitFor { url: String, event: String, timeout: Duration },
    /// Measure the content, stretch the viewport to it and capture a JPEG
    CaptureFullContent { quality: u8 },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::EnableLifecycleEvents => "enable-lifecycle-events",
            Action::Emulate(_) => "emulate-device",
            Action::EmulateViewport(_) => "emulate-viewport",
            Action::NavigateAndWaitFor { .. } => "navigate-and-wait",
            Action::CaptureFullContent { .. } => "capture-full-content",
        }
    }

    async fn run<S: Session>(
        &self,
        session: &S,
        cancel: &CancellationToken,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        match self {
            Action::EnableLifecycleEvents => session.enable_lifecycle_events(),
            Action::Emulate(device) => {
                session.set_user_agent(device.user_agent)?;
                session.set_device_metrics_override(&device.metrics())?;
                session.set_touch_emulation(device.touch)
            }
            Action::EmulateViewport(viewport) => {
                session.set_device_metrics_override(&viewport.metrics())?;
                session.set_touch_emulation(viewport.touch)
            }
            Action::NavigateAndWaitFor { url, event, timeout } => {
                navigate_and_wait_for(session, url, event, cancel, *timeout).await
            }
            Action::CaptureFullContent { quality } => {
                *out = capture_full_content(session, *quality)?;
                Ok(())
            }
        }
    }
}

async fn navigate_and_wait_for<S: Session>(
    session: &S,
    url: &str,
    event: &str,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<()> {
    if !lifecycle::is_known_event(event) {
        warn!("waiting for unknown lifecycle event '{}'", event);
    }
    // Registered before navigating so an early event is not missed.
    let mut subscription = session.lifecycle().subscribe();

    if let Err(e) = session.navigate(url) {
        error!("Error navigating to {} : {}", url, e);
        return Err(e);
    }

    subscription.wait_for(event, cancel, timeout).await?;
    Ok(())
}

fn capture_full_content<S: Session>(session: &S, quality: u8) -> Result<Vec<u8>> {
    let content = session.layout_metrics().map_err(|e| {
        error!("ERROR getting layout metrics : {}", e);
        e
    })?;

    let (width, height) = content.ceil_size();
    debug!("content size {}x{} (raw {}x{})", width, height, content.width, content.height);

    session
        .set_device_metrics_override(&DeviceMetricsOverride::content(width, height))
        .map_err(|e| {
            error!("ERROR doing device metrics override : {}", e);
            e
        })?;

    session
        .capture_screenshot(&CaptureRequest::jpeg(quality, content.clip()))
        .map_err(|e| {
            error!("ERROR capturing screenshot : {}", e);
            e
        })
}

/// An ordered list of actions run against one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tasks(Vec<Action>);

impl Tasks {
    pub fn new(actions: Vec<Action>) -> Self {
        Tasks(actions)
    }

    pub fn actions(&self) -> &[Action] {
        &self.0
    }

    /// Run every action in order, stopping at the first failure.
    ///
    /// `out` is only written by a successful capture step, so on error it
    /// keeps whatever it held before.
    pub async fn run<S: Session>(
        &self,
        session: &S,
        cancel: &CancellationToken,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        for (i, action) in self.0.iter().enumerate() {
            debug!("task {}/{}: {}", i + 1, self.0.len(), action.name());
            action.run(session, cancel, out).await?;
        }
        Ok(())
    }
}

/// Full-content screenshot of `url` with the default device, viewport and
/// lifecycle event.
pub fn full_screenshot(url: &str, quality: u8) -> Tasks {
    screenshot_tasks(&ScreenshotConfig { url: url.to_string(), quality, ..Default::default() })
}

/// The screenshot sequence described by `config`
pub fn screenshot_tasks(config: &ScreenshotConfig) -> Tasks {
    Tasks(vec![
        Action::EnableLifecycleEvents,
        Action::Emulate(config.device.clone()),
        Action::EmulateViewport(config.viewport),
        Action::NavigateAndWaitFor {
            url: config.url.clone(),
            event: config.wait_event.clone(),
            timeout: config.wait_timeout,
        },
        Action::CaptureFullContent { quality: config.quality.min(100) },
    ])
}
