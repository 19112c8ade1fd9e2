//! In-memory session that records calls, for tests and dry runs.

use crate::device::DeviceMetricsOverride;
use crate::lifecycle::{LifecycleBus, LifecycleEvent};
use crate::{CaptureRequest, ContentGeometry, Error, Result, Session};
use std::sync::{Mutex, PoisonError};

/// A call received by [`RecordingSession`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    EnableLifecycleEvents,
    SetUserAgent(String),
    SetDeviceMetricsOverride(DeviceMetricsOverride),
    SetTouchEmulation(bool),
    Navigate(String),
    LayoutMetrics,
    CaptureScreenshot(CaptureRequest),
}

/// A session step that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    EnableLifecycleEvents,
    Emulation,
    Navigate,
    LayoutMetrics,
    CaptureScreenshot,
}

/// Session that answers from canned data and records every call
///
/// Navigating publishes the configured lifecycle events, in order, on the
/// session's bus.
pub struct RecordingSession {
    bus: LifecycleBus,
    events: Vec<String>,
    content: ContentGeometry,
    screenshot: Vec<u8>,
    fail_at: Option<Step>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingSession {
    pub fn new() -> Self {
        RecordingSession {
            bus: LifecycleBus::new(),
            events: Vec::new(),
            content: ContentGeometry { x: 0.0, y: 0.0, width: 1024.0, height: 768.0 },
            screenshot: vec![0xff, 0xd8, 0xff, 0xe0],
            fail_at: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Lifecycle events emitted when `navigate` is called
    pub fn with_events(mut self, names: &[&str]) -> Self {
        self.events = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_content(mut self, content: ContentGeometry) -> Self {
        self.content = content;
        self
    }

    pub fn with_screenshot(mut self, bytes: Vec<u8>) -> Self {
        self.screenshot = bytes;
        self
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The most recent capture request, if any
    pub fn last_capture(&self) -> Option<CaptureRequest> {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.iter().rev().find_map(|c| match c {
            Call::CaptureScreenshot(req) => Some(req.clone()),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    fn check(&self, step: Step, err: fn(String) -> Error) -> Result<()> {
        if self.fail_at == Some(step) {
            return Err(err(format!("{:?} failed (stub)", step)));
        }
        Ok(())
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for RecordingSession {
    fn lifecycle(&self) -> &LifecycleBus {
        &self.bus
    }

    fn enable_lifecycle_events(&self) -> Result<()> {
        self.record(Call::EnableLifecycleEvents);
        self.check(Step::EnableLifecycleEvents, Error::InitializationError)
    }

    fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.record(Call::SetUserAgent(user_agent.to_string()));
        self.check(Step::Emulation, Error::EmulationError)
    }

    fn set_device_metrics_override(&self, metrics: &DeviceMetricsOverride) -> Result<()> {
        self.record(Call::SetDeviceMetricsOverride(metrics.clone()));
        self.check(Step::Emulation, Error::EmulationError)
    }

    fn set_touch_emulation(&self, enabled: bool) -> Result<()> {
        self.record(Call::SetTouchEmulation(enabled));
        self.check(Step::Emulation, Error::EmulationError)
    }

    fn navigate(&self, url: &str) -> Result<()> {
        self.record(Call::Navigate(url.to_string()));
        self.check(Step::Navigate, Error::LoadError)?;
        for name in &self.events {
            self.bus.publish(LifecycleEvent::named(name));
        }
        Ok(())
    }

    fn layout_metrics(&self) -> Result<ContentGeometry> {
        self.record(Call::LayoutMetrics);
        self.check(Step::LayoutMetrics, Error::MetricsError)?;
        Ok(self.content)
    }

    fn capture_screenshot(&self, request: &CaptureRequest) -> Result<Vec<u8>> {
        self.record(Call::CaptureScreenshot(request.clone()));
        self.check(Step::CaptureScreenshot, Error::RenderError)?;
        Ok(self.screenshot.clone())
    }

    fn close(self) -> Result<()> {
        self.bus.close();
        Ok(())
    }
}
