//! Chrome DevTools Protocol session over headless Chrome

use crate::device::DeviceMetricsOverride;
use crate::lifecycle::{LifecycleBus, LifecycleEvent};
use crate::{CaptureRequest, ContentGeometry, Error, ImageFormat, Result, ScreenshotConfig, Session};
use headless_chrome::browser::tab::{EventListener, Tab};
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, Weak};
use std::time::Duration;

type Listener = dyn EventListener<Event> + Send + Sync;

/// Headless Chrome session with a single tab
///
/// Every `Page.lifecycleEvent` the tab receives is forwarded to the
/// session's [`LifecycleBus`]. Dropping the session kills the browser.
pub struct CdpSession {
    browser: Browser,
    tab: Arc<Tab>,
    bus: LifecycleBus,
    listener: Weak<Listener>,
}

impl CdpSession {
    /// Launch Chrome and open the tab the run works in
    pub fn new(config: &ScreenshotConfig) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            // The connection must outlive the longest lifecycle wait.
            .idle_browser_timeout(config.wait_timeout + Duration::from_secs(30))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::InitializationError(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::InitializationError(format!("Failed to create tab: {}", e)))?;

        let bus = LifecycleBus::new();
        let publisher = bus.clone();
        let listener = tab
            .add_event_listener(Arc::new(move |event: &Event| {
                if let Event::PageLifecycleEvent(ev) = event {
                    publisher.publish(LifecycleEvent {
                        name: ev.params.name.clone(),
                        frame_id: ev.params.frame_id.clone(),
                        loader_id: ev.params.loader_id.clone(),
                    });
                }
            }))
            .map_err(|e| Error::InitializationError(format!("Failed to register lifecycle listener: {}", e)))?;

        info!("browser session ready");
        Ok(Self { browser, tab, bus, listener })
    }
}

// Built from the wire form so optional fields stay unset whatever the
// protocol revision.
fn params<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::CdpError(format!("invalid protocol parameters: {}", e)))
}

/// Content rectangle in CSS pixels; `contentSize` is scaled by the
/// emulated device scale factor.
fn content_geometry(metrics: &Page::GetLayoutMetricsReturnObject) -> ContentGeometry {
    let size = &metrics.css_content_size;
    ContentGeometry { x: size.x, y: size.y, width: size.width, height: size.height }
}

impl Session for CdpSession {
    fn lifecycle(&self) -> &LifecycleBus {
        &self.bus
    }

    fn enable_lifecycle_events(&self) -> Result<()> {
        self.tab
            .call_method(params::<Page::Enable>(json!({}))?)
            .map_err(|e| Error::InitializationError(format!("Page.enable failed: {}", e)))?;
        self.tab
            .call_method(params::<Page::SetLifecycleEventsEnabled>(json!({ "enabled": true }))?)
            .map_err(|e| Error::InitializationError(format!("Page.setLifecycleEventsEnabled failed: {}", e)))?;
        Ok(())
    }

    fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        self.tab
            .set_user_agent(user_agent, None, None)
            .map_err(|e| Error::EmulationError(format!("Failed to set user agent: {}", e)))?;
        Ok(())
    }

    fn set_device_metrics_override(&self, metrics: &DeviceMetricsOverride) -> Result<()> {
        let wire = serde_json::to_value(metrics)
            .map_err(|e| Error::EmulationError(format!("Failed to encode metrics: {}", e)))?;
        self.tab
            .call_method(params::<Emulation::SetDeviceMetricsOverride>(wire)?)
            .map_err(|e| Error::EmulationError(format!("Emulation.setDeviceMetricsOverride failed: {}", e)))?;
        Ok(())
    }

    fn set_touch_emulation(&self, enabled: bool) -> Result<()> {
        self.tab
            .call_method(params::<Emulation::SetTouchEmulationEnabled>(json!({ "enabled": enabled }))?)
            .map_err(|e| Error::EmulationError(format!("Emulation.setTouchEmulationEnabled failed: {}", e)))?;
        Ok(())
    }

    fn navigate(&self, url: &str) -> Result<()> {
        debug!("navigating to {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;
        Ok(())
    }

    fn layout_metrics(&self) -> Result<ContentGeometry> {
        let metrics = self
            .tab
            .call_method(params::<Page::GetLayoutMetrics>(json!({}))?)
            .map_err(|e| Error::MetricsError(format!("Page.getLayoutMetrics failed: {}", e)))?;
        Ok(content_geometry(&metrics))
    }

    fn capture_screenshot(&self, request: &CaptureRequest) -> Result<Vec<u8>> {
        let format = match request.format {
            ImageFormat::Jpeg => Page::CaptureScreenshotFormatOption::Jpeg,
        };
        let clip = request.clip.map(|c| Page::Viewport {
            x: c.x,
            y: c.y,
            width: c.width,
            height: c.height,
            scale: c.scale,
        });

        let data = self
            .tab
            .capture_screenshot(format, request.quality.map(u32::from), clip, true)
            .map_err(|e| Error::RenderError(format!("Screenshot failed: {}", e)))?;
        Ok(data)
    }

    fn close(self) -> Result<()> {
        self.bus.close();
        if let Err(e) = self.tab.remove_event_listener(&self.listener) {
            debug!("failed to remove lifecycle listener: {}", e);
        }
        // Dropping the browser terminates the child process.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
