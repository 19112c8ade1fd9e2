//! pageshot
//!
//! Full-content JPEG screenshots of web pages over the Chrome DevTools
//! Protocol. A run opens a [`Session`], enables page lifecycle
//! notifications, emulates a tablet, navigates and waits for a lifecycle
//! event (by default `networkIdle`), measures the page content, stretches
//! the device metrics to that size and captures a JPEG clipped to it.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # async fn demo() -> pageshot::Result<()> {
//! use pageshot::{cdp::CdpSession, ScreenshotConfig, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ScreenshotConfig {
//!     url: "https://example.com".to_string(),
//!     ..Default::default()
//! };
//! let session = CdpSession::new(&config)?;
//! let path = pageshot::app::run(&config, &session, &CancellationToken::new()).await?;
//! println!("saved {}", path.display());
//! session.close()?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod error;
pub use error::{Error, Result};

pub mod app;
pub mod cli;
pub mod device;
pub mod lifecycle;
pub mod stub;
pub mod tasks;

// CDP backend over headless Chrome
#[cfg(feature = "cdp")]
pub mod cdp;

pub use device::{Device, DeviceMetricsOverride, ViewportEmulation};
pub use lifecycle::{LifecycleBus, LifecycleEvent, Subscription};
pub use tasks::{full_screenshot, Action, Tasks};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_DATE: &str = "27-10-2020";

pub const DEFAULT_URL: &str = "https://carto.lausanne.ch/";
pub const DEFAULT_FILENAME: &str = "screenshot.jpg";
pub const DEFAULT_QUALITY: u8 = 90;

/// Configuration for one screenshot run
///
/// Built once at startup (usually from [`cli::Cli`]) and never mutated.
///
/// # Examples
///
/// ```
/// let cfg = pageshot::ScreenshotConfig::default();
/// assert_eq!(cfg.url, "https://carto.lausanne.ch/");
/// assert_eq!(cfg.quality, 90);
/// ```
#[derive(Debug, Clone)]
pub struct ScreenshotConfig {
    /// Page to capture
    pub url: String,
    /// Where the JPEG is written
    pub filename: PathBuf,
    /// JPEG quality, 0 to 100
    pub quality: u8,
    /// Lifecycle event that marks the page as settled
    pub wait_event: String,
    /// Upper bound on the lifecycle wait
    pub wait_timeout: Duration,
    /// Device profile emulated before navigating
    pub device: Device,
    /// Viewport applied on top of the device profile
    pub viewport: ViewportEmulation,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            filename: PathBuf::from(DEFAULT_FILENAME),
            quality: DEFAULT_QUALITY,
            wait_event: lifecycle::NETWORK_IDLE.to_string(),
            wait_timeout: lifecycle::WAIT_TIMEOUT,
            device: device::IPAD,
            viewport: ViewportEmulation::new(1024, 768).with_scale(2.0),
        }
    }
}

impl ScreenshotConfig {
    /// Check the URL is absolute and the output path non-empty
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.url)
            .map_err(|e| Error::ConfigError(format!("invalid url '{}': {}", self.url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::ConfigError(format!("url '{}' is not absolute", self.url)));
        }
        if self.filename.as_os_str().is_empty() {
            return Err(Error::ConfigError("empty output filename".into()));
        }
        Ok(())
    }
}

/// Clamp a requested JPEG quality into the accepted `[0, 100]` range
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(0, 100) as u8
}

/// Rectangle covering the full scrollable page content
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContentGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ContentGeometry {
    /// Width and height rounded up to whole pixels
    pub fn ceil_size(&self) -> (u32, u32) {
        (self.width.ceil() as u32, self.height.ceil() as u32)
    }

    /// Screenshot clip covering this rectangle at scale 1
    pub fn clip(&self) -> Clip {
        Clip { x: self.x, y: self.y, width: self.width, height: self.height, scale: 1.0 }
    }
}

/// Region passed to the capture command
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
}

/// Parameters of a screenshot capture
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRequest {
    pub format: ImageFormat,
    /// Only meaningful for JPEG
    pub quality: Option<u8>,
    pub clip: Option<Clip>,
}

impl CaptureRequest {
    pub fn jpeg(quality: u8, clip: Clip) -> Self {
        CaptureRequest { format: ImageFormat::Jpeg, quality: Some(quality.min(100)), clip: Some(clip) }
    }
}

/// A live browser-control connection
///
/// Implementations issue one protocol command per method and publish every
/// page lifecycle notification into [`Session::lifecycle`]. Methods block
/// until the browser answers.
pub trait Session {
    /// Bus receiving the page's lifecycle notifications
    fn lifecycle(&self) -> &LifecycleBus;

    /// Enable the page domain and lifecycle event reporting
    fn enable_lifecycle_events(&self) -> Result<()>;

    /// Override the user agent string
    fn set_user_agent(&self, user_agent: &str) -> Result<()>;

    /// Force the reported viewport/device size
    fn set_device_metrics_override(&self, metrics: &DeviceMetricsOverride) -> Result<()>;

    /// Toggle touch event emulation
    fn set_touch_emulation(&self, enabled: bool) -> Result<()>;

    /// Start navigating to `url`; returns once the browser accepted it
    fn navigate(&self, url: &str) -> Result<()>;

    /// Current content geometry of the page
    fn layout_metrics(&self) -> Result<ContentGeometry>;

    /// Capture a screenshot and return the encoded bytes
    fn capture_screenshot(&self, request: &CaptureRequest) -> Result<Vec<u8>>;

    /// Release the browser
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScreenshotConfig::default();
        assert_eq!(config.filename, PathBuf::from("screenshot.jpg"));
        assert_eq!(config.wait_event, "networkIdle");
        assert_eq!(config.wait_timeout, Duration::from_secs(60));
        assert_eq!(config.device.name, "iPad");
        assert_eq!((config.viewport.width, config.viewport.height), (1024, 768));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn relative_url_is_rejected() {
        let config = ScreenshotConfig { url: "example.com/page".into(), ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let config = ScreenshotConfig { url: "mailto:me@example.com".into(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ceil_not_round() {
        let g = ContentGeometry { x: 0.0, y: 0.0, width: 799.2, height: 600.0 };
        assert_eq!(g.ceil_size(), (800, 600));
        let g = ContentGeometry { x: 0.0, y: 0.0, width: 500.5, height: 300.01 };
        assert_eq!(g.ceil_size(), (501, 301));
    }

    #[test]
    fn clip_keeps_raw_geometry() {
        let g = ContentGeometry { x: 0.0, y: 0.0, width: 500.5, height: 300.0 };
        assert_eq!(g.clip(), Clip { x: 0.0, y: 0.0, width: 500.5, height: 300.0, scale: 1.0 });
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(clamp_quality(90), 90);
        assert_eq!(clamp_quality(-5), 0);
        assert_eq!(clamp_quality(250), 100);
        assert_eq!(CaptureRequest::jpeg(120, ContentGeometry { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }.clip()).quality, Some(100));
    }
}
