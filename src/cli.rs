//! Command line options

use crate::device::Device;
use crate::{clamp_quality, Error, Result, ScreenshotConfig};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Take a full-content JPEG screenshot of a web page.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// url you want to get screenshot
    #[clap(long, default_value = crate::DEFAULT_URL)]
    pub url: String,
    /// filename to save screenshot
    #[clap(long, default_value = crate::DEFAULT_FILENAME)]
    pub filename: PathBuf,
    /// JPEG quality, clamped to 0..=100
    #[clap(long, default_value_t = crate::DEFAULT_QUALITY as i64, allow_negative_numbers = true)]
    pub quality: i64,
    /// Lifecycle event to wait for before capturing (e.g. load, networkIdle)
    #[clap(long, default_value = crate::lifecycle::NETWORK_IDLE)]
    pub event: String,
    /// Seconds to wait for the lifecycle event
    #[clap(long, default_value_t = 60)]
    pub timeout: u64,
    /// Device profile: ipad, ipad-landscape, ipad-pro, ipad-pro-landscape
    #[clap(long, default_value = "ipad")]
    pub device: String,
    /// Log every step
    #[clap(short, long)]
    pub verbose: bool,
}

const LONG_FLAGS: [&str; 6] = ["url", "filename", "quality", "event", "timeout", "device"];

/// Rewrite single-dash long flags (`-url=x`, `-filename x`) to the double
/// dash form clap expects. Anything else is passed through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            match arg.to_str() {
                Some(s) if s.starts_with('-') && !s.starts_with("--") => {
                    let name = s[1..].split('=').next().unwrap_or_default();
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", s))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

impl Cli {
    /// Parse process arguments, accepting Go-style `-flag` long options
    pub fn parse_normalized() -> Self {
        Cli::parse_from(normalize_args(std::env::args_os()))
    }

    /// Build the immutable run configuration
    pub fn into_config(self) -> Result<ScreenshotConfig> {
        let device = Device::by_name(&self.device).ok_or_else(|| {
            Error::ConfigError(format!(
                "unknown device '{}', expected one of {}",
                self.device,
                Device::preset_names().join(", ")
            ))
        })?;

        let config = ScreenshotConfig {
            url: self.url,
            filename: self.filename,
            quality: clamp_quality(self.quality),
            wait_event: self.event,
            wait_timeout: Duration::from_secs(self.timeout),
            device,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(normalize_args(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse(&["pageshot"]).into_config().unwrap();
        assert_eq!(config.url, "https://carto.lausanne.ch/");
        assert_eq!(config.filename, PathBuf::from("screenshot.jpg"));
        assert_eq!(config.quality, 90);
        assert_eq!(config.wait_event, "networkIdle");
        assert_eq!(config.wait_timeout, Duration::from_secs(60));
    }

    #[test]
    fn go_style_flags() {
        let cli = parse(&["pageshot", "-url=https://example.com", "-filename", "out.jpg"]);
        assert_eq!(cli.url, "https://example.com");
        assert_eq!(cli.filename, PathBuf::from("out.jpg"));
    }

    #[test]
    fn double_dash_still_works() {
        let cli = parse(&["pageshot", "--url", "https://example.org", "--quality=50", "-v"]);
        assert_eq!(cli.url, "https://example.org");
        assert_eq!(cli.quality, 50);
        assert!(cli.verbose);
    }

    #[test]
    fn normalize_leaves_values_and_short_flags() {
        let out = normalize_args(["pageshot", "-v", "-", "-urlx", "-event=load"]);
        let out: Vec<_> = out.iter().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(out, ["pageshot", "-v", "-", "-urlx", "--event=load"]);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(parse(&["pageshot", "-quality=150"]).into_config().unwrap().quality, 100);
        assert_eq!(parse(&["pageshot", "-quality=-3"]).into_config().unwrap().quality, 0);
    }

    #[test]
    fn unknown_device_is_a_config_error() {
        let err = parse(&["pageshot", "-device=fridge"]).into_config().unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
