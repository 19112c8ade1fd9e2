//! Device profiles and viewport emulation parameters

/// A device profile applied through user agent, metrics and touch emulation
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub landscape: bool,
    pub mobile: bool,
    pub touch: bool,
}

const IPAD_UA: &str = "Mozilla/5.0 (iPad; CPU OS 11_0 like Mac OS X) AppleWebKit/604.1.34 (KHTML, like Gecko) Version/11.0 Mobile/15A5341f Safari/604.1";

pub const IPAD: Device = Device {
    name: "iPad",
    user_agent: IPAD_UA,
    width: 768,
    height: 1024,
    scale: 2.0,
    landscape: false,
    mobile: true,
    touch: true,
};

pub const IPAD_LANDSCAPE: Device = Device {
    name: "iPad landscape",
    user_agent: IPAD_UA,
    width: 1024,
    height: 768,
    scale: 2.0,
    landscape: true,
    mobile: true,
    touch: true,
};

pub const IPAD_PRO: Device = Device {
    name: "iPad Pro",
    user_agent: IPAD_UA,
    width: 1024,
    height: 1366,
    scale: 2.0,
    landscape: false,
    mobile: true,
    touch: true,
};

pub const IPAD_PRO_LANDSCAPE: Device = Device {
    name: "iPad Pro landscape",
    width: 1366,
    height: 1024,
    landscape: true,
    ..IPAD_PRO
};

const PRESETS: [(&str, &Device); 4] = [
    ("ipad", &IPAD),
    ("ipad-landscape", &IPAD_LANDSCAPE),
    ("ipad-pro", &IPAD_PRO),
    ("ipad-pro-landscape", &IPAD_PRO_LANDSCAPE),
];

impl Device {
    /// Look up a preset by its CLI name (case-insensitive)
    pub fn by_name(name: &str) -> Option<Device> {
        let wanted = name.to_ascii_lowercase();
        PRESETS
            .iter()
            .find(|(key, _)| *key == wanted)
            .map(|(_, d)| Device::clone(d))
    }

    /// CLI names of the available presets
    pub fn preset_names() -> Vec<&'static str> {
        PRESETS.iter().map(|(key, _)| *key).collect()
    }

    /// Orientation reported to the page for this profile
    pub fn orientation(&self) -> ScreenOrientation {
        ScreenOrientation::for_landscape(self.landscape)
    }

    /// Metrics override equivalent of this profile
    pub fn metrics(&self) -> DeviceMetricsOverride {
        DeviceMetricsOverride {
            width: self.width,
            height: self.height,
            device_scale_factor: self.scale,
            mobile: self.mobile,
            screen_orientation: Some(self.orientation()),
        }
    }
}

/// Screen orientation types understood by the emulation domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrientationType {
    PortraitPrimary,
    PortraitSecondary,
    LandscapePrimary,
    LandscapeSecondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScreenOrientation {
    #[serde(rename = "type")]
    pub kind: OrientationType,
    pub angle: u32,
}

impl ScreenOrientation {
    fn for_landscape(landscape: bool) -> Self {
        if landscape {
            ScreenOrientation { kind: OrientationType::LandscapePrimary, angle: 90 }
        } else {
            ScreenOrientation { kind: OrientationType::PortraitPrimary, angle: 0 }
        }
    }
}

/// Parameters of a device metrics override
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetricsOverride {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
    pub mobile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_orientation: Option<ScreenOrientation>,
}

impl DeviceMetricsOverride {
    /// Landscape-primary, non-mobile, scale 1 override of the given size
    pub fn content(width: u32, height: u32) -> Self {
        DeviceMetricsOverride {
            width,
            height,
            device_scale_factor: 1.0,
            mobile: false,
            screen_orientation: Some(ScreenOrientation {
                kind: OrientationType::LandscapePrimary,
                angle: 0,
            }),
        }
    }
}

/// Plain viewport emulation (no user agent change)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEmulation {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub mobile: bool,
    pub landscape: bool,
    pub touch: bool,
}

impl ViewportEmulation {
    pub fn new(width: u32, height: u32) -> Self {
        ViewportEmulation { width, height, scale: 1.0, mobile: false, landscape: false, touch: false }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn metrics(&self) -> DeviceMetricsOverride {
        DeviceMetricsOverride {
            width: self.width,
            height: self.height,
            device_scale_factor: self.scale,
            mobile: self.mobile,
            screen_orientation: Some(ScreenOrientation::for_landscape(self.landscape)),
        }
    }
}
