//! Shared types for PJLink monitoring and control.
//!
//! The central output type is [`Snapshot`] -- one flat property map plus
//! the list of controls the host may render, produced by each successful
//! polling cycle. Property keys are the stable names in [`property`];
//! hosts and tests assert on those strings.

use std::collections::BTreeMap;

/// PJLink protocol class reported by the device's `CLSS ?` query.
///
/// Class 1 covers basic monitoring and control; Class 2 adds input-name
/// discovery, resolution, volume, freeze, serial/software queries, and
/// filter/lamp replacement model numbers. The class is determined on the
/// first poll and persists for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// PJLink Class 1.
    Class1,
    /// PJLink Class 2.
    Class2,
}

impl DeviceClass {
    /// Parse the value portion of a `CLSS` response (`"1"` or `"2"`).
    pub fn from_response(value: &str) -> Option<Self> {
        match value {
            "1" => Some(DeviceClass::Class1),
            "2" => Some(DeviceClass::Class2),
            _ => None,
        }
    }

    /// The class digit as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Class1 => "1",
            DeviceClass::Class2 => "2",
        }
    }
}

/// A control the host may render next to the monitored properties.
///
/// The `name` is always one of the [`property`] constants, so a control
/// and its backing property line up by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    /// Property name this control is bound to.
    pub name: String,
    /// Widget kind and its current state.
    pub kind: ControlKind,
}

/// Widget kind for a [`Control`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlKind {
    /// Two-state toggle; `on` mirrors the property value (`"1"`/`"0"`).
    Switch { on: bool },
    /// Momentary push button (volume steps).
    Button { label: String },
    /// Selection over the current input catalog.
    Dropdown {
        options: Vec<String>,
        value: String,
    },
}

impl Control {
    /// Build a switch control from a `"1"`/`"0"` property value.
    pub fn switch(name: &str, value: &str) -> Self {
        Control {
            name: name.to_string(),
            kind: ControlKind::Switch { on: value == "1" },
        }
    }

    /// Build a momentary button control.
    pub fn button(name: &str, label: &str) -> Self {
        Control {
            name: name.to_string(),
            kind: ControlKind::Button {
                label: label.to_string(),
            },
        }
    }

    /// Build a dropdown control over the given options.
    pub fn dropdown(name: &str, options: Vec<String>, value: &str) -> Self {
        Control {
            name: name.to_string(),
            kind: ControlKind::Dropdown {
                options,
                value: value.to_string(),
            },
        }
    }
}

/// One immutable collection of all properties observable at a single
/// polling instant, plus the controls valid for that state.
///
/// The most recent successful snapshot is cached by the client; readers
/// always see either a previous complete snapshot or a newer complete
/// one, never a half-built map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Flat property map keyed by the names in [`property`].
    pub properties: BTreeMap<String, String>,
    /// Controls in presentation order.
    pub controls: Vec<Control>,
}

impl Snapshot {
    /// Look up a property value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Returns `true` if a control bound to `name` is present.
    pub fn has_control(&self, name: &str) -> bool {
        self.controls.iter().any(|c| c.name == name)
    }
}

/// Canonical output property names. Stable -- tests assert these.
pub mod property {
    pub const POWER: &str = "System#Power";
    pub const FREEZE: &str = "System#Freeze";
    pub const INPUT: &str = "System#Input";
    pub const VIDEO_MUTE: &str = "System#VideoMute";
    pub const RECOMMENDED_RESOLUTION: &str = "System#RecommendedResolution";
    pub const INPUT_RESOLUTION: &str = "System#InputResolution";
    pub const FILTER_USAGE: &str = "System#FilterUsageTime(hours)";
    pub const FILTER_REPLACEMENT: &str = "System#FilterReplacementModelNumber";

    pub const AUDIO_MUTE: &str = "Audio#AudioMute";
    pub const SPEAKER_VOLUME_UP: &str = "Audio#SpeakerVolumeUp";
    pub const SPEAKER_VOLUME_DOWN: &str = "Audio#SpeakerVolumeDown";
    pub const MICROPHONE_VOLUME_UP: &str = "Audio#MicrophoneVolumeUp";
    pub const MICROPHONE_VOLUME_DOWN: &str = "Audio#MicrophoneVolumeDown";

    pub const LAMP_REPLACEMENT: &str = "Lamp#LampReplacementModelNumber";

    pub const ERROR_FAN: &str = "ErrorStatus#Fan";
    pub const ERROR_LAMP: &str = "ErrorStatus#Lamp";
    pub const ERROR_TEMPERATURE: &str = "ErrorStatus#Temperature";
    pub const ERROR_COVER: &str = "ErrorStatus#CoverOpen";
    pub const ERROR_FILTER: &str = "ErrorStatus#Filter";
    pub const ERROR_OTHER: &str = "ErrorStatus#Other";

    pub const DEVICE_NAME: &str = "DeviceName";
    pub const MANUFACTURER_DETAILS: &str = "ManufacturerDetails";
    pub const PRODUCT_DETAILS: &str = "ProductDetails";
    pub const DEVICE_DETAILS: &str = "DeviceDetails";
    pub const SERIAL_NUMBER: &str = "SerialNumber";
    pub const SOFTWARE_VERSION: &str = "SoftwareVersion";
    pub const PJLINK_CLASS: &str = "PJLinkClass";

    pub const ADAPTER_VERSION: &str = "AdapterMetadata#AdapterVersion";
    pub const ADAPTER_BUILD_DATE: &str = "AdapterMetadata#AdapterBuildDate";
    pub const ADAPTER_UPTIME: &str = "AdapterMetadata#AdapterUptime";

    /// Lamp usage time key for the 1-based lamp index.
    pub fn lamp_usage_time(index: usize) -> String {
        format!("Lamp#Lamp{index}UsageTime")
    }

    /// Lamp status key for the 1-based lamp index.
    pub fn lamp_status(index: usize) -> String {
        format!("Lamp#Lamp{index}Status")
    }
}

/// Fixed status strings used as property values.
pub mod status {
    pub const OK: &str = "OK";
    pub const WARNING: &str = "WARNING";
    pub const ERROR: &str = "ERROR";
    pub const ON: &str = "ON";
    pub const OFF: &str = "OFF";
    pub const NOT_AVAILABLE: &str = "N/A";
}

/// Render an uptime in whole seconds as
/// `"N day(s) N hour(s) N minute(s) N second(s)"`.
pub fn normalize_uptime(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;
    format!("{days} day(s) {hours} hour(s) {minutes} minute(s) {seconds} second(s)")
}
