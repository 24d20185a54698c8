// Evsync Input Layer - Device Probing
// Classify a device from its capabilities and pick its valuator classes

use strum_macros::{Display, EnumString};

use crate::codes::*;

use super::axis_map::{AxisMap, ValuatorMode};
use super::button::button_number;
use super::capabilities::{AbsInfo, DeviceCapabilities};

/// Range given to forced absolute X/Y axes
const FORCED_ABS_MAX: i32 = 1000;

/// What kind of device the probe settled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    Touchpad,
    Touchscreen,
    Tablet,
}

/// Ignore option for one axis class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IgnoreAxes {
    /// Option unset: normal classification
    #[default]
    Default,
    /// Axes are present but not used
    Ignore,
    /// Axes are used even where classification would drop them
    Unignore,
}

impl From<Option<bool>> for IgnoreAxes {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => IgnoreAxes::Default,
            Some(true) => IgnoreAxes::Ignore,
            Some(false) => IgnoreAxes::Unignore,
        }
    }
}

/// Options consulted while probing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOptions {
    pub ignore_relative: IgnoreAxes,
    pub ignore_absolute: IgnoreAxes,
}

/// Mode bits of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFlags {
    pub keyboard_events: bool,
    pub button_events: bool,
    pub relative_events: bool,
    pub absolute_events: bool,
    pub touchpad: bool,
    pub touchscreen: bool,
    pub tablet: bool,
    pub unignore_relative: bool,
    pub unignore_absolute: bool,
    /// Absolute samples are converted to relative motion
    pub relative_mode: bool,
}

impl DeviceFlags {
    pub fn is_touch_device(&self) -> bool {
        self.touchpad || self.touchscreen || self.tablet
    }
}

/// Valuator classes built for a session
#[derive(Debug, Clone, Default)]
pub struct ValuatorClasses {
    pub relative: Option<AxisMap>,
    pub absolute: Option<AxisMap>,
}

/// Outcome of probing a device
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Capabilities, including any forced X/Y axes
    pub caps: DeviceCapabilities,
    pub flags: DeviceFlags,
    /// `None` when the device reports nothing usable
    pub kind: Option<DeviceKind>,
    pub num_buttons: u32,
    pub has_scroll: bool,
    pub has_mt: bool,
    /// Whether tool keys report proximity. Touchpads turn this off.
    pub use_proximity: bool,
}

/// Classify a device.
///
/// Counts buttons, detects scroll wheels, relative and absolute axes and
/// keys, forces X/Y axes where a device only reports one of them, and picks
/// a device kind. Absolute devices with pen tools are tablets; with pressure
/// or touch they are touchpads when they also have mouse buttons or a finger
/// tool, touchscreens otherwise.
pub fn probe(mut caps: DeviceCapabilities, options: &ProbeOptions) -> ProbeResult {
    let mut flags = DeviceFlags::default();
    log::debug!(
        "{}: vendor {:#06x} product {:#06x}",
        caps.name,
        caps.vendor,
        caps.product
    );

    let ignore_rel = options.ignore_relative == IgnoreAxes::Ignore;
    let ignore_abs = options.ignore_absolute == IgnoreAxes::Ignore;
    flags.unignore_relative = options.ignore_relative == IgnoreAxes::Unignore;
    flags.unignore_absolute = options.ignore_absolute == IgnoreAxes::Unignore;

    let mut num_buttons = (BTN_MISC..BTN_JOYSTICK)
        .filter(|code| caps.supports_key(*code))
        .map(button_number)
        .max()
        .unwrap_or(0);
    let has_lmr = [BTN_LEFT, BTN_MIDDLE, BTN_RIGHT]
        .iter()
        .any(|code| caps.supports_key(*code));
    if num_buttons > 0 {
        flags.button_events = true;
        log::debug!("{}: found {} mouse buttons", caps.name, num_buttons);
    }

    let mut has_rel_axes = !caps.rel.is_empty();
    let mut has_scroll = false;
    if has_rel_axes {
        if [REL_WHEEL, REL_HWHEEL, REL_DIAL].iter().any(|code| caps.rel.is_set(*code)) {
            log::debug!("{}: found scroll wheel(s)", caps.name);
            has_scroll = true;
            num_buttons = if num_buttons < 3 { 7 } else { num_buttons + 4 };
        }

        if !ignore_rel {
            flags.relative_events = true;
            let rel_xy = caps.rel.is_set(REL_X) && caps.rel.is_set(REL_Y);
            let abs_xy = caps.abs.is_set(ABS_X) && caps.abs.is_set(ABS_Y);
            if !rel_xy && !abs_xy {
                log::info!("{}: forcing relative x/y axes to exist", caps.name);
                caps = caps.with_rel(REL_X).with_rel(REL_Y);
            }
        } else {
            log::info!("{}: relative axes present but ignored", caps.name);
            has_rel_axes = false;
        }
    }

    let mut has_abs_axes = !caps.abs.is_empty();
    let has_mt = caps.abs.any_in(ABS_MT_SLOT..ABS_CNT as u16);

    if has_abs_axes && ignore_abs {
        log::info!("{}: absolute axes present but ignored", caps.name);
        has_abs_axes = false;
    } else if has_abs_axes {
        flags.absolute_events = true;
        if caps.abs.is_set(ABS_X) && caps.abs.is_set(ABS_Y) {
            if [BTN_TOOL_PEN, BTN_STYLUS, BTN_STYLUS2]
                .iter()
                .any(|code| caps.supports_key(*code))
            {
                flags.tablet = true;
                if num_buttons == 0 {
                    num_buttons = 7;
                    flags.button_events = true;
                }
            } else if caps.abs.is_set(ABS_PRESSURE) || caps.supports_key(BTN_TOUCH) {
                if has_lmr || caps.supports_key(BTN_TOOL_FINGER) {
                    flags.touchpad = true;
                } else {
                    flags.touchscreen = true;
                    flags.button_events = true;
                }
            } else if !(caps.rel.is_set(REL_X) && caps.rel.is_set(REL_Y)) && has_lmr {
                flags.touchscreen = true;
                flags.button_events = true;
            }
        } else if !(caps.abs.is_set(ABS_MT_POSITION_X) && caps.abs.is_set(ABS_MT_POSITION_Y)) {
            log::info!("{}: forcing absolute x/y axes to exist", caps.name);
            caps = caps
                .with_abs(ABS_X, AbsInfo::new(0, FORCED_ABS_MAX))
                .with_abs(ABS_Y, AbsInfo::new(0, FORCED_ABS_MAX));
        }
    }

    let has_keys = caps.keys.any_in(0..BTN_MISC);
    if has_keys {
        flags.keyboard_events = true;
    }

    let mut use_proximity = true;
    let mut kind = None;
    if has_rel_axes || has_abs_axes || num_buttons > 0 {
        kind = Some(if flags.touchpad {
            use_proximity = false;
            DeviceKind::Touchpad
        } else if flags.tablet {
            DeviceKind::Tablet
        } else if flags.touchscreen {
            DeviceKind::Touchscreen
        } else {
            DeviceKind::Mouse
        });
    }
    if has_keys {
        kind = Some(DeviceKind::Keyboard);
    }

    if has_scroll && (has_rel_axes || has_abs_axes || num_buttons > 0 || has_keys) {
        flags.button_events = true;
        flags.relative_events = true;
    }

    match kind {
        Some(kind) => log::info!("{}: configuring as {}", caps.name, kind),
        None => log::warn!("{}: don't know how to use device", caps.name),
    }

    ProbeResult {
        caps,
        flags,
        kind,
        num_buttons,
        has_scroll,
        has_mt,
        use_proximity,
    }
}

impl ProbeResult {
    /// Build the valuator classes and settle the event flags.
    ///
    /// Touch devices use absolute axes only. Otherwise relative axes win
    /// over absolute ones, unless an unignore option asks for both.
    /// Absolute touchpads default to relative mode; `mode` overrides.
    pub fn init_valuators(&mut self, smooth_scroll: bool, mode: Option<ValuatorMode>) -> ValuatorClasses {
        let mut classes = ValuatorClasses::default();
        let name = self.caps.name.clone();

        if self.flags.unignore_relative || self.flags.unignore_absolute {
            if self.flags.relative_events {
                classes.relative = self.build_relative(smooth_scroll);
            }
            if self.flags.absolute_events {
                classes.absolute = self.build_absolute();
            }
        } else if self.flags.is_touch_device() {
            if self.flags.relative_events {
                log::warn!("{}: touchpads, tablets and touchscreens ignore relative axes", name);
                self.flags.relative_events = false;
            }
            classes.absolute = self.build_absolute();
        } else if self.flags.relative_events {
            classes.relative = self.build_relative(smooth_scroll);
            if classes.relative.is_some() {
                if self.flags.absolute_events {
                    log::warn!("{}: ignoring absolute axes", name);
                    self.flags.absolute_events = false;
                }
            } else if self.flags.absolute_events {
                classes.absolute = self.build_absolute();
            }
        } else if self.flags.absolute_events {
            classes.absolute = self.build_absolute();
        }

        if classes.absolute.is_some() {
            self.flags.relative_mode = self.flags.touchpad;
            if let Some(mode) = mode {
                self.flags.relative_mode = mode == ValuatorMode::Relative;
            }
            log::info!(
                "{}: absolute axes in {} mode",
                name,
                if self.flags.relative_mode { "relative" } else { "absolute" }
            );
        }

        classes
    }

    fn build_relative(&mut self, smooth_scroll: bool) -> Option<AxisMap> {
        match AxisMap::relative(&self.caps, smooth_scroll) {
            Ok(map) => Some(map),
            Err(err) => {
                if !self.has_scroll {
                    log::error!("{}: failed to initialize relative axes: {}", self.caps.name, err);
                    self.flags.relative_events = false;
                } else {
                    log::debug!("{}: wheel-only relative axes: {}", self.caps.name, err);
                }
                None
            }
        }
    }

    fn build_absolute(&mut self) -> Option<AxisMap> {
        match AxisMap::absolute(&self.caps) {
            Ok(map) => Some(map),
            Err(err) => {
                log::error!("{}: failed to initialize absolute axes: {}", self.caps.name, err);
                self.flags.absolute_events = false;
                None
            }
        }
    }
}
