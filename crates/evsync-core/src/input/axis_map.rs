// Evsync Input Layer - Axis Mapping
// Raw axis code to logical valuator index, built once per session

use strum_macros::{Display, EnumString};

use crate::codes::*;
use crate::error::CapabilityError;

use super::capabilities::DeviceCapabilities;

/// Upper bound on valuators exposed to the host
pub const MAX_VALUATORS: usize = 36;

/// Whether a valuator reports deltas or positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ValuatorMode {
    Relative,
    Absolute,
}

/// Smooth-scroll role of a relative valuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollKind {
    #[default]
    None,
    Vertical,
    Horizontal,
}

/// Descriptor of one logical valuator, for host class registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisInfo {
    /// Raw REL or ABS code
    pub code: u16,
    /// Logical valuator index
    pub index: usize,
    pub mode: ValuatorMode,
    pub min: i32,
    pub max: i32,
    /// Units per metre (0 when unknown)
    pub resolution: i32,
    pub scroll: ScrollKind,
}

/// MT axes that alias a legacy single-touch axis
const MT_ALIASES: [(u16, u16); 4] = [
    (ABS_MT_POSITION_X, ABS_X),
    (ABS_MT_POSITION_Y, ABS_Y),
    (ABS_MT_PRESSURE, ABS_PRESSURE),
    (ABS_MT_DISTANCE, ABS_DISTANCE),
];

/// Bookkeeping axes that never become valuators
const BLACKLISTED_ABS: [u16; 2] = [ABS_MT_SLOT, ABS_MT_TRACKING_ID];

/// Legacy axis aliased by an MT axis, if any
pub fn mt_alias(code: u16) -> Option<u16> {
    MT_ALIASES
        .iter()
        .find(|(mt, _)| *mt == code)
        .map(|(_, legacy)| *legacy)
}

/// Mapping from raw axis codes of one event class to valuator indices
#[derive(Debug, Clone)]
pub struct AxisMap {
    mode: ValuatorMode,
    map: Vec<Option<usize>>,
    axes: Vec<AxisInfo>,
}

impl AxisMap {
    /// Build the relative map.
    ///
    /// Wheel axes only become valuators with smooth scrolling; otherwise they
    /// are delivered as button clicks and stay unmapped.
    pub fn relative(caps: &DeviceCapabilities, smooth_scroll: bool) -> Result<Self, CapabilityError> {
        if !caps.has_event_type(EV_REL) {
            return Err(CapabilityError::MissingEventType(EV_REL));
        }

        let mut map = vec![None; REL_CNT];
        let mut axes = Vec::new();

        for code in caps.rel.iter() {
            if is_wheel_axis(code) && !smooth_scroll {
                continue;
            }
            if axes.len() >= MAX_VALUATORS {
                log::warn!("{}: too many relative axes, ignoring {:#x}", caps.name, code);
                continue;
            }

            let scroll = match code {
                REL_WHEEL | REL_DIAL => ScrollKind::Vertical,
                REL_HWHEEL => ScrollKind::Horizontal,
                _ => ScrollKind::None,
            };
            let index = axes.len();
            map[code as usize] = Some(index);
            axes.push(AxisInfo {
                code,
                index,
                mode: ValuatorMode::Relative,
                min: -1,
                max: -1,
                resolution: 1,
                scroll,
            });
        }

        if axes.is_empty() {
            return Err(CapabilityError::NoAxes("relative"));
        }

        log::debug!("{}: {} relative valuators", caps.name, axes.len());
        Ok(Self {
            mode: ValuatorMode::Relative,
            map,
            axes,
        })
    }

    /// Build the absolute map.
    ///
    /// MT position, pressure and distance share the index of their legacy
    /// counterpart when the device reports both.
    pub fn absolute(caps: &DeviceCapabilities) -> Result<Self, CapabilityError> {
        if !caps.has_event_type(EV_ABS) {
            return Err(CapabilityError::MissingEventType(EV_ABS));
        }

        let mut map = vec![None; ABS_CNT];
        let mut axes = Vec::new();

        for code in caps.abs.iter() {
            if BLACKLISTED_ABS.contains(&code) {
                continue;
            }
            if let Some(legacy) = mt_alias(code) {
                if let Some(index) = map[legacy as usize] {
                    map[code as usize] = Some(index);
                    continue;
                }
            }
            if axes.len() >= MAX_VALUATORS {
                log::warn!("{}: too many absolute axes, ignoring {:#x}", caps.name, code);
                continue;
            }

            let info = caps.abs_info(code);
            let index = axes.len();
            map[code as usize] = Some(index);
            axes.push(AxisInfo {
                code,
                index,
                mode: ValuatorMode::Absolute,
                min: info.minimum,
                max: info.maximum,
                resolution: info.resolution.saturating_mul(1000),
                scroll: ScrollKind::None,
            });
        }

        if axes.is_empty() {
            return Err(CapabilityError::NoAxes("absolute"));
        }

        log::debug!("{}: {} absolute valuators", caps.name, axes.len());
        Ok(Self {
            mode: ValuatorMode::Absolute,
            map,
            axes,
        })
    }

    /// Logical index of a raw code, or `None` when unmapped
    pub fn index_of(&self, code: u16) -> Option<usize> {
        self.map.get(code as usize).copied().flatten()
    }

    pub fn mode(&self) -> ValuatorMode {
        self.mode
    }

    /// Valuator descriptors in index order
    pub fn axes(&self) -> &[AxisInfo] {
        &self.axes
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::AbsInfo;

    fn mouse() -> DeviceCapabilities {
        DeviceCapabilities::new("Mouse")
            .with_key(BTN_LEFT)
            .with_rel(REL_X)
            .with_rel(REL_Y)
            .with_rel(REL_HWHEEL)
            .with_rel(REL_WHEEL)
    }

    #[test]
    fn test_relative_skips_wheels_without_smooth_scroll() {
        let map = AxisMap::relative(&mouse(), false).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.index_of(REL_X), Some(0));
        assert_eq!(map.index_of(REL_Y), Some(1));
        assert_eq!(map.index_of(REL_WHEEL), None);
    }

    #[test]
    fn test_relative_smooth_scroll_marks_scroll_axes() {
        let map = AxisMap::relative(&mouse(), true).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.index_of(REL_HWHEEL), Some(2));
        assert_eq!(map.index_of(REL_WHEEL), Some(3));
        assert_eq!(map.axes()[2].scroll, ScrollKind::Horizontal);
        assert_eq!(map.axes()[3].scroll, ScrollKind::Vertical);
        assert_eq!(map.axes()[0].scroll, ScrollKind::None);
    }

    #[test]
    fn test_relative_wheel_only_device_has_no_axes() {
        let caps = DeviceCapabilities::new("Wheel").with_rel(REL_WHEEL);
        assert_eq!(
            AxisMap::relative(&caps, false).unwrap_err(),
            CapabilityError::NoAxes("relative")
        );
    }

    #[test]
    fn test_absolute_shares_mt_alias_index() {
        let caps = DeviceCapabilities::new("Touchscreen")
            .with_abs(ABS_X, AbsInfo::new(0, 1023).with_resolution(10))
            .with_abs(ABS_Y, AbsInfo::new(0, 767))
            .with_abs(ABS_MT_SLOT, AbsInfo::new(0, 9))
            .with_abs(ABS_MT_POSITION_X, AbsInfo::new(0, 1023))
            .with_abs(ABS_MT_POSITION_Y, AbsInfo::new(0, 767))
            .with_abs(ABS_MT_TRACKING_ID, AbsInfo::new(0, 65535))
            .with_abs(ABS_MT_TOUCH_MAJOR, AbsInfo::new(0, 255));

        let map = AxisMap::absolute(&caps).unwrap();
        assert_eq!(map.index_of(ABS_MT_POSITION_X), map.index_of(ABS_X));
        assert_eq!(map.index_of(ABS_MT_POSITION_Y), map.index_of(ABS_Y));
        assert_eq!(map.index_of(ABS_MT_SLOT), None);
        assert_eq!(map.index_of(ABS_MT_TRACKING_ID), None);
        assert_eq!(map.index_of(ABS_MT_TOUCH_MAJOR), Some(2));
        assert_eq!(map.len(), 3);
        assert_eq!(map.axes()[0].resolution, 10_000);
        assert_eq!(map.axes()[1].max, 767);
    }

    #[test]
    fn test_mt_axis_without_legacy_gets_own_index() {
        let caps = DeviceCapabilities::new("MT only")
            .with_abs(ABS_MT_POSITION_X, AbsInfo::new(0, 100))
            .with_abs(ABS_MT_POSITION_Y, AbsInfo::new(0, 100));
        let map = AxisMap::absolute(&caps).unwrap();
        assert_eq!(map.index_of(ABS_MT_POSITION_X), Some(0));
        assert_eq!(map.index_of(ABS_MT_POSITION_Y), Some(1));
    }

    #[test]
    fn test_absolute_without_abs_events() {
        assert_eq!(
            AxisMap::absolute(&mouse()).unwrap_err(),
            CapabilityError::MissingEventType(EV_ABS)
        );
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("relative".parse::<ValuatorMode>().unwrap(), ValuatorMode::Relative);
        assert_eq!("Absolute".parse::<ValuatorMode>().unwrap(), ValuatorMode::Absolute);
        assert!("sideways".parse::<ValuatorMode>().is_err());
        assert_eq!(ValuatorMode::Relative.to_string(), "relative");
    }
}
