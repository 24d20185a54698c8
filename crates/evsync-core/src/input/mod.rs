// Evsync Input Layer
// Raw events, device capabilities, axis mapping and classification

mod axis_map;
mod button;
mod capabilities;
mod event;
mod filter;
pub mod probe;

pub use axis_map::{mt_alias, AxisInfo, AxisMap, ScrollKind, ValuatorMode, MAX_VALUATORS};
pub use button::{
    button_number, is_mouse_button, ButtonMap, KeyRemap, MAX_BUTTONS, WHEEL_DOWN_BUTTON, WHEEL_LEFT_BUTTON,
    WHEEL_RIGHT_BUTTON, WHEEL_UP_BUTTON,
};
pub use capabilities::{AbsBits, AbsInfo, BitSet, DeviceCapabilities, EventTypeBits, KeyBits, LedBits, RelBits};
pub use event::{EventClass, EventTime, RawEvent, RECORD_SIZE};
pub use filter::{is_virtual_device, matches_device_filter};
pub use probe::{probe, DeviceFlags, DeviceKind, IgnoreAxes, ProbeOptions, ProbeResult, ValuatorClasses};
