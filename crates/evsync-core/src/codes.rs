// Evsync Event Codes
// Numeric event codes from Linux input-event-codes.h used by the core

// Event types
pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;
pub const EV_MSC: u16 = 0x04;
pub const EV_LED: u16 = 0x11;
pub const EV_MAX: u16 = 0x1f;
pub const EV_CNT: usize = EV_MAX as usize + 1;

// Synchronization codes
pub const SYN_REPORT: u16 = 0;
pub const SYN_DROPPED: u16 = 3;

// Relative axes
pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_Z: u16 = 0x02;
pub const REL_RX: u16 = 0x03;
pub const REL_HWHEEL: u16 = 0x06;
pub const REL_DIAL: u16 = 0x07;
pub const REL_WHEEL: u16 = 0x08;
pub const REL_MISC: u16 = 0x09;
pub const REL_MAX: u16 = 0x0f;
pub const REL_CNT: usize = REL_MAX as usize + 1;

// Absolute axes
pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_Z: u16 = 0x02;
pub const ABS_PRESSURE: u16 = 0x18;
pub const ABS_DISTANCE: u16 = 0x19;
pub const ABS_TILT_X: u16 = 0x1a;
pub const ABS_TILT_Y: u16 = 0x1b;
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_TOUCH_MAJOR: u16 = 0x30;
pub const ABS_MT_TOUCH_MINOR: u16 = 0x31;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
pub const ABS_MT_PRESSURE: u16 = 0x3a;
pub const ABS_MT_DISTANCE: u16 = 0x3b;
pub const ABS_MAX: u16 = 0x3f;
pub const ABS_CNT: usize = ABS_MAX as usize + 1;

// Buttons
pub const BTN_MISC: u16 = 0x100;
pub const BTN_0: u16 = 0x100;
pub const BTN_2: u16 = 0x102;
pub const BTN_3: u16 = 0x103;
pub const BTN_MOUSE: u16 = 0x110;
pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;
pub const BTN_JOYSTICK: u16 = 0x120;
pub const BTN_TOOL_PEN: u16 = 0x140;
pub const BTN_TOOL_RUBBER: u16 = 0x141;
pub const BTN_TOOL_BRUSH: u16 = 0x142;
pub const BTN_TOOL_PENCIL: u16 = 0x143;
pub const BTN_TOOL_AIRBRUSH: u16 = 0x144;
pub const BTN_TOOL_FINGER: u16 = 0x145;
pub const BTN_TOOL_MOUSE: u16 = 0x146;
pub const BTN_TOOL_LENS: u16 = 0x147;
pub const BTN_TOUCH: u16 = 0x14a;
pub const BTN_STYLUS: u16 = 0x14b;
pub const BTN_STYLUS2: u16 = 0x14c;
pub const KEY_OK: u16 = 0x160;
pub const KEY_MAX: u16 = 0x2ff;
pub const KEY_CNT: usize = KEY_MAX as usize + 1;

// LEDs
pub const LED_MAX: u16 = 0x0f;
pub const LED_CNT: usize = LED_MAX as usize + 1;

/// Tool keys that signal proximity of a stylus or finger.
pub const PROXIMITY_BITS: [u16; 8] = [
    BTN_TOOL_PEN,
    BTN_TOOL_RUBBER,
    BTN_TOOL_BRUSH,
    BTN_TOOL_PENCIL,
    BTN_TOOL_AIRBRUSH,
    BTN_TOOL_FINGER,
    BTN_TOOL_MOUSE,
    BTN_TOOL_LENS,
];

/// Check if a key code is one of the proximity tool keys
pub fn is_proximity_code(code: u16) -> bool {
    PROXIMITY_BITS.contains(&code)
}

/// Check if a relative axis is a wheel-style axis
pub fn is_wheel_axis(code: u16) -> bool {
    matches!(code, REL_WHEEL | REL_HWHEEL | REL_DIAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_space_sizes() {
        assert_eq!(REL_CNT, 16);
        assert_eq!(ABS_CNT, 64);
        assert_eq!(KEY_CNT, 768);
    }

    #[test]
    fn test_proximity_codes() {
        assert!(is_proximity_code(BTN_TOOL_PEN));
        assert!(is_proximity_code(BTN_TOOL_LENS));
        assert!(!is_proximity_code(BTN_TOUCH));
        assert!(!is_proximity_code(BTN_LEFT));
    }

    #[test]
    fn test_wheel_axes() {
        assert!(is_wheel_axis(REL_WHEEL));
        assert!(is_wheel_axis(REL_HWHEEL));
        assert!(is_wheel_axis(REL_DIAL));
        assert!(!is_wheel_axis(REL_X));
    }
}
