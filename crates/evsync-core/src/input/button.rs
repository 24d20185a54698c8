// Evsync Input Layer - Buttons and Keys
// Kernel button codes to logical button numbers, user button and key remapping

use std::collections::HashMap;

use crate::codes::*;

/// Highest logical button number a session tracks
pub const MAX_BUTTONS: usize = 32;

/// Logical button for wheel-up clicks
pub const WHEEL_UP_BUTTON: u32 = 4;
/// Logical button for wheel-down clicks
pub const WHEEL_DOWN_BUTTON: u32 = 5;
/// Logical button for horizontal wheel left clicks
pub const WHEEL_LEFT_BUTTON: u32 = 6;
/// Logical button for horizontal wheel right clicks
pub const WHEEL_RIGHT_BUTTON: u32 = 7;

/// Map a kernel button code to a logical button number.
///
/// Returns 0 for codes that are not buttons.
pub fn button_number(code: u16) -> u32 {
    match code {
        BTN_LEFT => 1,
        BTN_MIDDLE => 2,
        BTN_RIGHT => 3,
        c if (BTN_SIDE..BTN_JOYSTICK).contains(&c) => 8 + u32::from(c - BTN_SIDE),
        c if (BTN_0..=BTN_2).contains(&c) => 1 + u32::from(c - BTN_0),
        c if (BTN_3..BTN_MOUSE).contains(&c) => 8 + u32::from(c - BTN_3),
        c if (BTN_TOUCH..=BTN_STYLUS2).contains(&c) => 1 + u32::from(c - BTN_TOUCH),
        _ => 0,
    }
}

/// Whether a key code lies in the mouse button range, where autorepeat is dropped
pub fn is_mouse_button(code: u16) -> bool {
    (BTN_MOUSE..KEY_OK).contains(&code)
}

/// User mapping from logical button number to delivered button number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap {
    map: [u32; MAX_BUTTONS + 1],
}

impl ButtonMap {
    /// Identity mapping
    pub fn identity() -> Self {
        let mut map = [0u32; MAX_BUTTONS + 1];
        for (i, slot) in map.iter_mut().enumerate() {
            *slot = i as u32;
        }
        Self { map }
    }

    /// Parse a mapping such as `"3 2 1"` (button 1 delivers 3, 2 stays, 3 delivers 1).
    ///
    /// A malformed or out-of-range entry discards the whole mapping and the
    /// identity is used instead.
    pub fn parse(text: &str) -> Self {
        let mut mapping = Self::identity();

        for (i, token) in text.split_whitespace().enumerate() {
            let button = i + 1;
            if button > MAX_BUTTONS {
                log::warn!("button mapping '{}' has more than {} entries, ignoring the rest", text, MAX_BUTTONS);
                break;
            }
            match token.parse::<u32>() {
                Ok(target) if target as usize <= MAX_BUTTONS => mapping.map[button] = target,
                _ => {
                    log::error!("invalid button mapping '{}', using defaults", text);
                    return Self::identity();
                }
            }
        }

        log::info!("button mapping '{}'", text);
        mapping
    }

    /// Delivered button for a logical one. 0 means the button is disabled.
    pub fn map(&self, button: u32) -> u32 {
        self.map.get(button as usize).copied().unwrap_or(button)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self::identity()
    }
}

/// Key code remapping table, parsed from `"code=code code=code ..."`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRemap {
    table: HashMap<u16, u16>,
}

impl KeyRemap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a remap list.
    ///
    /// Codes may be decimal or `0x` hex and whitespace around `=` is allowed.
    /// Out-of-range pairs are skipped; parsing stops at the first malformed
    /// pair and keeps what was read so far.
    pub fn parse(text: &str) -> Self {
        let mut remap = Self::new();
        let spaced = text.replace('=', " = ");
        let tokens: Vec<&str> = spaced.split_whitespace().collect();

        for pair in tokens.chunks(3) {
            let (from, to) = match pair {
                [from, "=", to] => match (parse_code(from), parse_code(to)) {
                    (Some(from), Some(to)) => (from, to),
                    _ => {
                        log::error!("invalid key remap starting at '{}', ignoring", pair.join(" "));
                        break;
                    }
                },
                _ => {
                    log::error!("invalid key remap starting at '{}', ignoring", pair.join(" "));
                    break;
                }
            };

            let Ok(from) = u16::try_from(from) else {
                log::error!("key remap input code {} out of range, ignoring", from);
                continue;
            };
            if to == 0 || to >= KEY_CNT as i64 {
                log::error!("key remap output code {} out of range, ignoring", to);
                continue;
            }

            log::info!("remapping key {} into {}", from, to);
            remap.table.insert(from, to as u16);
        }

        remap
    }

    /// Remapped code, or the code itself when no entry exists
    pub fn apply(&self, code: u16) -> u16 {
        self.table.get(&code).copied().unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn parse_code(token: &str) -> Option<i64> {
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}
