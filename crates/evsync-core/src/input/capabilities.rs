// Evsync Input Layer - Capability Cache
// Fixed-size bitsets of supported event codes and absolute axis ranges

use crate::codes::{ABS_CNT, EV_ABS, EV_KEY, EV_REL, EV_SYN};

/// Fixed-size bit vector over a protocol code space.
///
/// `WORDS` is the number of 64-bit words backing the set; use the aliases
/// below rather than spelling it out.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BitSet<const WORDS: usize> {
    words: [u64; WORDS],
}

/// Event type bits (`EV_CNT`)
pub type EventTypeBits = BitSet<1>;
/// Key and button bits (`KEY_CNT`)
pub type KeyBits = BitSet<12>;
/// Relative axis bits (`REL_CNT`)
pub type RelBits = BitSet<1>;
/// Absolute axis bits (`ABS_CNT`)
pub type AbsBits = BitSet<1>;
/// LED bits (`LED_CNT`)
pub type LedBits = BitSet<1>;

impl<const WORDS: usize> BitSet<WORDS> {
    /// Number of addressable bits
    pub const CAPACITY: usize = WORDS * 64;

    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Set a bit. Codes outside the code space are ignored.
    pub fn set(&mut self, bit: u16) {
        let bit = bit as usize;
        if bit < Self::CAPACITY {
            self.words[bit / 64] |= 1u64 << (bit % 64);
        }
    }

    pub fn clear(&mut self, bit: u16) {
        let bit = bit as usize;
        if bit < Self::CAPACITY {
            self.words[bit / 64] &= !(1u64 << (bit % 64));
        }
    }

    pub fn is_set(&self, bit: u16) -> bool {
        let bit = bit as usize;
        bit < Self::CAPACITY && self.words[bit / 64] & (1u64 << (bit % 64)) != 0
    }

    /// Number of set bits
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Whether any bit in `range` is set
    pub fn any_in(&self, range: std::ops::Range<u16>) -> bool {
        range.into_iter().any(|bit| self.is_set(bit))
    }

    /// Iterate over set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        (0..Self::CAPACITY as u32)
            .map(|bit| bit as u16)
            .filter(move |bit| self.is_set(*bit))
    }
}

impl<const WORDS: usize> Default for BitSet<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> std::fmt::Debug for BitSet<WORDS> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<const WORDS: usize> FromIterator<u16> for BitSet<WORDS> {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut set = Self::new();
        for bit in iter {
            set.set(bit);
        }
        set
    }
}

/// Range record of one absolute axis (`struct input_absinfo`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    /// Units per millimetre as reported by the kernel
    pub resolution: i32,
}

impl AbsInfo {
    pub fn new(minimum: i32, maximum: i32) -> Self {
        Self {
            minimum,
            maximum,
            ..Self::default()
        }
    }

    pub fn with_resolution(mut self, resolution: i32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Device capabilities captured once at probe time
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Device name reported by the kernel
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub events: EventTypeBits,
    pub keys: KeyBits,
    pub rel: RelBits,
    pub abs: AbsBits,
    pub leds: LedBits,
    pub absinfo: [AbsInfo; ABS_CNT],
}

impl DeviceCapabilities {
    /// Create an empty capability set for a named device
    pub fn new(name: impl Into<String>) -> Self {
        let mut events = EventTypeBits::new();
        events.set(EV_SYN);
        Self {
            name: name.into(),
            vendor: 0,
            product: 0,
            events,
            keys: KeyBits::new(),
            rel: RelBits::new(),
            abs: AbsBits::new(),
            leds: LedBits::new(),
            absinfo: [AbsInfo::default(); ABS_CNT],
        }
    }

    pub fn with_ids(mut self, vendor: u16, product: u16) -> Self {
        self.vendor = vendor;
        self.product = product;
        self
    }

    /// Add a supported key or button code
    pub fn with_key(mut self, code: u16) -> Self {
        self.events.set(EV_KEY);
        self.keys.set(code);
        self
    }

    pub fn with_keys(self, codes: &[u16]) -> Self {
        codes.iter().fold(self, |caps, code| caps.with_key(*code))
    }

    /// Add a supported relative axis
    pub fn with_rel(mut self, code: u16) -> Self {
        self.events.set(EV_REL);
        self.rel.set(code);
        self
    }

    /// Add a supported absolute axis with its native range
    pub fn with_abs(mut self, code: u16, info: AbsInfo) -> Self {
        self.events.set(EV_ABS);
        self.abs.set(code);
        if let Some(slot) = self.absinfo.get_mut(code as usize) {
            *slot = info;
        }
        self
    }

    /// Check if a specific key code is supported
    pub fn supports_key(&self, code: u16) -> bool {
        self.keys.is_set(code)
    }

    pub fn has_event_type(&self, event_type: u16) -> bool {
        self.events.is_set(event_type)
    }

    /// Native range of an absolute axis
    pub fn abs_info(&self, code: u16) -> AbsInfo {
        self.absinfo.get(code as usize).copied().unwrap_or_default()
    }

    /// Read capabilities from an opened evdev device
    #[cfg(feature = "device")]
    pub fn from_device(device: &evdev::Device) -> std::io::Result<Self> {
        let id = device.input_id();
        let mut caps = Self::new(device.name().unwrap_or("Unknown")).with_ids(id.vendor(), id.product());

        for event_type in device.supported_events().iter() {
            caps.events.set(event_type.0);
        }
        if let Some(keys) = device.supported_keys() {
            for key in keys.iter() {
                caps.keys.set(key.code());
            }
        }
        if let Some(axes) = device.supported_relative_axes() {
            for axis in axes.iter() {
                caps.rel.set(axis.0);
            }
        }
        if let Some(leds) = device.supported_leds() {
            for led in leds.iter() {
                caps.leds.set(led.0);
            }
        }
        if let Some(axes) = device.supported_absolute_axes() {
            let state = device.get_abs_state()?;
            for axis in axes.iter() {
                caps.abs.set(axis.0);
                if let (Some(slot), Some(info)) =
                    (caps.absinfo.get_mut(axis.0 as usize), state.get(axis.0 as usize))
                {
                    *slot = AbsInfo {
                        value: info.value,
                        minimum: info.minimum,
                        maximum: info.maximum,
                        fuzz: info.fuzz,
                        flat: info.flat,
                        resolution: info.resolution,
                    };
                    log::debug!(
                        "{}: absolute axis {:#x} [{}..{}]",
                        caps.name,
                        axis.0,
                        info.minimum,
                        info.maximum
                    );
                }
            }
        }

        Ok(caps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::*;

    #[test]
    fn test_bitset_set_clear() {
        let mut bits = KeyBits::new();
        bits.set(BTN_LEFT);
        bits.set(KEY_MAX);
        assert!(bits.is_set(BTN_LEFT));
        assert!(bits.is_set(KEY_MAX));
        assert_eq!(bits.count(), 2);

        bits.clear(BTN_LEFT);
        assert!(!bits.is_set(BTN_LEFT));
        assert_eq!(bits.count(), 1);
    }

    #[test]
    fn test_bitset_ignores_out_of_range() {
        let mut bits = RelBits::new();
        bits.set(200);
        assert!(bits.is_empty());
        assert!(!bits.is_set(200));
    }

    #[test]
    fn test_bitset_iter_is_sorted() {
        let bits: AbsBits = [ABS_MT_SLOT, ABS_X, ABS_PRESSURE].into_iter().collect();
        let collected: Vec<u16> = bits.iter().collect();
        assert_eq!(collected, vec![ABS_X, ABS_PRESSURE, ABS_MT_SLOT]);
    }

    #[test]
    fn test_bitset_ranges() {
        let bits: KeyBits = [BTN_LEFT, BTN_TOOL_PEN].into_iter().collect();
        assert!(bits.any_in(BTN_MISC..BTN_JOYSTICK));
        assert!(!bits.any_in(0..BTN_MISC));
        assert!(bits.any_in(BTN_MOUSE..KEY_OK));
    }

    #[test]
    fn test_builder_sets_event_types() {
        let caps = DeviceCapabilities::new("Test Tablet")
            .with_key(BTN_TOOL_PEN)
            .with_abs(ABS_X, AbsInfo::new(0, 4095))
            .with_rel(REL_WHEEL);

        assert!(caps.has_event_type(EV_KEY));
        assert!(caps.has_event_type(EV_ABS));
        assert!(caps.has_event_type(EV_REL));
        assert!(!caps.has_event_type(EV_LED));
        assert!(caps.supports_key(BTN_TOOL_PEN));
        assert_eq!(caps.abs_info(ABS_X).maximum, 4095);
    }

    #[test]
    fn test_abs_info_out_of_range_defaults() {
        let caps = DeviceCapabilities::new("x");
        assert_eq!(caps.abs_info(500), AbsInfo::default());
    }
}
