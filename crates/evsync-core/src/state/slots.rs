// Evsync State - Multi-touch Slots
// Current slot selection, slot lifecycle and per-slot last known values

use crate::codes::{ABS_MT_SLOT, ABS_MT_TRACKING_ID};
use crate::event::TouchPhase;
use crate::input::AbsInfo;

use super::valuator::ValuatorMask;

/// Slot count assumed when the device does not report a usable range
pub const DEFAULT_SLOTS: usize = 10;

/// Lifecycle of the current slot within one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Empty,
    Open,
    Update,
    Close,
}

/// A touch ready to be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchFrame {
    pub slot: i32,
    pub phase: TouchPhase,
    pub mask: ValuatorMask,
}

/// Multi-touch bookkeeping for one session
#[derive(Debug, Clone)]
pub struct MtState {
    current_slot: i32,
    slot_state: SlotState,
    slot_min: i32,
    last_values: Vec<ValuatorMask>,
    touch_mask: ValuatorMask,
}

impl MtState {
    /// Build from the range of `ABS_MT_SLOT`; its current value selects the initial slot
    pub fn new(slot_info: AbsInfo) -> Self {
        let span = i64::from(slot_info.maximum) - i64::from(slot_info.minimum) + 1;
        let slots = if span > 1 {
            span as usize
        } else {
            DEFAULT_SLOTS
        };

        Self {
            current_slot: slot_info.value,
            slot_state: SlotState::Empty,
            slot_min: slot_info.minimum,
            last_values: vec![ValuatorMask::new(); slots],
            touch_mask: ValuatorMask::new(),
        }
    }

    pub fn num_slots(&self) -> usize {
        self.last_values.len()
    }

    /// Currently selected slot, -1 when none
    pub fn current_slot(&self) -> i32 {
        self.current_slot
    }

    pub fn slot_state(&self) -> SlotState {
        self.slot_state
    }

    /// Per-slot last known values of a slot, if it is in range
    pub fn last_values(&self, slot: i32) -> Option<&ValuatorMask> {
        self.slot_index(slot).map(|index| &self.last_values[index])
    }

    fn slot_index(&self, slot: i32) -> Option<usize> {
        let index = i64::from(slot) - i64::from(self.slot_min);
        if index >= 0 && (index as usize) < self.last_values.len() {
            Some(index as usize)
        } else {
            None
        }
    }

    /// Process one MT event.
    ///
    /// `index` is the logical valuator of the axis (ignored for slot and
    /// tracking id). A slot switch returns the touch flushed for the
    /// previous slot, if any.
    pub fn process(&mut self, code: u16, value: i32, index: Option<usize>) -> Option<TouchFrame> {
        if code == ABS_MT_SLOT {
            let flushed = self.flush();
            self.current_slot = value;
            return flushed;
        }

        let slot_index = self.slot_index(self.current_slot);
        if self.slot_state == SlotState::Empty {
            self.slot_state = SlotState::Update;
        }

        if code == ABS_MT_TRACKING_ID {
            if value >= 0 {
                self.slot_state = SlotState::Open;
                match slot_index {
                    Some(slot) => self.touch_mask = self.last_values[slot],
                    None => log::warn!(
                        "tracking id on out-of-range slot {}, touch events may be incorrect",
                        self.current_slot
                    ),
                }
            } else {
                self.slot_state = SlotState::Close;
            }
            return None;
        }

        if let Some(index) = index {
            self.touch_mask.set(index, value);
            if let Some(slot) = slot_index {
                self.last_values[slot].set(index, value);
            }
        }
        None
    }

    /// Emit the pending touch of the current slot and reset to `Empty`
    pub fn flush(&mut self) -> Option<TouchFrame> {
        if self.current_slot < 0 || self.slot_state == SlotState::Empty {
            return None;
        }

        let phase = match self.slot_state {
            SlotState::Open => TouchPhase::Begin,
            SlotState::Close => TouchPhase::End,
            _ => TouchPhase::Update,
        };
        let frame = TouchFrame {
            slot: self.current_slot,
            phase,
            mask: self.touch_mask,
        };

        self.slot_state = SlotState::Empty;
        self.touch_mask.zero();
        Some(frame)
    }
}
