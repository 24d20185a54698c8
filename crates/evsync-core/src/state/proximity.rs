// Evsync State - Proximity
// Unified proximity source with retained coordinates across proximity gaps

use crate::codes::{BTN_TOUCH, PROXIMITY_BITS};
use crate::input::DeviceCapabilities;

use super::valuator::ValuatorMask;

/// Which signal drives `in_proximity`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximitySource {
    /// Tool keys queue proximity events and coordinates are retained while out
    Tool,
    /// `BTN_TOUCH` sets proximity directly; no proximity events are posted
    Touch,
    /// The device never leaves proximity
    None,
}

impl ProximitySource {
    /// Pick the source for a device.
    ///
    /// `use_proximity` is false for touchpads, whose tool keys describe
    /// finger count rather than a hovering stylus.
    pub fn detect(caps: &DeviceCapabilities, use_proximity: bool) -> Self {
        let has_tool = PROXIMITY_BITS.iter().any(|code| caps.supports_key(*code));
        if use_proximity {
            if has_tool {
                ProximitySource::Tool
            } else {
                ProximitySource::None
            }
        } else if caps.supports_key(BTN_TOUCH) {
            ProximitySource::Touch
        } else {
            ProximitySource::None
        }
    }
}

/// Proximity state of a session
#[derive(Debug, Clone)]
pub struct ProximityState {
    source: ProximitySource,
    in_proximity: bool,
    queued: bool,
    retained: ValuatorMask,
    last_in_proximity: ValuatorMask,
}

impl ProximityState {
    pub fn new(source: ProximitySource) -> Self {
        Self {
            source,
            in_proximity: true,
            queued: false,
            retained: ValuatorMask::new(),
            last_in_proximity: ValuatorMask::new(),
        }
    }

    pub fn source(&self) -> ProximitySource {
        self.source
    }

    pub fn in_proximity(&self) -> bool {
        self.in_proximity
    }

    /// Coordinates held while out of proximity
    pub fn retained(&self) -> &ValuatorMask {
        &self.retained
    }

    /// A tool key changed state. Returns whether a proximity event should be queued.
    pub fn tool_event(&mut self) -> bool {
        if self.source != ProximitySource::Tool {
            return false;
        }
        self.queued = true;
        true
    }

    /// `BTN_TOUCH` changed state
    pub fn touch_event(&mut self, pressed: bool) {
        if self.source == ProximitySource::Touch {
            self.in_proximity = pressed;
        }
    }

    /// Resolve the proximity state at a sync marker.
    ///
    /// `queued_state` is the first proximity entry of the cycle's queue.
    /// `vals` holds this cycle's raw absolute samples and `abs_queued` is
    /// updated when a transition backfills coordinates.
    pub fn resolve(&mut self, queued_state: Option<bool>, vals: &mut ValuatorMask, abs_queued: &mut bool) {
        if self.source != ProximitySource::Tool {
            return;
        }

        if !self.queued {
            if *abs_queued {
                if self.in_proximity {
                    self.last_in_proximity.merge_from(vals);
                } else {
                    self.retained.fill_missing_from(vals);
                }
            }
            return;
        }

        let next = queued_state.unwrap_or(self.in_proximity);
        if next != self.in_proximity {
            vals.fill_missing_from(&self.retained);
            self.retained.zero();
            *abs_queued = !vals.is_empty();

            if !next {
                self.retained = self.last_in_proximity;
            }
            log::debug!("proximity {}", if next { "in" } else { "out" });
        }

        self.in_proximity = next;
        if self.in_proximity && *abs_queued {
            self.last_in_proximity.merge_from(vals);
        }
    }

    /// End of cycle
    pub fn reset_cycle(&mut self) {
        self.queued = false;
    }
}
