// Evsync Event Output
// Host delivery interface and a recording implementation

use std::fmt;

use crate::state::ValuatorMask;

/// Lifecycle phase of a multi-touch contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Begin,
    Update,
    End,
}

/// Host-side delivery interface.
///
/// A session calls these in dispatch order at every sync marker. Masks are
/// indexed by logical valuator.
pub trait EventSink {
    fn post_relative_motion(&mut self, mask: &ValuatorMask);

    fn post_absolute_motion(&mut self, mask: &ValuatorMask);

    /// `coords` carries the absolute coordinates of the cycle when the device
    /// is absolute and in proximity; `None` means a plain relative button.
    fn post_button(&mut self, button: u32, pressed: bool, coords: Option<&ValuatorMask>);

    fn post_key(&mut self, code: u16, pressed: bool);

    fn post_proximity(&mut self, entering: bool, coords: &ValuatorMask);

    fn post_touch(&mut self, slot: i32, phase: TouchPhase, mask: &ValuatorMask);
}

/// One delivered event, as recorded by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    RelativeMotion(ValuatorMask),
    AbsoluteMotion(ValuatorMask),
    Button {
        button: u32,
        pressed: bool,
        coords: Option<ValuatorMask>,
    },
    Key {
        code: u16,
        pressed: bool,
    },
    Proximity {
        entering: bool,
        coords: ValuatorMask,
    },
    Touch {
        slot: i32,
        phase: TouchPhase,
        mask: ValuatorMask,
    },
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::RelativeMotion(mask) => write!(f, "motion rel {:?}", mask),
            HostEvent::AbsoluteMotion(mask) => write!(f, "motion abs {:?}", mask),
            HostEvent::Button {
                button,
                pressed,
                coords,
            } => {
                let state = if *pressed { "press" } else { "release" };
                match coords {
                    Some(mask) => write!(f, "button {} {} abs {:?}", button, state, mask),
                    None => write!(f, "button {} {}", button, state),
                }
            }
            HostEvent::Key { code, pressed } => {
                write!(f, "key {} {}", code, if *pressed { "press" } else { "release" })
            }
            HostEvent::Proximity { entering, coords } => {
                write!(f, "proximity {} {:?}", if *entering { "in" } else { "out" }, coords)
            }
            HostEvent::Touch { slot, phase, mask } => {
                write!(f, "touch {:?} slot {} {:?}", phase, slot, mask)
            }
        }
    }
}

/// Sink that stores everything it is given
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<HostEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    /// Take the recorded events, leaving the sink empty
    pub fn take(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn post_relative_motion(&mut self, mask: &ValuatorMask) {
        self.events.push(HostEvent::RelativeMotion(*mask));
    }

    fn post_absolute_motion(&mut self, mask: &ValuatorMask) {
        self.events.push(HostEvent::AbsoluteMotion(*mask));
    }

    fn post_button(&mut self, button: u32, pressed: bool, coords: Option<&ValuatorMask>) {
        self.events.push(HostEvent::Button {
            button,
            pressed,
            coords: coords.copied(),
        });
    }

    fn post_key(&mut self, code: u16, pressed: bool) {
        self.events.push(HostEvent::Key { code, pressed });
    }

    fn post_proximity(&mut self, entering: bool, coords: &ValuatorMask) {
        self.events.push(HostEvent::Proximity {
            entering,
            coords: *coords,
        });
    }

    fn post_touch(&mut self, slot: i32, phase: TouchPhase, mask: &ValuatorMask) {
        self.events.push(HostEvent::Touch {
            slot,
            phase,
            mask: *mask,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        let mask = ValuatorMask::from_pairs(&[(0, 5)]);
        sink.post_relative_motion(&mask);
        sink.post_button(1, true, None);
        sink.post_key(30, false);

        assert_eq!(
            sink.events(),
            &[
                HostEvent::RelativeMotion(mask),
                HostEvent::Button {
                    button: 1,
                    pressed: true,
                    coords: None
                },
                HostEvent::Key {
                    code: 30,
                    pressed: false
                },
            ]
        );

        assert_eq!(sink.take().len(), 3);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_display() {
        let event = HostEvent::Button {
            button: 3,
            pressed: false,
            coords: None,
        };
        assert_eq!(event.to_string(), "button 3 release");

        let event = HostEvent::Proximity {
            entering: true,
            coords: ValuatorMask::new(),
        };
        assert_eq!(event.to_string(), "proximity in {}");
    }
}
