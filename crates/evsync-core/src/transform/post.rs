// Evsync Transform - Relative Post-processing
// Strategies run at the relative-motion post step of a sync cycle

use std::fmt;

use strum_macros::{Display, EnumString};

use crate::codes::{REL_CNT, REL_X, REL_Z};
use crate::event::EventSink;
use crate::input::EventTime;
use crate::state::ValuatorMask;

/// Angle range of a rotary device in tenths of a degree
pub const ROTARY_MAX: i32 = 3600;
/// Raw rotary units to tenths of a degree
pub const ROTARY_SCALE: i32 = 10;
/// Angle travelled per detent, in tenths of a degree
pub const DETENT_INTERVAL: i32 = 150;

/// Hall sensor codes reported on `REL_Z`
mod hall_code {
    pub const DETENT_RIGHT: i32 = 2;
    pub const DETENT_LEFT: i32 = -2;
    pub const MOVE_OUT: i32 = 1;
    pub const MOVE_IN: i32 = -1;
}

/// Strategy for posting a cycle's relative motion
pub trait RelativePostProcessor: fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Post the cycle's relative motion.
    ///
    /// `vals` is the reconciled relative mask, `delta` the transformed raw
    /// deltas indexed by REL code, `time` the timestamp of the sync marker.
    fn post(&mut self, vals: &ValuatorMask, delta: &[i32; REL_CNT], time: EventTime, sink: &mut dyn EventSink);

    /// Block or unblock motion delivery. Strategies that cannot block ignore this.
    fn set_motion_blocked(&mut self, _blocked: bool) {}
}

/// Strategy selection, as named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PostProcessing {
    #[default]
    None,
    Rotary,
    Hall,
    RemoteControl,
}

impl PostProcessing {
    /// Build the strategy for a new session
    pub fn build(self) -> Box<dyn RelativePostProcessor> {
        match self {
            PostProcessing::None => Box::new(Passthrough),
            PostProcessing::Rotary => Box::new(Rotary::new()),
            PostProcessing::Hall => Box::new(Hall),
            PostProcessing::RemoteControl => Box::new(RemoteControl::new()),
        }
    }
}

/// Posts the relative mask unchanged
#[derive(Debug, Default)]
pub struct Passthrough;

impl RelativePostProcessor for Passthrough {
    fn name(&self) -> &'static str {
        "none"
    }

    fn post(&mut self, vals: &ValuatorMask, _delta: &[i32; REL_CNT], _time: EventTime, sink: &mut dyn EventSink) {
        if !vals.is_empty() {
            sink.post_relative_motion(vals);
        }
    }
}

/// Rotary bezel: turns `REL_X` travel into an angle and detents
#[derive(Debug, Default)]
pub struct Rotary {
    angle: i32,
    travel: i64,
}

impl Rotary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current angle in tenths of a degree, `0..ROTARY_MAX`
    pub fn angle(&self) -> i32 {
        self.angle
    }
}

impl RelativePostProcessor for Rotary {
    fn name(&self) -> &'static str {
        "rotary"
    }

    fn post(&mut self, _vals: &ValuatorMask, delta: &[i32; REL_CNT], _time: EventTime, sink: &mut dyn EventSink) {
        let angle_delta = delta[REL_X as usize].saturating_mul(ROTARY_SCALE);
        if angle_delta == 0 {
            return;
        }

        self.angle = (self.angle + angle_delta % ROTARY_MAX).rem_euclid(ROTARY_MAX);
        self.travel += i64::from(angle_delta);
        let detents = self.travel / i64::from(DETENT_INTERVAL);
        self.travel -= detents * i64::from(DETENT_INTERVAL);
        // |travel| < DETENT_INTERVAL before the add, so detents fits i32
        let detents = detents as i32;

        log::debug!("rotary angle {} delta {} detents {}", self.angle, angle_delta, detents);
        let mask = ValuatorMask::from_pairs(&[(0, angle_delta), (2, detents)]);
        sink.post_relative_motion(&mask);
    }
}

/// Hall sensor detent decoder
#[derive(Debug, Default)]
pub struct Hall;

impl Hall {
    /// Detent for a hall code, `None` when the event is suppressed
    pub fn decode(code: i32) -> Option<i32> {
        match code {
            hall_code::DETENT_RIGHT => Some(1),
            hall_code::DETENT_LEFT => Some(-1),
            hall_code::MOVE_IN => Some(0),
            hall_code::MOVE_OUT => None,
            other => {
                log::warn!("unknown hall code {}, assuming move-in", other);
                Some(0)
            }
        }
    }
}

impl RelativePostProcessor for Hall {
    fn name(&self) -> &'static str {
        "hall"
    }

    fn post(&mut self, _vals: &ValuatorMask, delta: &[i32; REL_CNT], time: EventTime, sink: &mut dyn EventSink) {
        let Some(detent) = Self::decode(delta[REL_Z as usize]) else {
            log::debug!("hall: moving away from detent");
            return;
        };

        let mask = ValuatorMask::from_pairs(&[(0, 0), (1, time.as_millis() as i32), (2, detent)]);
        sink.post_relative_motion(&mask);
    }
}

/// Remote control pointer whose motion the host can block
#[derive(Debug, Default)]
pub struct RemoteControl {
    blocked: bool,
}

impl RemoteControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

impl RelativePostProcessor for RemoteControl {
    fn name(&self) -> &'static str {
        "remote_control"
    }

    fn post(&mut self, vals: &ValuatorMask, _delta: &[i32; REL_CNT], _time: EventTime, sink: &mut dyn EventSink) {
        if self.blocked {
            log::debug!("remote control: motion blocked");
            return;
        }
        if !vals.is_empty() {
            sink.post_relative_motion(vals);
        }
    }

    fn set_motion_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{HostEvent, RecordingSink};

    fn delta_with(code: u16, value: i32) -> [i32; REL_CNT] {
        let mut delta = [0; REL_CNT];
        delta[code as usize] = value;
        delta
    }

    #[test]
    fn test_passthrough_posts_mask() {
        let mut sink = RecordingSink::new();
        let vals = ValuatorMask::from_pairs(&[(0, 4)]);
        Passthrough.post(&vals, &delta_with(REL_X, 4), EventTime::default(), &mut sink);
        assert_eq!(sink.events(), &[HostEvent::RelativeMotion(vals)]);
    }

    #[test]
    fn test_rotary_detents() {
        let mut rotary = Rotary::new();
        let mut sink = RecordingSink::new();
        let vals = ValuatorMask::new();

        rotary.post(&vals, &delta_with(REL_X, 10), EventTime::default(), &mut sink);
        rotary.post(&vals, &delta_with(REL_X, 10), EventTime::default(), &mut sink);
        let events = sink.take();
        let detents: Vec<Option<i32>> = events
            .iter()
            .map(|event| match event {
                HostEvent::RelativeMotion(mask) => mask.get(2),
                _ => None,
            })
            .collect();
        assert_eq!(detents, vec![Some(0), Some(1)]);
        assert_eq!(rotary.angle(), 200);
    }

    #[test]
    fn test_rotary_huge_delta_after_leftover_travel() {
        let mut rotary = Rotary::new();
        let mut sink = RecordingSink::new();
        let vals = ValuatorMask::new();

        rotary.post(&vals, &delta_with(REL_X, 10), EventTime::default(), &mut sink);
        rotary.post(&vals, &delta_with(REL_X, i32::MAX), EventTime::default(), &mut sink);
        rotary.post(&vals, &delta_with(REL_X, i32::MIN), EventTime::default(), &mut sink);

        let events = sink.take();
        assert_eq!(events.len(), 3);
        let expected = (100 + i64::from(i32::MAX)) / i64::from(DETENT_INTERVAL);
        assert_eq!(
            events[1],
            HostEvent::RelativeMotion(ValuatorMask::from_pairs(&[(0, i32::MAX), (2, expected as i32)]))
        );
        assert!((0..ROTARY_MAX).contains(&rotary.angle()));
    }

    #[test]
    fn test_rotary_angle_wraps() {
        let mut rotary = Rotary::new();
        let mut sink = RecordingSink::new();
        rotary.post(&ValuatorMask::new(), &delta_with(REL_X, -5), EventTime::default(), &mut sink);
        assert_eq!(rotary.angle(), ROTARY_MAX - 50);
        rotary.post(&ValuatorMask::new(), &delta_with(REL_X, 0), EventTime::default(), &mut sink);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_hall_decoding() {
        assert_eq!(Hall::decode(2), Some(1));
        assert_eq!(Hall::decode(-2), Some(-1));
        assert_eq!(Hall::decode(-1), Some(0));
        assert_eq!(Hall::decode(1), None);
        assert_eq!(Hall::decode(9), Some(0));
    }

    #[test]
    fn test_hall_posts_time_and_detent() {
        let mut sink = RecordingSink::new();
        Hall.post(&ValuatorMask::new(), &delta_with(REL_Z, -2), EventTime::new(1, 500_000), &mut sink);
        assert_eq!(
            sink.events(),
            &[HostEvent::RelativeMotion(ValuatorMask::from_pairs(&[
                (0, 0),
                (1, 1500),
                (2, -1)
            ]))]
        );

        sink.clear();
        Hall.post(&ValuatorMask::new(), &delta_with(REL_Z, 1), EventTime::default(), &mut sink);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_remote_control_blocking() {
        let mut remote = PostProcessing::RemoteControl.build();
        let mut sink = RecordingSink::new();
        let vals = ValuatorMask::from_pairs(&[(0, 1)]);

        remote.set_motion_blocked(true);
        remote.post(&vals, &delta_with(REL_X, 1), EventTime::default(), &mut sink);
        assert!(sink.events().is_empty());

        remote.set_motion_blocked(false);
        remote.post(&vals, &delta_with(REL_X, 1), EventTime::default(), &mut sink);
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_post_processing_names() {
        assert_eq!("remote_control".parse::<PostProcessing>().unwrap(), PostProcessing::RemoteControl);
        assert_eq!("Rotary".parse::<PostProcessing>().unwrap(), PostProcessing::Rotary);
        assert_eq!(PostProcessing::Hall.to_string(), "hall");
        assert_eq!(PostProcessing::default().build().name(), "none");
    }
}
