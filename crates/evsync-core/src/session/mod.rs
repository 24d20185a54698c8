// Evsync Device Session
// Per-device state machine: accumulate raw events, reconcile and dispatch at sync

mod dispatch;
mod valuators;

use std::io::Read;

use crate::codes::*;
use crate::error::{ConfigError, ModeError, ReadError};
use crate::event::{read_events, EventQueue, EventSink, QueuedEvent};
use crate::input::{
    button_number, is_mouse_button, probe, AbsInfo, AxisMap, ButtonMap, DeviceCapabilities, DeviceFlags, DeviceKind,
    EventClass, KeyRemap, ProbeOptions, RawEvent, ValuatorMode, WHEEL_DOWN_BUTTON, WHEEL_LEFT_BUTTON,
    WHEEL_RIGHT_BUTTON, WHEEL_UP_BUTTON,
};
use crate::state::{MtState, ProximitySource, ProximityState, TouchFrame, ValuatorMask};
use crate::transform::{AxisTransform, PostProcessing, RelativePostProcessor};

/// Options a session is built from
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub transform: AxisTransform,
    pub probe: ProbeOptions,
    pub button_map: ButtonMap,
    pub key_remap: KeyRemap,
    /// Explicit relative/absolute mode for absolute devices
    pub mode: Option<ValuatorMode>,
    /// The host takes wheel axes as scroll valuators
    pub smooth_scroll: bool,
    pub post_processing: PostProcessing,
}

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchState {
    #[default]
    Accumulating,
    /// Only observable from inside the sync handler
    Dispatching,
}

/// State of one opened input device.
///
/// Raw events go in through [`DeviceSession::process_event`]; everything
/// accumulated since the previous sync marker is posted to the sink when
/// `SYN_REPORT` arrives.
#[derive(Debug)]
pub struct DeviceSession {
    caps: DeviceCapabilities,
    kind: Option<DeviceKind>,
    flags: DeviceFlags,
    num_buttons: u32,
    rel_map: Option<AxisMap>,
    abs_map: Option<AxisMap>,
    /// Native ranges of absolute valuators 0 and 1
    native: [AbsInfo; 2],
    transform: AxisTransform,
    button_map: ButtonMap,
    key_remap: KeyRemap,
    smooth_scroll: bool,
    post: Box<dyn RelativePostProcessor>,

    state: DispatchState,
    vals: ValuatorMask,
    old_vals: ValuatorMask,
    delta: [i32; REL_CNT],
    queue: EventQueue,
    prox: ProximityState,
    mt: Option<MtState>,
    abs_queued: bool,
    rel_queued: bool,
}

impl DeviceSession {
    /// Probe `caps` and build a session from it
    pub fn new(caps: DeviceCapabilities, options: SessionOptions) -> Self {
        let mut probed = probe(caps, &options.probe);
        let classes = probed.init_valuators(options.smooth_scroll, options.mode);

        let native = match &classes.absolute {
            Some(map) => {
                let mut native = [AbsInfo::default(); 2];
                for axis in map.axes().iter().filter(|axis| axis.index < 2) {
                    native[axis.index] = probed.caps.abs_info(axis.code);
                }
                native
            }
            None => [AbsInfo::default(); 2],
        };

        let mt = if probed.has_mt && classes.absolute.is_some() {
            Some(MtState::new(probed.caps.abs_info(ABS_MT_SLOT)))
        } else {
            None
        };

        let source = ProximitySource::detect(&probed.caps, probed.use_proximity);
        let post = options.post_processing.build();
        log::debug!(
            "{}: proximity source {:?}, post-processing {}",
            probed.caps.name,
            source,
            post.name()
        );

        Self {
            caps: probed.caps,
            kind: probed.kind,
            flags: probed.flags,
            num_buttons: probed.num_buttons,
            rel_map: classes.relative,
            abs_map: classes.absolute,
            native,
            transform: options.transform,
            button_map: options.button_map,
            key_remap: options.key_remap,
            smooth_scroll: options.smooth_scroll,
            post,
            state: DispatchState::Accumulating,
            vals: ValuatorMask::new(),
            old_vals: ValuatorMask::new(),
            delta: [0; REL_CNT],
            queue: EventQueue::new(),
            prox: ProximityState::new(source),
            mt,
            abs_queued: false,
            rel_queued: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.caps.name
    }

    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.caps
    }

    pub fn kind(&self) -> Option<DeviceKind> {
        self.kind
    }

    pub fn flags(&self) -> &DeviceFlags {
        &self.flags
    }

    pub fn num_buttons(&self) -> u32 {
        self.num_buttons
    }

    /// Relative valuator class, for host registration
    pub fn relative_axes(&self) -> Option<&AxisMap> {
        self.rel_map.as_ref()
    }

    /// Absolute valuator class, for host registration
    pub fn absolute_axes(&self) -> Option<&AxisMap> {
        self.abs_map.as_ref()
    }

    pub fn transform(&self) -> &AxisTransform {
        &self.transform
    }

    pub fn is_calibrated(&self) -> bool {
        self.transform.is_calibrated()
    }

    pub fn in_proximity(&self) -> bool {
        self.prox.in_proximity()
    }

    pub fn proximity_source(&self) -> ProximitySource {
        self.prox.source()
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.state
    }

    pub fn multitouch(&self) -> Option<&MtState> {
        self.mt.as_ref()
    }

    /// Discrete events waiting for the next sync marker
    pub fn pending_events(&self) -> &[QueuedEvent] {
        self.queue.as_slice()
    }

    /// Switch between relative and absolute motion.
    ///
    /// Devices with relative axes only accept `Relative`.
    pub fn switch_mode(&mut self, mode: ValuatorMode) -> Result<(), ModeError> {
        if self.flags.relative_events {
            return match mode {
                ValuatorMode::Relative => Ok(()),
                ValuatorMode::Absolute => Err(ModeError::BadMode),
            };
        }

        self.flags.relative_mode = mode == ValuatorMode::Relative;
        log::info!("{}: switched to {} mode", self.caps.name, mode);
        Ok(())
    }

    /// Replace the calibration on a live session
    pub fn set_calibration(&mut self, values: &[i32]) -> Result<(), ConfigError> {
        self.transform.set_calibration(values)
    }

    /// Replace inversion and swap on a live session
    pub fn set_axis_options(&mut self, invert_x: bool, invert_y: bool, swap_axes: bool) {
        self.transform.invert_x = invert_x;
        self.transform.invert_y = invert_y;
        self.transform.swap_axes = swap_axes;
    }

    /// Block or unblock relative motion, for strategies that support it
    pub fn set_motion_blocked(&mut self, blocked: bool) {
        self.post.set_motion_blocked(blocked);
    }

    /// Feed one raw event
    pub fn process_event(&mut self, event: &RawEvent, sink: &mut dyn EventSink) {
        match event.class() {
            EventClass::Sync => {
                if event.code == SYN_REPORT {
                    self.sync(event, sink);
                } else if event.code == SYN_DROPPED {
                    log::debug!("{}: kernel dropped events", self.caps.name);
                }
            }
            EventClass::Relative => self.process_relative(event),
            EventClass::Absolute => self.process_absolute(event),
            EventClass::Key => self.process_key(event),
            EventClass::Other(_) => {}
        }
    }

    pub fn process_batch(&mut self, events: &[RawEvent], sink: &mut dyn EventSink) {
        for event in events {
            self.process_event(event, sink);
        }
    }

    /// Read and process everything pending on `source`.
    ///
    /// This is the readiness callback: call it whenever the device is
    /// readable. On `ReadError::Removed` the session should be detached.
    pub fn read_input<R: Read>(&mut self, source: &mut R, sink: &mut dyn EventSink) -> Result<usize, ReadError> {
        read_events(source, |event| self.process_event(&event, &mut *sink))
    }

    /// Teardown: drop whatever the current cycle accumulated
    pub fn discard_pending(&mut self) {
        self.reset_cycle();
    }

    fn process_relative(&mut self, event: &RawEvent) {
        let value = event.value;

        if !self.smooth_scroll {
            match event.code {
                REL_WHEEL => {
                    if value > 0 {
                        self.queue_button_clicks(WHEEL_UP_BUTTON, value.unsigned_abs());
                    } else if value < 0 {
                        self.queue_button_clicks(WHEEL_DOWN_BUTTON, value.unsigned_abs());
                    }
                    return;
                }
                REL_DIAL | REL_HWHEEL => {
                    if value > 0 {
                        self.queue_button_clicks(WHEEL_RIGHT_BUTTON, value.unsigned_abs());
                    } else if value < 0 {
                        self.queue_button_clicks(WHEEL_LEFT_BUTTON, value.unsigned_abs());
                    }
                    return;
                }
                _ => {}
            }
        }

        if !self.flags.relative_events || event.code as usize >= REL_CNT {
            return;
        }

        // Valuators are filled from the summed deltas at sync
        self.rel_queued = true;
        self.delta[event.code as usize] = self.delta[event.code as usize].wrapping_add(value);
    }

    fn process_absolute(&mut self, event: &RawEvent) {
        let code = event.code;
        if code as usize >= ABS_CNT {
            return;
        }
        if !self.flags.absolute_events && code != ABS_MT_SLOT && code != ABS_MT_TRACKING_ID {
            return;
        }

        let index = self.abs_map.as_ref().and_then(|map| map.index_of(code));
        if code >= ABS_MT_SLOT {
            let flushed = self.mt.as_mut().and_then(|mt| mt.process(code, event.value, index));
            if let Some(frame) = flushed {
                self.queue_touch(frame);
            }
        } else if self.mt.is_none() {
            if let Some(index) = index {
                self.vals.set(index, event.value);
                self.abs_queued = true;
            }
        }
    }

    fn process_key(&mut self, event: &RawEvent) {
        let value = event.value;
        let mut code = event.code;

        if is_mouse_button(code) && value == 2 {
            return;
        }

        if is_proximity_code(code) {
            if self.prox.tool_event() {
                self.queue.push(QueuedEvent::Proximity { entering: value != 0 });
            }
            return;
        }

        if code == BTN_TOUCH {
            self.prox.touch_event(value != 0);
            if !(self.flags.touchscreen || self.flags.tablet) || self.mt.is_some() {
                return;
            }
            code = BTN_LEFT;
        }

        match button_number(code) {
            0 => {
                if value == 2 {
                    return;
                }
                let code = self.key_remap.apply(code);
                self.queue.push(QueuedEvent::Key {
                    code,
                    pressed: value != 0,
                });
            }
            button => self.queue_button(button, value != 0),
        }
    }

    fn queue_button(&mut self, button: u32, pressed: bool) {
        let mapped = self.button_map.map(button);
        if mapped == 0 {
            return;
        }
        self.queue.push(QueuedEvent::Button {
            button: mapped,
            pressed,
        });
    }

    fn queue_button_clicks(&mut self, button: u32, count: u32) {
        let mapped = self.button_map.map(button);
        if mapped != 0 {
            self.queue.queue_button_clicks(mapped, count);
        }
    }

    fn queue_touch(&mut self, mut frame: TouchFrame) {
        self.transform
            .apply_absolute(&mut frame.mask, &self.native[0], &self.native[1]);
        self.queue.push(QueuedEvent::Touch {
            slot: frame.slot,
            phase: frame.phase,
            mask: frame.mask,
        });
    }
}
