// Evsync Device Session - Sync Dispatch
// Fixed-order posting of one cycle at a sync marker

use crate::event::{EventSink, QueuedEvent};
use crate::input::RawEvent;

use super::{DeviceSession, DispatchState};

impl DeviceSession {
    /// Handle `SYN_REPORT`.
    ///
    /// Order: proximity resolution, valuator reconciliation, touch flush,
    /// proximity-enter, relative motion, absolute motion, queued events,
    /// proximity-exit, reset.
    pub(super) fn sync(&mut self, marker: &RawEvent, sink: &mut dyn EventSink) {
        self.state = DispatchState::Dispatching;

        self.resolve_proximity();
        self.reconcile_valuators();
        self.flush_touch();

        self.post_proximity_events(true, sink);
        if self.rel_queued {
            self.post.post(&self.vals, &self.delta, marker.time, sink);
        }
        if self.abs_queued && self.prox.in_proximity() && !self.vals.is_empty() {
            sink.post_absolute_motion(&self.vals);
        }
        self.post_queued_events(sink);
        self.post_proximity_events(false, sink);

        self.reset_cycle();
        self.state = DispatchState::Accumulating;
    }

    fn post_proximity_events(&self, entering: bool, sink: &mut dyn EventSink) {
        for event in self.queue.iter() {
            if let QueuedEvent::Proximity { entering: state } = event {
                if *state == entering {
                    sink.post_proximity(entering, &self.vals);
                }
            }
        }
    }

    fn post_queued_events(&self, sink: &mut dyn EventSink) {
        let coords = if self.abs_queued && self.prox.in_proximity() {
            Some(&self.vals)
        } else {
            None
        };

        for event in self.queue.iter() {
            match event {
                QueuedEvent::Key { code, pressed } => sink.post_key(*code, *pressed),
                QueuedEvent::Button { button, pressed } => sink.post_button(*button, *pressed, coords),
                QueuedEvent::Touch { slot, phase, mask } => sink.post_touch(*slot, *phase, mask),
                QueuedEvent::Proximity { .. } => {}
            }
        }
    }

    pub(super) fn reset_cycle(&mut self) {
        self.delta = [0; crate::codes::REL_CNT];
        self.queue.clear();
        self.vals.zero();
        self.abs_queued = false;
        self.rel_queued = false;
        self.prox.reset_cycle();
    }
}
