// Evsync Device Session - Valuator Reconciliation
// Turns a cycle's raw samples into the masks that get posted

use crate::codes::{REL_CNT, REL_X, REL_Y};

use super::DeviceSession;

impl DeviceSession {
    /// Settle proximity for the cycle, backfilling or retaining coordinates
    pub(super) fn resolve_proximity(&mut self) {
        let queued = self.queue.proximity_state();
        self.prox.resolve(queued, &mut self.vals, &mut self.abs_queued);
    }

    pub(super) fn reconcile_valuators(&mut self) {
        self.convert_to_relative();

        if self.rel_queued {
            self.process_relative_valuators();
        } else if self.abs_queued && self.prox.in_proximity() {
            self.transform
                .apply_absolute(&mut self.vals, &self.native[0], &self.native[1]);
        }
    }

    /// Emit the touch pending on the current slot
    pub(super) fn flush_touch(&mut self) {
        if let Some(frame) = self.mt.as_mut().and_then(|mt| mt.flush()) {
            self.queue_touch(frame);
        }
    }

    /// Relative mode: absolute X/Y become deltas against the previous sample
    fn convert_to_relative(&mut self) {
        if !(self.flags.relative_mode && self.abs_queued) {
            return;
        }

        if self.prox.in_proximity() {
            for (axis, code) in [REL_X, REL_Y].into_iter().enumerate() {
                let Some(value) = self.vals.get(axis) else {
                    continue;
                };
                if let Some(old) = self.old_vals.get(axis) {
                    self.delta[code as usize] = value.wrapping_sub(old);
                }
                self.old_vals.set(axis, value);
            }
            self.rel_queued = true;
        } else {
            self.old_vals.zero();
        }

        self.vals.zero();
        self.abs_queued = false;
    }

    fn process_relative_valuators(&mut self) {
        self.transform.apply_relative(&mut self.delta);

        if self.transform.swap_axes {
            for code in [REL_X, REL_Y] {
                if self.delta[code as usize] == 0 {
                    if let Some(index) = self.relative_index(code) {
                        self.vals.unset(index);
                    }
                }
            }
        }

        for code in 0..REL_CNT as u16 {
            let delta = self.delta[code as usize];
            if delta == 0 {
                continue;
            }
            if let Some(index) = self.relative_index(code) {
                self.vals.set(index, delta);
            }
        }
    }

    /// Logical index of a relative code. In relative mode an absolute device
    /// reports X/Y deltas on valuators 0 and 1.
    fn relative_index(&self, code: u16) -> Option<usize> {
        match &self.rel_map {
            Some(map) => map.index_of(code),
            None if self.flags.relative_mode && (code == REL_X || code == REL_Y) => Some(code as usize),
            None => None,
        }
    }
}
