// Evsync State
// Per-session accumulation state: valuator masks, proximity and touch slots

mod proximity;
mod slots;
mod valuator;

pub use proximity::{ProximitySource, ProximityState};
pub use slots::{MtState, SlotState, TouchFrame, DEFAULT_SLOTS};
pub use valuator::ValuatorMask;
