// Evsync Event Handling
// Per-cycle queue, host delivery, device reading and session registry

pub mod queue;
pub mod reader;
pub mod registry;
pub mod sink;

pub use queue::{EventQueue, QueuedEvent, MAX_QUEUE};
pub use reader::{read_events, FdReader, READ_BATCH};
#[cfg(feature = "device")]
pub use reader::{DeviceInfo, EventLoop, OpenedDevice};
pub use registry::{SessionManager, MAX_DEVICES};
pub use sink::{EventSink, HostEvent, RecordingSink, TouchPhase};
