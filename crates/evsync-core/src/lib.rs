// Evsync Core Library
// Evdev event normalization and dispatch engine

pub mod codes;
pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod session;
pub mod state;
pub mod transform;

pub use config::{Config, DeviceOptions};
pub use error::{CapabilityError, ConfigError, EventLoopError, ModeError, ReadError, RegistryError};
pub use event::{EventQueue, EventSink, HostEvent, QueuedEvent, RecordingSink, SessionManager, TouchPhase};
pub use input::{
    probe, AxisMap, ButtonMap, DeviceCapabilities, DeviceFlags, DeviceKind, KeyRemap, RawEvent, ValuatorMode,
};
pub use session::{DeviceSession, DispatchState, SessionOptions};
pub use state::{ProximitySource, ValuatorMask};
pub use transform::{AxisTransform, Calibration, PostProcessing};

#[cfg(feature = "device")]
pub use event::{DeviceInfo, EventLoop, OpenedDevice};
