// Evsync Transform
// Coordinate transforms and relative post-processing strategies

pub mod axis;
pub mod post;

pub use axis::{scale_axis, AxisTransform, Calibration};
pub use post::{
    Hall, Passthrough, PostProcessing, RelativePostProcessor, RemoteControl, Rotary, DETENT_INTERVAL,
    ROTARY_MAX,
};
