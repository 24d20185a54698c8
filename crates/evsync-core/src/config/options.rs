// Evsync Config - Device Options
// Per-device option set and its conversion into session options

use crate::input::{ButtonMap, IgnoreAxes, KeyRemap, ProbeOptions, ValuatorMode};
use crate::session::SessionOptions;
use crate::transform::{AxisTransform, Calibration, PostProcessing};

/// Options for one device. `None` means "not set here".
///
/// `calibration` is doubly optional: `Some(None)` clears a calibration
/// inherited from an earlier layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceOptions {
    pub invert_x: Option<bool>,
    pub invert_y: Option<bool>,
    pub swap_axes: Option<bool>,
    pub calibration: Option<Option<Calibration>>,
    pub ignore_relative_axes: Option<bool>,
    pub ignore_absolute_axes: Option<bool>,
    pub button_mapping: Option<String>,
    pub key_remap: Option<String>,
    pub mode: Option<ValuatorMode>,
    pub smooth_scroll: Option<bool>,
    pub post_processing: Option<PostProcessing>,
}

impl DeviceOptions {
    /// Overlay the options set in `other`
    pub fn merge_from(&mut self, other: &DeviceOptions) {
        macro_rules! overlay {
            ($($field:ident),*) => {
                $(
                    if other.$field.is_some() {
                        self.$field = other.$field.clone();
                    }
                )*
            };
        }
        overlay!(
            invert_x,
            invert_y,
            swap_axes,
            calibration,
            ignore_relative_axes,
            ignore_absolute_axes,
            button_mapping,
            key_remap,
            mode,
            smooth_scroll,
            post_processing
        );
    }

    pub fn to_session_options(&self) -> SessionOptions {
        SessionOptions {
            transform: AxisTransform {
                invert_x: self.invert_x.unwrap_or(false),
                invert_y: self.invert_y.unwrap_or(false),
                swap_axes: self.swap_axes.unwrap_or(false),
                calibration: self.calibration.flatten(),
            },
            probe: ProbeOptions {
                ignore_relative: IgnoreAxes::from(self.ignore_relative_axes),
                ignore_absolute: IgnoreAxes::from(self.ignore_absolute_axes),
            },
            button_map: self
                .button_mapping
                .as_deref()
                .map(ButtonMap::parse)
                .unwrap_or_default(),
            key_remap: self.key_remap.as_deref().map(KeyRemap::parse).unwrap_or_default(),
            mode: self.mode,
            smooth_scroll: self.smooth_scroll.unwrap_or(false),
            post_processing: self.post_processing.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = DeviceOptions {
            invert_x: Some(true),
            swap_axes: Some(true),
            ..DeviceOptions::default()
        };
        let overlay = DeviceOptions {
            swap_axes: Some(false),
            mode: Some(ValuatorMode::Absolute),
            ..DeviceOptions::default()
        };
        base.merge_from(&overlay);
        assert_eq!(base.invert_x, Some(true));
        assert_eq!(base.swap_axes, Some(false));
        assert_eq!(base.mode, Some(ValuatorMode::Absolute));
    }

    #[test]
    fn test_cleared_calibration_overrides_inherited() {
        let mut base = DeviceOptions {
            calibration: Some(Some(Calibration::new(0, 100, 0, 200))),
            ..DeviceOptions::default()
        };
        base.merge_from(&DeviceOptions::default());
        assert!(base.to_session_options().transform.is_calibrated());

        base.merge_from(&DeviceOptions {
            calibration: Some(None),
            ..DeviceOptions::default()
        });
        assert_eq!(base.calibration, Some(None));
        assert!(!base.to_session_options().transform.is_calibrated());
    }

    #[test]
    fn test_session_options_defaults() {
        let options = DeviceOptions::default().to_session_options();
        assert_eq!(options.transform, AxisTransform::default());
        assert_eq!(options.probe.ignore_relative, IgnoreAxes::Default);
        assert!(options.button_map.is_identity());
        assert!(options.key_remap.is_empty());
        assert_eq!(options.post_processing, PostProcessing::None);
    }

    #[test]
    fn test_session_options_conversion() {
        let options = DeviceOptions {
            invert_y: Some(true),
            calibration: Some(Some(Calibration::new(0, 100, 0, 200))),
            ignore_absolute_axes: Some(false),
            button_mapping: Some("3 2 1".to_string()),
            key_remap: Some("30=48".to_string()),
            post_processing: Some(PostProcessing::Hall),
            ..DeviceOptions::default()
        }
        .to_session_options();

        assert!(options.transform.invert_y);
        assert!(options.transform.is_calibrated());
        assert_eq!(options.probe.ignore_absolute, IgnoreAxes::Unignore);
        assert_eq!(options.button_map.map(1), 3);
        assert_eq!(options.key_remap.apply(30), 48);
        assert_eq!(options.post_processing, PostProcessing::Hall);
    }
}
