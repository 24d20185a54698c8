// Evsync Transform - Axis Transforms
// Integer axis scaling, calibration, inversion and X/Y swap

use crate::codes::{REL_CNT, REL_X, REL_Y};
use crate::error::ConfigError;
use crate::input::AbsInfo;
use crate::state::ValuatorMask;

/// Rescale `value` from `[from_min, from_max]` into `[to_min, to_max]`.
///
/// Integer cross-multiplication, truncating toward zero. A zero-width
/// source range yields `to_min`.
pub fn scale_axis(value: i32, from_min: i32, from_max: i32, to_min: i32, to_max: i32) -> i32 {
    let from_span = i128::from(from_max) - i128::from(from_min);
    if from_span == 0 {
        return to_min;
    }

    let scaled = (i128::from(value) - i128::from(from_min)) * (i128::from(to_max) - i128::from(to_min))
        / from_span
        + i128::from(to_min);
    scaled.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32
}

/// Mirror `value` inside `[minimum, maximum]`, saturating at the i32 bounds
pub fn invert_axis(value: i32, minimum: i32, maximum: i32) -> i32 {
    let inverted = i64::from(maximum) - i64::from(value) + i64::from(minimum);
    inverted.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Calibrated bounds replacing the native range of X and Y
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Calibration {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    fn range(&self, axis: usize) -> (i32, i32) {
        if axis == 0 {
            (self.min_x, self.max_x)
        } else {
            (self.min_y, self.max_y)
        }
    }
}

/// Per-session coordinate transforms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisTransform {
    pub invert_x: bool,
    pub invert_y: bool,
    pub swap_axes: bool,
    pub calibration: Option<Calibration>,
}

impl AxisTransform {
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Replace the calibration.
    ///
    /// Zero values clear it, four values `min_x max_x min_y max_y` set it.
    pub fn set_calibration(&mut self, values: &[i32]) -> Result<(), ConfigError> {
        match values {
            [] => {
                self.calibration = None;
                log::info!("calibration cleared");
                Ok(())
            }
            [min_x, max_x, min_y, max_y] => {
                self.calibration = Some(Calibration::new(*min_x, *max_x, *min_y, *max_y));
                log::info!("calibration set to {} {} {} {}", min_x, max_x, min_y, max_y);
                Ok(())
            }
            other => {
                log::error!("insufficient calibration factors ({}), ignoring calibration", other.len());
                Err(ConfigError::InvalidValue(format!(
                    "calibration needs 0 or 4 values, got {}",
                    other.len()
                )))
            }
        }
    }

    /// Swap then invert the accumulated relative X/Y deltas
    pub fn apply_relative(&self, delta: &mut [i32; REL_CNT]) {
        if self.swap_axes {
            delta.swap(REL_X as usize, REL_Y as usize);
        }
        if self.invert_x {
            delta[REL_X as usize] = delta[REL_X as usize].wrapping_neg();
        }
        if self.invert_y {
            delta[REL_Y as usize] = delta[REL_Y as usize].wrapping_neg();
        }
    }

    /// Swap, calibrate and invert absolute valuators 0 and 1.
    ///
    /// Swapping rescales each value into the other axis' native range
    /// first, since the two ranges may differ. Calibration maps the native
    /// range onto the calibrated one.
    pub fn apply_absolute(&self, vals: &mut ValuatorMask, x: &AbsInfo, y: &AbsInfo) {
        let native = [x, y];

        if self.swap_axes {
            let mut swapped = [None; 2];
            for (axis, info) in native.iter().enumerate() {
                if let Some(value) = vals.get(axis) {
                    let other = native[1 - axis];
                    swapped[1 - axis] = Some(scale_axis(
                        value,
                        info.minimum,
                        info.maximum,
                        other.minimum,
                        other.maximum,
                    ));
                }
            }
            for (axis, value) in swapped.into_iter().enumerate() {
                match value {
                    Some(value) => vals.set(axis, value),
                    None => vals.unset(axis),
                }
            }
        }

        for (axis, info) in native.iter().enumerate() {
            let Some(mut value) = vals.get(axis) else {
                continue;
            };

            if let Some(calibration) = &self.calibration {
                let (calib_min, calib_max) = calibration.range(axis);
                value = scale_axis(value, info.minimum, info.maximum, calib_min, calib_max);
            }

            let invert = if axis == 0 { self.invert_x } else { self.invert_y };
            if invert {
                value = invert_axis(value, info.minimum, info.maximum);
            }

            vals.set(axis, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_axis_identity() {
        for value in [0, 1, 512, 1023] {
            assert_eq!(scale_axis(value, 0, 1023, 0, 1023), value);
        }
    }

    #[test]
    fn test_scale_axis_ranges() {
        assert_eq!(scale_axis(50, 0, 100, 0, 1000), 500);
        assert_eq!(scale_axis(0, -100, 100, 0, 200), 100);
        assert_eq!(scale_axis(4095, 0, 4095, 0, 1919), 1919);
    }

    #[test]
    fn test_scale_axis_zero_width() {
        assert_eq!(scale_axis(7, 5, 5, 10, 20), 10);
    }

    #[test]
    fn test_scale_axis_no_overflow() {
        assert_eq!(scale_axis(i32::MAX, 0, i32::MAX, 0, i32::MAX), i32::MAX);
    }

    #[test]
    fn test_invert_extreme_values() {
        assert_eq!(invert_axis(100, 0, 1000), 900);
        assert_eq!(invert_axis(i32::MIN, 0, 1000), i32::MAX);
        assert_eq!(invert_axis(i32::MAX, 0, 1000), 1000 - i32::MAX);
        assert_eq!(invert_axis(i32::MIN, i32::MIN, i32::MAX), i32::MAX);

        let transform = AxisTransform {
            invert_x: true,
            invert_y: true,
            ..AxisTransform::default()
        };
        let info = AbsInfo::new(0, 1000);
        let mut vals = ValuatorMask::from_pairs(&[(0, i32::MIN), (1, i32::MAX)]);
        transform.apply_absolute(&mut vals, &info, &info);
        assert_eq!(vals.get(0), Some(i32::MAX));
        assert_eq!(vals.get(1), Some(1000 - i32::MAX));
    }

    #[test]
    fn test_scale_axis_monotonic() {
        let mut last = i32::MIN;
        for value in 0..=200 {
            let scaled = scale_axis(value, 0, 200, 100, 900);
            assert!(scaled >= last);
            last = scaled;
        }
    }

    #[test]
    fn test_set_calibration_counts() {
        let mut transform = AxisTransform::default();
        transform.set_calibration(&[10, 90, 20, 80]).unwrap();
        assert!(transform.is_calibrated());

        assert!(transform.set_calibration(&[1, 2, 3]).is_err());
        assert_eq!(transform.calibration, Some(Calibration::new(10, 90, 20, 80)));

        transform.set_calibration(&[]).unwrap();
        assert!(!transform.is_calibrated());
    }

    #[test]
    fn test_relative_swap_before_invert() {
        let transform = AxisTransform {
            swap_axes: true,
            invert_x: true,
            ..AxisTransform::default()
        };
        let mut delta = [0; REL_CNT];
        delta[REL_X as usize] = 3;
        delta[REL_Y as usize] = -7;
        transform.apply_relative(&mut delta);
        assert_eq!(delta[REL_X as usize], 7);
        assert_eq!(delta[REL_Y as usize], 3);
    }

    #[test]
    fn test_absolute_invert() {
        let transform = AxisTransform {
            invert_y: true,
            ..AxisTransform::default()
        };
        let info = AbsInfo::new(0, 1000);
        let mut vals = ValuatorMask::from_pairs(&[(0, 100), (1, 100)]);
        transform.apply_absolute(&mut vals, &info, &info);
        assert_eq!(vals.get(0), Some(100));
        assert_eq!(vals.get(1), Some(900));
    }

    #[test]
    fn test_absolute_swap_rescales_across_ranges() {
        let transform = AxisTransform {
            swap_axes: true,
            ..AxisTransform::default()
        };
        let x = AbsInfo::new(0, 2000);
        let y = AbsInfo::new(0, 1000);
        let mut vals = ValuatorMask::from_pairs(&[(0, 1000), (1, 250)]);
        transform.apply_absolute(&mut vals, &x, &y);
        assert_eq!(vals.get(0), Some(500));
        assert_eq!(vals.get(1), Some(500));
    }

    #[test]
    fn test_absolute_swap_moves_single_axis() {
        let transform = AxisTransform {
            swap_axes: true,
            ..AxisTransform::default()
        };
        let info = AbsInfo::new(0, 100);
        let mut vals = ValuatorMask::from_pairs(&[(0, 40)]);
        transform.apply_absolute(&mut vals, &info, &info);
        assert_eq!(vals.get(0), None);
        assert_eq!(vals.get(1), Some(40));
    }

    #[test]
    fn test_absolute_calibration() {
        let mut transform = AxisTransform::default();
        transform.set_calibration(&[100, 900, 0, 1000]).unwrap();
        let info = AbsInfo::new(0, 1000);
        let mut vals = ValuatorMask::from_pairs(&[(0, 500), (1, 500), (2, 77)]);
        transform.apply_absolute(&mut vals, &info, &info);
        assert_eq!(vals.get(0), Some(500));
        assert_eq!(vals.get(1), Some(500));
        assert_eq!(vals.get(2), Some(77));

        let mut vals = ValuatorMask::from_pairs(&[(0, 0), (1, 1000)]);
        transform.apply_absolute(&mut vals, &info, &info);
        assert_eq!(vals.get(0), Some(100));
        assert_eq!(vals.get(1), Some(1000));

        let mut vals = ValuatorMask::from_pairs(&[(0, 1000)]);
        transform.apply_absolute(&mut vals, &info, &info);
        assert_eq!(vals.get(0), Some(900));
    }

    #[test]
    fn test_calibration_idempotent_on_native_range() {
        let mut transform = AxisTransform::default();
        transform.set_calibration(&[0, 4095, 0, 4095]).unwrap();
        let info = AbsInfo::new(0, 4095);
        for value in [0, 1, 2048, 4095] {
            let mut vals = ValuatorMask::from_pairs(&[(0, value)]);
            transform.apply_absolute(&mut vals, &info, &info);
            assert_eq!(vals.get(0), Some(value));
        }
    }
}
